use derive_more::Display;

/// Derived accessors provided by this crate, used both for selecting the
/// upstream node subscription and for keying the sharing registry
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum DeriveOp {
    NewHeads,
    FinalizedHeads,
}
