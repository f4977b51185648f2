//! Derived chain data accessors
//!
//! This crate composes the primitive subscriptions of a node connection
//! ([`RpcApi`](vela_rpc_core::RpcApi)) into higher level streams. Derived
//! streams are shared: consumers asking for the same accessor under the same
//! instance id are served by one underlying node subscription, opened with
//! the first consumer and torn down with the last one.

pub mod author;
pub mod chain;
pub mod error;
pub mod header_extended;
pub mod ops;
pub mod registry;
pub mod stream;
pub mod test_helpers;

pub use chain::{subscribe_finalized_heads, subscribe_new_heads};
pub use header_extended::HeaderExtended;
pub use ops::DeriveOp;
pub use registry::DeriveRegistry;
pub use stream::HeaderStream;
