extern crate derive_more;
use derive_more::Deref;
use vela_rpc_core::{RpcAccountId, RpcHeader, RpcValidatorSet};

/// A header enriched with the validator context resolved at its own hash.
///
/// Immutable once constructed. Construction stamps `created_at_hash` with the
/// header's own hash, so the value always records the exact anchor its state
/// lookup ran against, even if the chain head has moved since delivery.
#[derive(Clone, Debug, PartialEq, Eq, Deref)]
pub struct HeaderExtended {
    #[deref]
    header: RpcHeader,
    validators: RpcValidatorSet,
    author: Option<RpcAccountId>,
}

impl HeaderExtended {
    pub fn new(mut header: RpcHeader, validators: RpcValidatorSet, author: Option<RpcAccountId>) -> Self {
        header.created_at_hash = Some(header.hash);
        Self { header, validators, author }
    }

    pub fn header(&self) -> &RpcHeader {
        &self.header
    }

    pub fn validators(&self) -> &RpcValidatorSet {
        &self.validators
    }

    /// The account credited with producing this block, when attribution succeeded
    pub fn author(&self) -> Option<RpcAccountId> {
        self.author
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use vela_consensus_core::{AccountId, Hash};
    use vela_rpc_core::RpcHeader;

    #[test]
    fn test_created_at_hash_is_stamped() {
        let mut header = RpcHeader::new(1, Hash::ZERO, 5, 1_715_000_000_000, 11, Hash::ZERO, Hash::ZERO);
        // A stale anchor recorded by an earlier fetch must be overwritten
        header.created_at_hash = Some(Hash::from_u64_word(0xDEAD));

        let author = AccountId::from_u64_word(42);
        let extended = HeaderExtended::new(header.clone(), Arc::new(vec![author]), Some(author));
        assert_eq!(extended.created_at_hash, Some(header.hash));
        assert_eq!(extended.number, 5);
        assert_eq!(extended.author(), Some(author));
    }
}
