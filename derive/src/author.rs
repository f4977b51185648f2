use vela_rpc_core::{DynQueryAt, RpcAccountId, RpcHeader, RpcResult, RpcValidatorSet};

/// Resolves the validator roster as of the queried block and attributes the
/// header to the validator owning its slot.
///
/// Attribution follows the slot rotation of the production schedule:
/// `validators[slot % len]`. An empty roster yields no author.
pub async fn get_author_details(
    header: &RpcHeader,
    query: &DynQueryAt,
) -> RpcResult<(RpcValidatorSet, Option<RpcAccountId>)> {
    let validators = query.validators().await?;
    let author = match validators.is_empty() {
        true => None,
        false => Some(validators[(header.slot % validators.len() as u64) as usize]),
    };
    Ok((validators, author))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::MockQueryAt;
    use std::sync::Arc;
    use vela_consensus_core::{AccountId, Hash};
    use vela_rpc_core::DynQueryAt;

    fn header_with_slot(slot: u64) -> RpcHeader {
        RpcHeader::new(1, Hash::ZERO, 1, 1_715_000_000_000, slot, Hash::ZERO, Hash::ZERO)
    }

    #[tokio::test]
    async fn test_slot_rotation() {
        let roster = vec![AccountId::from_u64_word(1), AccountId::from_u64_word(2), AccountId::from_u64_word(3)];
        for slot in 0..7 {
            let header = header_with_slot(slot);
            let query: DynQueryAt = Arc::new(MockQueryAt::new(header.hash, Arc::new(roster.clone())));
            let (validators, author) = get_author_details(&header, &query).await.unwrap();
            assert_eq!(*validators, roster);
            assert_eq!(author, Some(roster[(slot % 3) as usize]));
        }
    }

    #[tokio::test]
    async fn test_empty_roster_yields_no_author() {
        let header = header_with_slot(4);
        let query: DynQueryAt = Arc::new(MockQueryAt::new(header.hash, Arc::new(vec![])));
        let (validators, author) = get_author_details(&header, &query).await.unwrap();
        assert!(validators.is_empty());
        assert_eq!(author, None);
    }
}
