//! Derived chain accessors
//!
//! Each accessor returns a live stream of enriched headers backed by a shared
//! node subscription. Sharing is keyed by the caller-chosen `instance_id`:
//! consumers using the same id are served by one upstream subscription, which
//! opens with the first consumer and closes when the last stream is dropped.

use crate::{ops::DeriveOp, registry::DeriveRegistry, stream::HeaderStream};
use vela_rpc_core::DynRpcApi;

/// An enriched stream of the current block headers, including the extracted
/// author.
///
/// Every emitted header records the hash its state lookup was anchored to in
/// `created_at_hash`, which is always the header's own hash. When a newer
/// header arrives before the previous enrichment resolved, the stale
/// enrichment is cancelled and never emitted. Failures of the upstream feed,
/// the state query or the author resolution reach every consumer unchanged
/// and end the stream.
pub fn subscribe_new_heads(registry: &DeriveRegistry, instance_id: &str, api: DynRpcApi) -> HeaderStream {
    registry.subscribe(DeriveOp::NewHeads, instance_id, api)
}

/// Same contract as [`subscribe_new_heads`], over the node's finalized-head
/// feed.
pub fn subscribe_finalized_heads(registry: &DeriveRegistry, instance_id: &str, api: DynRpcApi) -> HeaderStream {
    registry.subscribe(DeriveOp::FinalizedHeads, instance_id, api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, registry::DeriveRegistry, test_helpers::MockRpcApi};
    use futures::StreamExt;
    use std::{sync::Arc, time::Duration};
    use vela_consensus_core::{AccountId, Hash, header::Header};
    use vela_rpc_core::{RpcError, RpcHeader};

    fn two_validators() -> Vec<AccountId> {
        vec![AccountId::from_u64_word(1), AccountId::from_u64_word(2)]
    }

    fn new_head(number: u64, slot: u64) -> RpcHeader {
        RpcHeader::new(
            1,
            Hash::from_u64_word(number.wrapping_sub(1)),
            number,
            1_715_000_000_000 + number * 1_000,
            slot,
            Hash::ZERO,
            Hash::ZERO,
        )
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..1000 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("condition was not reached in time");
    }

    #[tokio::test]
    async fn test_consumers_share_one_upstream_subscription() {
        vela_core::log::try_init_logger("info,vela_derive=trace");
        let api = Arc::new(MockRpcApi::new(two_validators()));
        let registry = DeriveRegistry::new();

        let first = subscribe_new_heads(&registry, "X", api.clone());
        let second = subscribe_new_heads(&registry, "X", api.clone());
        api.wait_for_subscription().await;

        let head = new_head(1, 0);
        api.send_new_head(Ok(head.clone()));
        assert_eq!(first.recv().await.unwrap().hash, head.hash);
        assert_eq!(second.recv().await.unwrap().hash, head.hash);

        // A third consumer still attaches to the same share
        let third = subscribe_new_heads(&registry, "X", api.clone());
        api.send_new_head(Ok(new_head(2, 1)));
        assert_eq!(first.recv().await.unwrap().number, 2);
        assert_eq!(third.recv().await.unwrap().number, 2);

        assert_eq!(api.new_heads_subscription_count(), 1);
        assert_eq!(registry.active_shares(), 1);
    }

    #[tokio::test]
    async fn test_instances_are_independent() {
        let api = Arc::new(MockRpcApi::new(two_validators()));
        let registry = DeriveRegistry::new();

        let _x = subscribe_new_heads(&registry, "X", api.clone());
        let _y = subscribe_new_heads(&registry, "Y", api.clone());
        let _finalized_x = subscribe_finalized_heads(&registry, "X", api.clone());
        api.wait_for_subscription().await;
        api.wait_for_subscription().await;
        api.wait_for_subscription().await;

        assert_eq!(api.new_heads_subscription_count(), 2);
        assert_eq!(api.finalized_subscription_count(), 1);
        assert_eq!(registry.active_shares(), 3);
    }

    #[tokio::test]
    async fn test_emissions_record_their_anchor() {
        let api = Arc::new(MockRpcApi::new(two_validators()));
        let registry = DeriveRegistry::new();

        let mut stream = Box::pin(subscribe_new_heads(&registry, "anchor", api.clone()));
        api.wait_for_subscription().await;

        for number in 1..=3u64 {
            let head = new_head(number, number);
            api.send_new_head(Ok(head.clone()));
            let extended = stream.next().await.unwrap().unwrap();
            assert_eq!(extended.number, number);
            assert_eq!(extended.created_at_hash, Some(head.hash));
            assert_eq!(extended.created_at_hash, Some(extended.hash));
        }
    }

    #[tokio::test]
    async fn test_author_attribution() {
        let validators = two_validators();
        let api = Arc::new(MockRpcApi::new(validators.clone()));
        let registry = DeriveRegistry::new();

        let stream = subscribe_new_heads(&registry, "author", api.clone());
        api.wait_for_subscription().await;

        let mut head: RpcHeader = (&Header::from_precomputed_hash(Hash::from_u64_word(0xA), Hash::ZERO)).into();
        head.number = 1;
        head.slot = 5;
        api.send_new_head(Ok(head.clone()));

        let extended = stream.recv().await.unwrap();
        assert_eq!(extended.number, 1);
        assert_eq!(extended.created_at_hash, Some(Hash::from_u64_word(0xA)));
        assert_eq!(extended.author(), Some(validators[1])); // slot 5 % 2 validators
        assert_eq!(**extended.validators(), validators);
    }

    #[tokio::test]
    async fn test_new_header_supersedes_pending_enrichment() {
        let api = Arc::new(MockRpcApi::new(two_validators()));
        api.gate_queries();
        let registry = DeriveRegistry::new();

        let stream = subscribe_new_heads(&registry, "supersede", api.clone());
        api.wait_for_subscription().await;

        let first = new_head(1, 0);
        api.send_new_head(Ok(first.clone()));
        assert_eq!(api.wait_for_query().await, first.hash);

        // The enrichment of `first` is now parked on the query gate; a newer
        // header must cancel it for good
        let second = new_head(2, 1);
        api.send_new_head(Ok(second.clone()));
        assert_eq!(api.wait_for_query().await, second.hash);

        api.open_query_gate();
        let extended = stream.recv().await.unwrap();
        assert_eq!(extended.hash, second.hash);
        assert_eq!(extended.created_at_hash, Some(second.hash));
        assert!(stream.is_empty());
        assert_eq!(api.query_at_count(), 2);
    }

    #[tokio::test]
    async fn test_upstream_error_reaches_all_consumers() {
        let api = Arc::new(MockRpcApi::new(two_validators()));
        let registry = DeriveRegistry::new();

        let first = subscribe_new_heads(&registry, "err", api.clone());
        let second = subscribe_new_heads(&registry, "err", api.clone());
        api.wait_for_subscription().await;

        api.send_new_head(Err(RpcError::ConnectionClosed));
        assert!(matches!(first.recv().await, Err(Error::Rpc(RpcError::ConnectionClosed))));
        assert!(matches!(second.recv().await, Err(Error::Rpc(RpcError::ConnectionClosed))));

        // The error is terminal
        assert!(matches!(first.recv().await, Err(Error::ChannelRecvError)));

        // A late consumer of the ended share gets the same error replayed
        let late = subscribe_new_heads(&registry, "err", api.clone());
        assert!(matches!(late.recv().await, Err(Error::Rpc(RpcError::ConnectionClosed))));
        assert!(matches!(late.recv().await, Err(Error::ChannelRecvError)));
        assert_eq!(api.new_heads_subscription_count(), 1);
    }

    #[tokio::test]
    async fn test_query_failure_is_terminal() {
        let api = Arc::new(MockRpcApi::new(two_validators()));
        api.set_state_pruned();
        let registry = DeriveRegistry::new();

        let stream = subscribe_new_heads(&registry, "pruned", api.clone());
        api.wait_for_subscription().await;

        let head = new_head(1, 0);
        api.send_new_head(Ok(head.clone()));
        assert!(matches!(stream.recv().await, Err(Error::Rpc(RpcError::StatePruned(at))) if at == head.hash));
        assert!(matches!(stream.recv().await, Err(Error::ChannelRecvError)));
    }

    #[tokio::test]
    async fn test_clean_upstream_close_ends_streams() {
        let api = Arc::new(MockRpcApi::new(two_validators()));
        let registry = DeriveRegistry::new();

        let stream = subscribe_new_heads(&registry, "close", api.clone());
        api.wait_for_subscription().await;

        let head = new_head(1, 0);
        api.send_new_head(Ok(head.clone()));
        assert_eq!(stream.recv().await.unwrap().hash, head.hash);

        api.close_new_heads();
        assert!(matches!(stream.recv().await, Err(Error::ChannelRecvError)));
    }

    #[tokio::test]
    async fn test_last_consumer_tears_the_share_down() {
        let api = Arc::new(MockRpcApi::new(two_validators()));
        let registry = DeriveRegistry::new();

        let first = subscribe_new_heads(&registry, "tear", api.clone());
        let second = subscribe_new_heads(&registry, "tear", api.clone());
        api.wait_for_subscription().await;

        // Losing one consumer of two keeps the subscription open
        drop(first);
        let head = new_head(1, 0);
        api.send_new_head(Ok(head.clone()));
        assert_eq!(second.recv().await.unwrap().hash, head.hash);
        assert!(!api.new_heads_unsubscribed());
        assert_eq!(registry.active_shares(), 1);

        // Losing the last one unsubscribes upstream and clears the registry
        drop(second);
        assert_eq!(registry.active_shares(), 0);
        wait_until(|| api.new_heads_unsubscribed()).await;

        // A consumer arriving afterwards starts from a fresh subscription
        let fresh = subscribe_new_heads(&registry, "tear", api.clone());
        api.wait_for_subscription().await;
        assert_eq!(api.new_heads_subscription_count(), 2);
        api.send_new_head(Ok(new_head(2, 1)));
        assert_eq!(fresh.recv().await.unwrap().number, 2);
    }
}
