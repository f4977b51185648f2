//! The client API
//!
//! Rpc = External RPC Service
//! All data provided by the RPC server can be trusted by the client
//! No data submitted by the client to the server can be trusted

use crate::{
    error::RpcResult,
    model::{RpcHeader, RpcValidatorSet},
};
use async_channel::Receiver;
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use vela_consensus_core::Hash;

/// Receiving side of a live header subscription, one item per block.
///
/// Dropping the receiver is the unsubscribe signal: the connection layer
/// observes the closed channel and cancels the server-side subscription.
/// An `Err` item is terminal and is followed by channel closure.
pub type HeadsReceiver = Receiver<RpcResult<RpcHeader>>;

/// A handle for querying chain state as of a specific block hash
#[async_trait]
pub trait QueryAt: Send + Sync + Debug {
    /// The block hash this handle is anchored to
    fn at(&self) -> Hash;

    /// The validator roster as of the anchor block
    async fn validators(&self) -> RpcResult<RpcValidatorSet>;
}

pub type DynQueryAt = Arc<dyn QueryAt>;

/// Client-side capabilities of a Vela node connection
#[async_trait]
pub trait RpcApi: Send + Sync + Debug {
    /// Subscribes to the node's new-head feed
    async fn subscribe_new_heads(&self) -> RpcResult<HeadsReceiver>;

    /// Subscribes to the node's finalized-head feed
    async fn subscribe_finalized_heads(&self) -> RpcResult<HeadsReceiver>;

    /// Returns a point-in-time state query handle anchored to block `hash`
    async fn query_at(&self, hash: Hash) -> RpcResult<DynQueryAt>;
}

pub type DynRpcApi = Arc<dyn RpcApi>;
