//! Mock node connection for exercising derived accessors in tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use vela_consensus_core::Hash;
use vela_rpc_core::{
    DynQueryAt, HeadsReceiver, QueryAt, RpcAccountId, RpcError, RpcHeader, RpcResult, RpcValidatorSet,
};
use vela_utils::{
    channel::Channel,
    triggers::{Listener, SingleTrigger},
};

type HeadsSender = async_channel::Sender<RpcResult<RpcHeader>>;

/// A mock node connection with per-operation call counters, optional gating
/// of state queries and a sync channel for sequencing test steps
#[derive(Debug)]
pub struct MockRpcApi {
    validators: RpcValidatorSet,
    gated: AtomicBool,
    gate: SingleTrigger,
    pruned: AtomicBool,
    new_heads_subscriptions: AtomicUsize,
    finalized_subscriptions: AtomicUsize,
    query_at_calls: AtomicUsize,
    new_heads_senders: Mutex<Vec<HeadsSender>>,
    finalized_senders: Mutex<Vec<HeadsSender>>,
    subscription_signal: Channel<()>,
    query_signal: Channel<Hash>,
}

impl MockRpcApi {
    pub fn new(validators: Vec<RpcAccountId>) -> Self {
        Self {
            validators: Arc::new(validators),
            gated: AtomicBool::new(false),
            gate: SingleTrigger::new(),
            pruned: AtomicBool::new(false),
            new_heads_subscriptions: AtomicUsize::new(0),
            finalized_subscriptions: AtomicUsize::new(0),
            query_at_calls: AtomicUsize::new(0),
            new_heads_senders: Mutex::new(vec![]),
            finalized_senders: Mutex::new(vec![]),
            subscription_signal: Channel::unbounded(),
            query_signal: Channel::unbounded(),
        }
    }

    /// Makes every state query block until [`Self::open_query_gate`] is called
    pub fn gate_queries(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    pub fn open_query_gate(&self) {
        self.gate.trigger.trigger();
    }

    /// Makes every state query fail as if the queried block was pruned
    pub fn set_state_pruned(&self) {
        self.pruned.store(true, Ordering::SeqCst);
    }

    /// Waits until a subscription has been opened against this mock
    pub async fn wait_for_subscription(&self) {
        self.subscription_signal.recv().await.expect("the mock subscription signal channel is never closed");
    }

    /// Waits until a state query has been anchored, returning its anchor hash
    pub async fn wait_for_query(&self) -> Hash {
        self.query_signal.recv().await.expect("the mock query signal channel is never closed")
    }

    pub fn send_new_head(&self, item: RpcResult<RpcHeader>) {
        for sender in self.new_heads_senders.lock().iter() {
            let _ = sender.try_send(item.clone());
        }
    }

    pub fn send_finalized_head(&self, item: RpcResult<RpcHeader>) {
        for sender in self.finalized_senders.lock().iter() {
            let _ = sender.try_send(item.clone());
        }
    }

    /// Ends every open new-heads subscription cleanly
    pub fn close_new_heads(&self) {
        for sender in self.new_heads_senders.lock().drain(..) {
            sender.close();
        }
    }

    pub fn new_heads_subscription_count(&self) -> usize {
        self.new_heads_subscriptions.load(Ordering::SeqCst)
    }

    pub fn finalized_subscription_count(&self) -> usize {
        self.finalized_subscriptions.load(Ordering::SeqCst)
    }

    pub fn query_at_count(&self) -> usize {
        self.query_at_calls.load(Ordering::SeqCst)
    }

    /// True when every subscriber of the new-heads feed has unsubscribed
    pub fn new_heads_unsubscribed(&self) -> bool {
        self.new_heads_senders.lock().iter().all(|sender| sender.is_closed())
    }
}

#[async_trait]
impl vela_rpc_core::RpcApi for MockRpcApi {
    async fn subscribe_new_heads(&self) -> RpcResult<HeadsReceiver> {
        self.new_heads_subscriptions.fetch_add(1, Ordering::SeqCst);
        let channel = Channel::unbounded();
        self.new_heads_senders.lock().push(channel.sender());
        let _ = self.subscription_signal.try_send(());
        Ok(channel.receiver())
    }

    async fn subscribe_finalized_heads(&self) -> RpcResult<HeadsReceiver> {
        self.finalized_subscriptions.fetch_add(1, Ordering::SeqCst);
        let channel = Channel::unbounded();
        self.finalized_senders.lock().push(channel.sender());
        let _ = self.subscription_signal.try_send(());
        Ok(channel.receiver())
    }

    async fn query_at(&self, hash: Hash) -> RpcResult<DynQueryAt> {
        self.query_at_calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.query_signal.try_send(hash);
        Ok(Arc::new(MockQueryAt {
            at: hash,
            validators: self.validators.clone(),
            gate: self.gated.load(Ordering::SeqCst).then(|| self.gate.listener.clone()),
            pruned: self.pruned.load(Ordering::SeqCst),
        }))
    }
}

/// A mock point-in-time state handle
#[derive(Debug)]
pub struct MockQueryAt {
    at: Hash,
    validators: RpcValidatorSet,
    gate: Option<Listener>,
    pruned: bool,
}

impl MockQueryAt {
    pub fn new(at: Hash, validators: RpcValidatorSet) -> Self {
        Self { at, validators, gate: None, pruned: false }
    }
}

#[async_trait]
impl QueryAt for MockQueryAt {
    fn at(&self) -> Hash {
        self.at
    }

    async fn validators(&self) -> RpcResult<RpcValidatorSet> {
        if let Some(gate) = self.gate.clone() {
            gate.await;
        }
        if self.pruned {
            return Err(RpcError::StatePruned(self.at));
        }
        Ok(self.validators.clone())
    }
}
