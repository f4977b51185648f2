use crate::{
    author::get_author_details,
    error::{Error, Result},
    header_extended::HeaderExtended,
    ops::DeriveOp,
    registry::ShareGuard,
};
use async_channel::{Receiver, Sender};
use futures::{
    future::{BoxFuture, Fuse, FutureExt},
    pin_mut, select_biased,
    stream::Stream,
};
use parking_lot::Mutex;
use std::{
    collections::{HashMap, hash_map::Entry},
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    task::{Context, Poll},
};
use vela_core::{debug, trace};
use vela_rpc_core::{DynRpcApi, HeadsReceiver, RpcError, RpcHeader, RpcResult};
use vela_utils::{channel::Channel, triggers::SingleTrigger};

pub(crate) type ListenerId = u64;

#[derive(Debug, Default)]
struct Registrations {
    listeners: HashMap<ListenerId, Sender<RpcResult<HeaderExtended>>>,
    /// Set once the supervising task has exited; `terminal` keeps the error
    /// that ended the share, if any, for replay to listeners attaching later
    closed: bool,
    terminal: Option<RpcError>,
}

/// A single upstream head subscription fanned out to any number of listeners.
///
/// The supervising task owns the upstream receiver. Each incoming header
/// starts an enrichment lookup; a newer header replaces the pending lookup so
/// stale enrichments are never emitted. Completed enrichments are broadcast
/// to every registered listener. Any upstream or enrichment failure ends the
/// share, forwarding the error to all listeners unchanged.
#[derive(Debug)]
pub(crate) struct SharedHeads {
    op: DeriveOp,
    instance_id: String,
    registrations: Mutex<Registrations>,
    started: AtomicBool,
    shutdown: SingleTrigger,
}

impl SharedHeads {
    pub(crate) fn new(op: DeriveOp, instance_id: &str) -> Self {
        Self {
            op,
            instance_id: instance_id.to_string(),
            registrations: Mutex::new(Registrations::default()),
            started: AtomicBool::new(false),
            shutdown: SingleTrigger::new(),
        }
    }

    /// Spawns the supervising task. Only the first call has an effect.
    pub(crate) fn start(self: &Arc<Self>, api: DynRpcApi) {
        if self.started.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_err() {
            return;
        }
        tokio::spawn(self.clone().subscription_task(api));
    }

    pub(crate) fn register_listener(&self) -> (ListenerId, Receiver<RpcResult<HeaderExtended>>) {
        let channel = Channel::unbounded();
        let mut registrations = self.registrations.lock();
        if registrations.closed {
            // The share already ended; replay its terminal error, if any, and
            // hand out a stream that terminates immediately after
            if let Some(ref err) = registrations.terminal {
                let _ = channel.try_send(Err(err.clone()));
            }
            channel.close();
            return (ListenerId::default(), channel.receiver());
        }
        loop {
            let id = u64::from_le_bytes(rand::random::<[u8; 8]>());

            // This is very unlikely to happen but still, check for duplicates
            if let Entry::Vacant(e) = registrations.listeners.entry(id) {
                trace!("[Derive {}::{}] registering listener {id}", self.op, self.instance_id);
                e.insert(channel.sender());
                return (id, channel.receiver());
            }
        }
    }

    pub(crate) fn unregister_listener(&self, id: ListenerId) {
        if self.registrations.lock().listeners.remove(&id).is_some() {
            trace!("[Derive {}::{}] unregistering listener {id}", self.op, self.instance_id);
        }
    }

    /// Signals the supervising task to stop, halting in-flight work and
    /// unsubscribing from the upstream feed
    pub(crate) fn shutdown(&self) {
        self.shutdown.trigger.trigger();
    }

    async fn subscription_task(self: Arc<Self>, api: DynRpcApi) {
        trace!("[Derive {}::{}] subscription task starting", self.op, self.instance_id);
        let feed = match self.subscribe_upstream(&api).await {
            Ok(feed) => feed,
            Err(err) => {
                debug!("[Derive {}::{}] upstream subscription failed: {err}", self.op, self.instance_id);
                self.finish(Some(err));
                return;
            }
        };

        let shutdown = self.shutdown.listener.clone().fuse();
        pin_mut!(shutdown);
        let mut enrichment: Fuse<BoxFuture<'static, RpcResult<HeaderExtended>>> = Fuse::terminated();

        // Bias order matters: a queued newer header must win over a completed
        // but not yet processed enrichment of an older one
        let terminal = loop {
            select_biased! {
                _ = shutdown => break None,
                head = feed.recv().fuse() => match head {
                    Ok(Ok(header)) => {
                        trace!("[Derive {}::{}] header {} received", self.op, self.instance_id, header.hash);
                        enrichment = extend_header(api.clone(), header).boxed().fuse();
                    }
                    Ok(Err(err)) => break Some(err),
                    Err(_) => break None, // upstream feed closed
                },
                extended = enrichment => match extended {
                    Ok(extended) => self.broadcast(extended),
                    Err(err) => break Some(err),
                },
            }
        };

        // Dropping `feed` unsubscribes upstream; the pending enrichment, if
        // any, is abandoned with it
        self.finish(terminal);
        trace!("[Derive {}::{}] subscription task terminated", self.op, self.instance_id);
    }

    async fn subscribe_upstream(&self, api: &DynRpcApi) -> RpcResult<HeadsReceiver> {
        match self.op {
            DeriveOp::NewHeads => api.subscribe_new_heads().await,
            DeriveOp::FinalizedHeads => api.subscribe_finalized_heads().await,
        }
    }

    fn broadcast(&self, extended: HeaderExtended) {
        let listeners: Vec<_> =
            self.registrations.lock().listeners.iter().map(|(id, sender)| (*id, sender.clone())).collect();
        for (id, sender) in listeners {
            match sender.try_send(Ok(extended.clone())) {
                Ok(_) => {
                    trace!("[Derive {}::{}] sent header {} to listener {id}", self.op, self.instance_id, extended.hash)
                }
                Err(_) => {
                    trace!("[Derive {}::{}] listener {id} is gone, skipping it", self.op, self.instance_id)
                }
            }
        }
    }

    fn finish(&self, terminal: Option<RpcError>) {
        let mut registrations = self.registrations.lock();
        registrations.closed = true;
        registrations.terminal = terminal.clone();
        if let Some(ref err) = terminal {
            debug!("[Derive {}::{}] share ended with error: {err}", self.op, self.instance_id);
        }
        for (_, sender) in registrations.listeners.drain() {
            if let Some(ref err) = terminal {
                let _ = sender.try_send(Err(err.clone()));
            }
            sender.close();
        }
    }
}

/// Runs the full enrichment of a single header: anchor a state query to the
/// header's own hash, resolve the author context there, then build the
/// extended header
async fn extend_header(api: DynRpcApi, header: RpcHeader) -> RpcResult<HeaderExtended> {
    let query = api.query_at(header.hash).await?;
    trace!("[Derive] state query anchored at {}", query.at());
    let (validators, author) = get_author_details(&header, &query).await?;
    Ok(HeaderExtended::new(header, validators, author))
}

/// A consumer handle over a shared enriched-head subscription.
///
/// Dropping the stream detaches its listener; dropping the last listener of a
/// share tears the upstream subscription down.
#[derive(Debug)]
pub struct HeaderStream {
    receiver: Receiver<RpcResult<HeaderExtended>>,
    _guard: ShareGuard,
}

impl HeaderStream {
    pub(crate) fn new(receiver: Receiver<RpcResult<HeaderExtended>>, guard: ShareGuard) -> Self {
        Self { receiver, _guard: guard }
    }

    /// Receives the next enriched header.
    ///
    /// An `Error::Rpc` is terminal: the stream only yields
    /// `Error::ChannelRecvError` afterwards, as it does after a clean end of
    /// the upstream feed.
    pub async fn recv(&self) -> Result<HeaderExtended> {
        match self.receiver.recv().await {
            Ok(Ok(extended)) => Ok(extended),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => Err(Error::ChannelRecvError),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Stream for HeaderStream {
    type Item = RpcResult<HeaderExtended>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // SAFETY: `receiver` is structurally pinned and never moved out of; `HeaderStream`
        // is `!Unpin` (it owns a `!Unpin` `Receiver`) and implements no `Unpin`. This is the
        // pin-projecting equivalent of forwarding to the receiver's `Stream` impl.
        let receiver = unsafe { self.map_unchecked_mut(|s| &mut s.receiver) };
        receiver.poll_next(cx)
    }
}
