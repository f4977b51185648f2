use crate::{
    ops::DeriveOp,
    stream::{HeaderStream, ListenerId, SharedHeads},
};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use vela_core::trace;
use vela_rpc_core::DynRpcApi;

type ShareKey = (DeriveOp, String);

/// Process-wide registry memoizing derived subscriptions.
///
/// Shares are keyed by accessor and instance id. The first consumer of a key
/// creates the share and opens the upstream subscription; every further
/// consumer attaches to the same share. The share is reference counted: when
/// the last consumer detaches, the share is shut down and its entry removed,
/// so a later consumer under the same key starts from a fresh subscription.
///
/// The registry is an explicit dependency of the derive accessors rather
/// than module-level state, so independent registries stay fully isolated.
#[derive(Clone, Debug, Default)]
pub struct DeriveRegistry {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    shares: Mutex<HashMap<ShareKey, Share>>,
}

#[derive(Debug)]
struct Share {
    /// Number of attached consumers; the share tears down when this count
    /// returns to zero
    active: usize,
    heads: Arc<SharedHeads>,
}

impl DeriveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently live shares, over all accessors and instance ids
    pub fn active_shares(&self) -> usize {
        self.inner.shares.lock().len()
    }

    /// Attaches a consumer to the share keyed by `(op, instance_id)`,
    /// creating the share first when the key is vacant.
    ///
    /// The upstream subscription of a share is opened against the capability
    /// bundle of its first consumer; later consumers only attach.
    pub(crate) fn subscribe(&self, op: DeriveOp, instance_id: &str, api: DynRpcApi) -> HeaderStream {
        let key = (op, instance_id.to_string());
        let (heads, listener_id, receiver) = {
            let mut shares = self.inner.shares.lock();
            let share = shares.entry(key.clone()).or_insert_with(|| {
                trace!("[DeriveRegistry] creating {op} share for instance {instance_id}");
                Share { active: 0, heads: Arc::new(SharedHeads::new(op, instance_id)) }
            });
            share.active += 1;
            let (listener_id, receiver) = share.heads.register_listener();
            (share.heads.clone(), listener_id, receiver)
        };
        // A no-op for every consumer but the creating one
        heads.start(api);
        HeaderStream::new(receiver, ShareGuard { inner: self.inner.clone(), key, listener_id })
    }
}

impl Inner {
    fn detach(&self, key: &ShareKey, listener_id: ListenerId) {
        let mut shares = self.shares.lock();
        let Some(share) = shares.get_mut(key) else {
            return;
        };
        share.heads.unregister_listener(listener_id);
        share.active -= 1;
        if share.active > 0 {
            return;
        }
        trace!("[DeriveRegistry] removing {} share for instance {}", key.0, key.1);
        let teardown = shares.remove(key).map(|share| share.heads);
        drop(shares);
        if let Some(heads) = teardown {
            heads.shutdown();
        }
    }
}

/// Detaches a consumer from its share when the consumer's stream is dropped
#[derive(Debug)]
pub(crate) struct ShareGuard {
    inner: Arc<Inner>,
    key: ShareKey,
    listener_id: ListenerId,
}

impl Drop for ShareGuard {
    fn drop(&mut self) {
        self.inner.detach(&self.key, self.listener_id);
    }
}
