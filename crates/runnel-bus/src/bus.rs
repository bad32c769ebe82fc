use crate::{
    config::BusConfig,
    subscription::{ChangesStream, SubscriptionGuard},
};
use parking_lot::RwLock;
use runnel_core::{observe, Changes};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One registered subscription
struct Subscriber {
    watched: BTreeSet<String>,
    tx: mpsc::Sender<Changes>,
}

pub(crate) struct BusInner {
    config: BusConfig,
    subscribers: RwLock<HashMap<u64, Subscriber>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl BusInner {
    /// Remove a subscription from the registry.
    ///
    /// Called synchronously from [`ChangesStream`] disposal, so no
    /// notification published after disposal can reach the subscriber.
    pub(crate) fn unregister(&self, id: u64) {
        let mut subs = self.subscribers.write();
        if subs.remove(&id).is_some() {
            observe::set_subscriptions(subs.len());
            tracing::trace!(id, remaining = subs.len(), "subscription removed");
        }
    }
}

/// Table-keyed publish/subscribe hub
///
/// Owned by the store handle: created at store open, closed at store
/// close. The handle is cheap to clone; all clones share one registry.
/// Writers never need to know which queries exist: they publish
/// [`Changes`] and the bus fans out to every subscription whose watched
/// set intersects the affected tables.
#[derive(Clone)]
pub struct ChangeBus {
    inner: Arc<BusInner>,
}

impl ChangeBus {
    /// Create a bus with the default configuration.
    pub fn new() -> Self {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Self {
        Self {
            inner: Arc::new(BusInner {
                config,
                subscribers: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Publish a change notification.
    ///
    /// Fire-and-forget: safe to call synchronously from the call stack
    /// that just completed a write. Subscribers whose queue is full drop
    /// this event and recover on their next retained one. No-op after
    /// [`close`](Self::close) and for empty change sets.
    pub fn notify(&self, changes: Changes) {
        if changes.is_empty() || self.inner.closed.load(Ordering::SeqCst) {
            return;
        }

        let mut delivered = 0usize;
        let mut dropped = 0usize;
        let mut disconnected = Vec::new();

        {
            let subs = self.inner.subscribers.read();
            for (id, sub) in subs.iter() {
                if !changes.affects(&sub.watched) {
                    continue;
                }
                match sub.tx.try_send(changes.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => dropped += 1,
                    Err(mpsc::error::TrySendError::Closed(_)) => disconnected.push(*id),
                }
            }
        }

        // Prune receivers that went away without an explicit unsubscribe
        if !disconnected.is_empty() {
            let mut subs = self.inner.subscribers.write();
            for id in disconnected {
                subs.remove(&id);
            }
            observe::set_subscriptions(subs.len());
        }

        observe::record_notify(changes.affected().len());
        observe::record_fanout(delivered, dropped);
        tracing::trace!(
            tables = ?changes.affected(),
            delivered,
            dropped,
            "change notification published"
        );
    }

    /// Subscribe to changes touching any of the given tables.
    ///
    /// Returns a lazy, infinite stream of notifications; each call is an
    /// independent subscription with its own bounded queue. Delivery to
    /// one subscription preserves publish order. Watching no tables, or
    /// subscribing to a closed bus, yields an exhausted stream.
    pub fn observe<I, T>(&self, tables: I) -> ChangesStream
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let watched: BTreeSet<String> = tables.into_iter().map(Into::into).collect();

        if watched.is_empty() {
            return ChangesStream::exhausted();
        }

        let (tx, rx) = mpsc::channel(self.inner.config.queue_capacity.max(1));
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);

        {
            // Checked under the registry lock: close() clears the registry
            // while holding it, so a subscription cannot slip in afterwards
            let mut subs = self.inner.subscribers.write();
            if self.inner.closed.load(Ordering::SeqCst) {
                return ChangesStream::exhausted();
            }
            subs.insert(id, Subscriber { watched, tx });
            observe::set_subscriptions(subs.len());
        }

        tracing::trace!(id, "subscription registered");
        ChangesStream::live(rx, SubscriptionGuard::new(self.inner.clone(), id))
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Tear down the bus, releasing every live subscription.
    ///
    /// Live [`ChangesStream`]s end; later `notify` calls are no-ops and
    /// later `observe` calls yield exhausted streams. Idempotent.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let mut subs = self.inner.subscribers.write();
        let released = subs.len();
        subs.clear();
        observe::set_subscriptions(0);
        if released > 0 {
            tracing::debug!(released, "change bus closed");
        }
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}
