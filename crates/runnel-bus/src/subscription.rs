//! Live subscriptions handed out by [`ChangeBus::observe`](crate::ChangeBus::observe)
//!
//! A [`ChangesStream`] is the binding between one reactive reader and the
//! set of tables it watches. Disposal, whether an explicit
//! [`unsubscribe`](ChangesStream::unsubscribe) or a plain `drop`,
//! unregisters from the bus before returning, so no notification
//! published afterwards can reach the subscriber.

use crate::bus::BusInner;
use futures::Stream;
use pin_project::pin_project;
use runnel_core::Changes;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Unregisters the subscription from the bus registry on drop.
pub(crate) struct SubscriptionGuard {
    inner: Arc<BusInner>,
    id: u64,
}

impl SubscriptionGuard {
    pub(crate) fn new(inner: Arc<BusInner>, id: u64) -> Self {
        Self { inner, id }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.inner.unregister(self.id);
    }
}

/// A lazy, infinite stream of change notifications
///
/// Yields every published [`Changes`] whose table set intersects this
/// subscription's watched set, in publish order. The stream ends when the
/// bus is closed or the subscription is disposed.
#[pin_project]
pub struct ChangesStream {
    rx: Option<mpsc::Receiver<Changes>>,
    guard: Option<SubscriptionGuard>,
}

impl ChangesStream {
    pub(crate) fn live(rx: mpsc::Receiver<Changes>, guard: SubscriptionGuard) -> Self {
        Self {
            rx: Some(rx),
            guard: Some(guard),
        }
    }

    /// A stream that yields nothing: the degenerate form handed out for
    /// an empty watched set or a closed bus.
    pub(crate) fn exhausted() -> Self {
        Self {
            rx: None,
            guard: None,
        }
    }

    /// Dispose of the subscription.
    ///
    /// Unregisters from the bus synchronously; the stream is exhausted
    /// afterwards. Idempotent: a second call is a no-op.
    pub fn unsubscribe(&mut self) {
        self.guard.take();
        self.rx.take();
    }

    /// True once the subscription has been disposed (or never existed).
    pub fn is_disposed(&self) -> bool {
        self.rx.is_none()
    }
}

impl Stream for ChangesStream {
    type Item = Changes;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        match this.rx.as_mut() {
            None => Poll::Ready(None),
            Some(rx) => rx.poll_recv(cx),
        }
    }
}
