//! Single-slot coalescing signal from the edge handler to a task
//!
//! `raise` is lock-free and never blocks, so it is safe from the edge
//! handler. At most one signal is pending per channel: raising an already
//! pending channel is a no-op. Exactly one task may `wait` on a channel.

use crate::domain::types::Source;
use futures::task::AtomicWaker;
use std::future::poll_fn;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::Poll;

pub struct EventChannel {
    pending: AtomicBool,
    waker: AtomicWaker,
}

impl EventChannel {
    pub fn new() -> Self {
        Self { pending: AtomicBool::new(false), waker: AtomicWaker::new() }
    }

    /// Mark the channel pending and wake its consumer
    ///
    /// Returns false when a signal was already pending (coalesced).
    pub fn raise(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.waker.wake();
        true
    }

    /// Block until a signal is pending, then consume it
    pub async fn wait(&self) {
        poll_fn(|cx| {
            if self.pending.swap(false, Ordering::AcqRel) {
                return Poll::Ready(());
            }
            self.waker.register(cx.waker());
            // Re-check after registering so a raise between the two loads is not lost
            if self.pending.swap(false, Ordering::AcqRel) {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    /// Block until a signal is pending, leaving it pending
    ///
    /// The caller consumes it later with `try_take`, so other parties can see
    /// the signal as outstanding until then.
    pub async fn ready(&self) {
        poll_fn(|cx| {
            if self.pending.load(Ordering::Acquire) {
                return Poll::Ready(());
            }
            self.waker.register(cx.waker());
            if self.pending.load(Ordering::Acquire) {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        })
        .await
    }

    /// Consume a pending signal without waiting
    pub fn try_take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// One channel per source
#[derive(Default)]
pub struct EventChannels {
    channels: [EventChannel; 3],
}

impl EventChannels {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, source: Source) -> &EventChannel {
        &self.channels[source.index()]
    }
}
