//! Completion tracker for a dynamically growing set of tasks
//!
//! Units of work register before they start and arrive when they finish.
//! Registration may happen while someone is already waiting, which is how
//! recursively spawned work keeps the crawl alive until the last link is done.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Counting barrier over an unknown number of units of work
#[derive(Debug, Default)]
pub struct CompletionTracker {
    pending: AtomicUsize,
    notify: Notify,
}

/// A registered unit of work
///
/// Arrives at the tracker when dropped, so every exit path of the owning task
/// (success, failure, panic, cancellation) releases it exactly once.
#[must_use = "dropping a unit immediately arrives at the tracker"]
#[derive(Debug)]
pub struct Unit {
    tracker: Arc<CompletionTracker>,
}

impl CompletionTracker {
    /// Creates a tracker with no pending units
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a new unit of work
    pub fn register(self: &Arc<Self>) -> Unit {
        self.pending.fetch_add(1, Ordering::AcqRel);
        Unit {
            tracker: Arc::clone(self),
        }
    }

    /// Number of units registered but not yet arrived
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Waits until every registered unit has arrived
    ///
    /// Units registered after this call started are waited for as well, as
    /// long as they were registered before the count reached zero.
    pub async fn wait(&self) {
        loop {
            // Created before the check so a concurrent notify_waiters is not lost.
            let notified = self.notify.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn arrive(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.notify.notify_waiters();
        }
    }
}

impl Unit {
    /// Arrives at the tracker now rather than at the end of scope
    pub fn arrive(self) {}
}

impl Drop for Unit {
    fn drop(&mut self) {
        self.tracker.arrive();
    }
}
