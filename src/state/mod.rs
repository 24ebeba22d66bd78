//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `SessionState`: visited / downloaded / failed addresses of one crawl
//! - `CrawlReport`: the immutable result handed back to the caller
//! - `HostQueue` / `HostRegistry`: per-host admission control

mod host_queue;
mod session;

// Re-export main types
pub use host_queue::{HostQueue, HostRegistry};
pub use session::{CrawlReport, SessionState};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the data if a previous holder panicked
///
/// Every critical section in the crate leaves its data consistent before any
/// call that could panic, so a poisoned lock is still safe to use.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
