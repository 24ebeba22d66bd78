use crate::state::lock;
use crate::FetchError;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Mutable state of one crawl session
///
/// Shared by every task spawned during a single `crawl` call. Each collection
/// sits behind its own lock; none of them is held across an `.await`.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Addresses already submitted for processing
    visited: Mutex<HashSet<String>>,

    /// Addresses whose fetch succeeded
    downloaded: Mutex<HashSet<String>>,

    /// Addresses whose fetch failed, with the cause
    errors: Mutex<HashMap<String, FetchError>>,
}

impl SessionState {
    /// Creates empty session state
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an address as visited
    ///
    /// Returns `true` only for the first caller; concurrent discoveries of the
    /// same address resolve to exactly one winner.
    pub fn mark_visited(&self, address: &str) -> bool {
        let mut visited = lock(&self.visited);
        if visited.contains(address) {
            return false;
        }
        visited.insert(address.to_string())
    }

    /// Records a successful fetch
    pub fn record_download(&self, address: String) {
        lock(&self.downloaded).insert(address);
    }

    /// Records a failed fetch
    ///
    /// Only the first error for an address is kept.
    pub fn record_error(&self, address: String, error: FetchError) {
        lock(&self.errors).entry(address).or_insert(error);
    }

    /// Takes the collected results out as a report
    ///
    /// Meant to be called once every task of the session has finished. The
    /// downloaded list is sorted so reports are stable across runs.
    pub fn take_report(&self) -> CrawlReport {
        let mut downloaded: Vec<String> = lock(&self.downloaded).drain().collect();
        downloaded.sort();
        let errors = std::mem::take(&mut *lock(&self.errors));

        CrawlReport { downloaded, errors }
    }
}

/// Outcome of a crawl
///
/// Every attempted address ends up in exactly one of the two collections.
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Addresses that were fetched successfully, sorted
    pub downloaded: Vec<String>,

    /// Addresses that could not be fetched, with the cause
    pub errors: HashMap<String, FetchError>,
}

impl CrawlReport {
    /// Whether nothing was attempted
    pub fn is_empty(&self) -> bool {
        self.downloaded.is_empty() && self.errors.is_empty()
    }

    /// Whether `address` was fetched successfully
    pub fn is_downloaded(&self, address: &str) -> bool {
        self.downloaded.binary_search_by(|d| d.as_str().cmp(address)).is_ok()
    }

    /// Number of addresses attempted
    pub fn attempted(&self) -> usize {
        self.downloaded.len() + self.errors.len()
    }
}
