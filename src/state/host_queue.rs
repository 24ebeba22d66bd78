use crate::crawler::{Job, WorkerPool};
use crate::state::lock;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};

/// Per-host admission queue
///
/// Admits up to `per_host` fetches for one host onto the download pool and
/// queues the rest. When an admitted fetch finishes it hands its slot to the
/// next queued fetch, giving a sliding window of at most `per_host` in-flight
/// requests per host, started in submission order.
pub struct HostQueue {
    host: String,
    per_host: usize,
    pool: Arc<WorkerPool>,
    state: Mutex<AdmissionState>,
}

/// Admission counter and waiting tasks, always updated together
#[derive(Default)]
struct AdmissionState {
    /// Number of tasks handed to the pool and not yet finished
    admitted: usize,

    /// Tasks waiting for a slot; non-empty only when `admitted == per_host`
    waiting: VecDeque<Job>,
}

impl HostQueue {
    /// Creates an empty queue for `host`
    pub fn new(host: impl Into<String>, per_host: usize, pool: Arc<WorkerPool>) -> Arc<Self> {
        Arc::new(Self {
            host: host.into(),
            per_host,
            pool,
            state: Mutex::new(AdmissionState::default()),
        })
    }

    /// Submits a fetch task for this host
    ///
    /// The task starts on the download pool right away if the host has a free
    /// slot, otherwise it waits behind earlier tasks for the same host.
    pub fn submit<F>(self: &Arc<Self>, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task: Job = Box::pin(task);
        {
            let mut state = lock(&self.state);
            if state.admitted >= self.per_host {
                state.waiting.push_back(task);
                tracing::trace!(
                    "Host {} at limit ({}), {} fetch(es) queued",
                    self.host,
                    self.per_host,
                    state.waiting.len()
                );
                return;
            }
            state.admitted += 1;
        }

        self.admit(task);
    }

    /// The host this queue admits fetches for
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Number of tasks currently admitted to the pool
    pub fn admitted(&self) -> usize {
        lock(&self.state).admitted
    }

    /// Number of tasks waiting for a slot
    pub fn queued(&self) -> usize {
        lock(&self.state).waiting.len()
    }

    // Hands a task that already holds a slot to the pool. The pool may drop
    // it on the spot if it is shut down, so no host lock is held here.
    fn admit(self: &Arc<Self>, task: Job) {
        let slot = Slot(Arc::clone(self));
        self.pool.submit(async move {
            let _slot = slot;
            task.await;
        });
    }

    // Passes a released slot to the next queued task, or gives it back.
    fn release(self: &Arc<Self>) {
        let mut state = lock(&self.state);

        if self.pool.is_closed() {
            state.admitted -= 1;
            let discarded = std::mem::take(&mut state.waiting);
            drop(state);
            // Queued tasks hold no slot, so dropping them does not come back here.
            drop(discarded);
            return;
        }

        let next = state.waiting.pop_front();
        if next.is_none() {
            state.admitted -= 1;
        }
        drop(state);

        if let Some(next) = next {
            self.admit(next);
        }
    }
}

/// Admission slot held by an admitted task
///
/// Released on drop, so a task that panics, is aborted, or is discarded by
/// the pool still lets the next queued task through.
struct Slot(Arc<HostQueue>);

impl Drop for Slot {
    fn drop(&mut self) {
        self.0.release();
    }
}

impl std::fmt::Debug for HostQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostQueue")
            .field("host", &self.host)
            .field("per_host", &self.per_host)
            .finish()
    }
}

/// Session-scoped registry of admission queues, keyed by host
///
/// Queues are created on first sight of a host and kept for the rest of the
/// session.
#[derive(Debug)]
pub struct HostRegistry {
    per_host: usize,
    pool: Arc<WorkerPool>,
    queues: Mutex<HashMap<String, Arc<HostQueue>>>,
}

impl HostRegistry {
    /// Creates an empty registry whose queues feed `pool`
    pub fn new(per_host: usize, pool: Arc<WorkerPool>) -> Self {
        Self {
            per_host,
            pool,
            queues: Mutex::new(HashMap::new()),
        }
    }

    /// Gets the queue for `host`, creating it if needed
    pub fn queue_for(&self, host: &str) -> Arc<HostQueue> {
        let mut queues = lock(&self.queues);
        if let Some(queue) = queues.get(host) {
            return Arc::clone(queue);
        }

        tracing::debug!("New host: {}", host);
        let queue = HostQueue::new(host, self.per_host, Arc::clone(&self.pool));
        queues.insert(host.to_string(), Arc::clone(&queue));
        queue
    }

    /// Number of distinct hosts seen in this session
    pub fn host_count(&self) -> usize {
        lock(&self.queues).len()
    }
}
