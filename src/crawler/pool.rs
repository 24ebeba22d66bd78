//! Bounded worker pool
//!
//! Runs at most `size` jobs at a time on the tokio runtime and queues the rest
//! in submission order. The crawler keeps two of these: one for fetches, one
//! for link extraction, so that slow parsing never holds up the network side
//! and the other way round.

use crate::state::lock;
use crate::ConfigError;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

/// A unit of work submitted to a pool or an admission queue
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Fixed-size pool with an unbounded FIFO queue
///
/// Each running job owns a semaphore permit. When the job ends, by returning,
/// panicking or being aborted, the permit goes to the oldest queued job or
/// back to the semaphore.
pub struct WorkerPool {
    name: &'static str,
    size: usize,
    permits: usize,
    semaphore: Arc<Semaphore>,
    waiting: Mutex<VecDeque<Job>>,
    closed: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Permit held by a running job
struct Worker {
    pool: Arc<WorkerPool>,
    permit: Option<OwnedSemaphorePermit>,
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(permit) = self.permit.take() {
            self.pool.hand_off(permit);
        }
    }
}

impl WorkerPool {
    /// Creates a pool that runs at most `size` jobs concurrently
    ///
    /// # Returns
    ///
    /// * `Ok(WorkerPool)` - The pool, wrapped for sharing with its own jobs
    /// * `Err(ConfigError)` - `size` is zero
    pub fn new(name: &'static str, size: usize) -> Result<Arc<Self>, ConfigError> {
        if size == 0 {
            return Err(ConfigError::Validation(format!(
                "{} pool size must be >= 1",
                name
            )));
        }

        // "Unbounded" sizes are capped at what the semaphore can count.
        let permits = size.min(Semaphore::MAX_PERMITS);

        Ok(Arc::new(Self {
            name,
            size,
            permits,
            semaphore: Arc::new(Semaphore::new(permits)),
            waiting: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        }))
    }

    /// Submits a job, starting it now if a worker slot is free
    ///
    /// Jobs submitted after [`shutdown`](Self::shutdown) are dropped.
    pub fn submit<F>(self: &Arc<Self>, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let job: Job = Box::pin(job);
        let mut waiting = lock(&self.waiting);

        if self.is_closed() {
            drop(waiting);
            tracing::trace!("{} pool is shut down, dropping job", self.name);
            return;
        }

        // A free permit with an empty queue means no one is ahead of this job.
        if waiting.is_empty() {
            if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
                drop(waiting);
                self.spawn(permit, job);
                return;
            }
        }

        waiting.push_back(job);
        tracing::trace!("{} pool full, {} job(s) waiting", self.name, waiting.len());
    }

    /// Stops the pool immediately
    ///
    /// Queued jobs are discarded and running jobs are aborted at their next
    /// suspension point. There is no draining.
    pub fn shutdown(&self) {
        let discarded = {
            let mut waiting = lock(&self.waiting);
            self.closed.store(true, Ordering::Release);
            std::mem::take(&mut *waiting)
        };
        self.semaphore.close();

        if !discarded.is_empty() {
            tracing::debug!(
                "{} pool shut down, discarding {} queued job(s)",
                self.name,
                discarded.len()
            );
        }
        drop(discarded);

        for task in lock(&self.tasks).drain(..) {
            task.abort();
        }
    }

    /// Maximum number of concurrently running jobs
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of jobs currently running
    pub fn running(&self) -> usize {
        self.permits - self.semaphore.available_permits()
    }

    /// Number of jobs waiting for a free slot
    pub fn queued(&self) -> usize {
        lock(&self.waiting).len()
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn spawn(self: &Arc<Self>, permit: OwnedSemaphorePermit, job: Job) {
        let worker = Worker {
            pool: Arc::clone(self),
            permit: Some(permit),
        };
        let task = tokio::spawn(async move {
            let _worker = worker;
            job.await;
        });

        // No lock is held across the spawn: a runtime that is shutting down
        // drops the job inline, which may re-enter the pool.
        let mut tasks = lock(&self.tasks);
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    // Gives a finished job's permit to the oldest queued job.
    fn hand_off(self: &Arc<Self>, permit: OwnedSemaphorePermit) {
        let mut waiting = lock(&self.waiting);
        if self.is_closed() {
            return;
        }

        let next = waiting.pop_front();
        match next {
            Some(next) => {
                drop(waiting);
                self.spawn(permit, next);
            }
            // Released under the lock so a concurrent `submit` cannot queue
            // behind a permit that is about to become free.
            None => drop(permit),
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish()
    }
}
