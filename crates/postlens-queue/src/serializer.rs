//! Single-flight request serializer.
//!
//! Operations submitted through [`RequestSerializer::enqueue`] start in
//! submission order, with at most `max_concurrency` running at once. The
//! serializer is a cheap cloneable handle; construct one per process and pass
//! it to every caller that must share the slot.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::QueueError;

/// Default number of operations allowed to run at once.
pub const MAX_CONCURRENCY: usize = 1;

type Job = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// A submitted operation waiting for the worker slot.
struct QueuedTask {
    id: u64,
    job: Job,
}

#[derive(Default)]
struct WorkerState {
    active: usize,
    pending: VecDeque<QueuedTask>,
}

struct Inner {
    max_concurrency: usize,
    next_id: AtomicU64,
    state: Mutex<WorkerState>,
}

/// FIFO executor with a bounded number of active operations.
#[derive(Clone)]
pub struct RequestSerializer {
    inner: Arc<Inner>,
}

impl Default for RequestSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RequestSerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("RequestSerializer")
            .field("max_concurrency", &self.inner.max_concurrency)
            .field("active", &state.active)
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl RequestSerializer {
    /// A serializer running one operation at a time.
    pub fn new() -> Self {
        Self::with_concurrency(MAX_CONCURRENCY)
    }

    /// A serializer running up to `max_concurrency` operations at once (at least one).
    pub fn with_concurrency(max_concurrency: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                max_concurrency: max_concurrency.max(1),
                next_id: AtomicU64::new(1),
                state: Mutex::new(WorkerState::default()),
            }),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.inner.max_concurrency
    }

    /// Operations currently running.
    pub fn active_count(&self) -> usize {
        self.inner.lock().active
    }

    /// Operations waiting for the slot.
    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Submit `operation` and wait for its outcome.
    ///
    /// The operation is queued immediately, when `enqueue` is called, not
    /// when the returned future is first polled. Its `Ok`/`Err` is returned
    /// unchanged. If the operation panics, the slot is released and the
    /// caller receives [`QueueError::Abandoned`] converted into `E`.
    ///
    /// Must be called from within a Tokio runtime. Dropping the returned
    /// future does not cancel an operation that has already been queued.
    pub fn enqueue<F, Fut, T, E>(
        &self,
        operation: F,
    ) -> impl Future<Output = Result<T, E>> + Send + 'static
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: From<QueueError> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            Box::pin(async move {
                let outcome = operation().await;
                // Nobody may be listening any more; the outcome is dropped then.
                let _ = tx.send(outcome);
            })
        });

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut state = self.inner.lock();
            state.pending.push_back(QueuedTask { id, job });
            debug!(task = id, pending = state.pending.len(), "request queued");
        }
        Inner::run_next(&self.inner);

        async move {
            match rx.await {
                Ok(outcome) => outcome,
                Err(_) => Err(E::from(QueueError::Abandoned)),
            }
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start the oldest pending task if a slot is free.
    fn run_next(inner: &Arc<Inner>) {
        let task = {
            let mut state = inner.lock();
            if state.active >= inner.max_concurrency {
                return;
            }
            let Some(task) = state.pending.pop_front() else {
                return;
            };
            state.active += 1;
            task
        };

        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            let QueuedTask { id, job } = task;
            debug!(task = id, "request started");

            // Run in its own task so a panic is contained and the slot is still released.
            if let Err(err) = tokio::spawn(job()).await {
                warn!(task = id, error = %err, "queued request did not complete");
            }

            inner.lock().active -= 1;
            debug!(task = id, "request settled");

            // Start the next task on a later turn instead of chaining directly.
            tokio::task::yield_now().await;
            Inner::run_next(&inner);
        });
    }
}
