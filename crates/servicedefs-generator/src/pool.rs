//! Bounded worker pool for build and scan tasks.
//!
//! Tasks run on the tokio runtime but each must hold a [`WorkerPermit`]
//! while it works, so no more than `size` tasks make progress at once no
//! matter how many services or files were submitted. A task may give its
//! permit back before it suspends on another task's result.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;

use crate::error::PipelineError;

pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
    closed: AtomicBool,
}

/// Proof that a task occupies one pool slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct WorkerPermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl WorkerPermit {
    /// Give the slot back, e.g. before waiting on another task.
    pub fn release(self) {}
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
            closed: AtomicBool::new(false),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of free slots right now.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Submit a task that holds its slot until it completes.
    pub fn spawn<Fut>(&self, task: Fut) -> Result<JoinHandle<Fut::Output>, PipelineError>
    where
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        self.submit(move |permit| async move {
            let output = task.await;
            drop(permit);
            output
        })
    }

    /// Submit a task. It starts once a slot is free and receives the permit
    /// for that slot; the slot is held for as long as the permit lives.
    pub fn submit<F, Fut, T>(&self, task: F) -> Result<JoinHandle<T>, PipelineError>
    where
        F: FnOnce(WorkerPermit) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(PipelineError::PoolClosed);
        }
        let permits = Arc::clone(&self.permits);
        Ok(tokio::spawn(async move {
            // The semaphore is never closed, so acquisition only fails if
            // that changes; the task then runs unbounded rather than not at all.
            let permit = WorkerPermit {
                _permit: permits.acquire_owned().await.ok(),
            };
            task(permit).await
        }))
    }

    /// Stop accepting submissions. Tasks already submitted still run.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
