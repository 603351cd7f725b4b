use crate::{config::NotifyConfig, error::panic_message};
use futures::{FutureExt, future::BoxFuture};
use std::{
    future::Future,
    panic::AssertUnwindSafe,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};
use thiserror::Error as ThisError;
use tokio::{
    runtime::{Handle, TryCurrentError},
    sync::{Mutex as AsyncMutex, mpsc},
    task::JoinSet,
};

///
/// SubmitError
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, ThisError)]
pub enum SubmitError {
    #[error("notification pool is shut down")]
    Closed,

    #[error("notification queue is full")]
    Full,
}

///
/// ShutdownReport
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ShutdownReport {
    /// Every accepted job ran to completion.
    pub drained: bool,
    /// Jobs cancelled after the drain timeout expired.
    pub dropped: usize,
}

///
/// Job
///

struct Job {
    label: String,
    task: BoxFuture<'static, ()>,
}

type Queue = Arc<AsyncMutex<mpsc::Receiver<Job>>>;

///
/// WorkerPool
///
/// Fixed number of workers draining one bounded queue. Shared by every
/// repository of a runtime.
///
/// Intake never waits: a full queue rejects the job. Shutdown closes intake,
/// lets the workers drain within a timeout, then cancels whatever is left.
///

pub struct WorkerPool {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<JoinSet<()>>,
    pending: Arc<AtomicUsize>,
    rejected: AtomicU64,
    shutdown_timeout: Duration,
    listener_timeout: Duration,
}

impl WorkerPool {
    /// Spawn the workers on the current tokio runtime.
    pub fn start(config: &NotifyConfig) -> Result<Self, TryCurrentError> {
        let handle = Handle::try_current()?;
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let queue: Queue = Arc::new(AsyncMutex::new(receiver));
        let pending = Arc::new(AtomicUsize::new(0));

        let mut workers = JoinSet::new();
        for worker in 0..config.workers.max(1) {
            workers.spawn_on(
                work(worker, Arc::clone(&queue), Arc::clone(&pending)),
                &handle,
            );
        }

        tracing::debug!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            "notification pool started"
        );

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            pending,
            rejected: AtomicU64::new(0),
            shutdown_timeout: config.shutdown_timeout(),
            listener_timeout: config.listener_timeout(),
        })
    }

    // ======================================================================
    // Intake
    // ======================================================================

    /// Queue a job without waiting for capacity.
    pub fn submit<F>(&self, label: impl Into<String>, task: F) -> Result<(), SubmitError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            return Err(SubmitError::Closed);
        };

        self.pending.fetch_add(1, Ordering::SeqCst);
        let job = Job {
            label: label.into(),
            task: task.boxed(),
        };

        match sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(job)) => {
                release(&self.pending);
                self.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(job = %job.label, "notification queue full; job rejected");

                Err(SubmitError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                release(&self.pending);

                Err(SubmitError::Closed)
            }
        }
    }

    /// Jobs accepted but not yet finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Jobs turned away because the queue was full.
    #[must_use]
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    /// Deadline a listener job gets before it is abandoned.
    #[must_use]
    pub const fn listener_timeout(&self) -> Duration {
        self.listener_timeout
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    // ======================================================================
    // Shutdown
    // ======================================================================

    /// Shut down using the configured drain timeout.
    pub async fn shutdown(&self) -> ShutdownReport {
        self.shutdown_within(self.shutdown_timeout).await
    }

    /// Stop intake, drain for at most `timeout`, then cancel what is left.
    ///
    /// Calling this again after a shutdown returns a drained, empty report.
    pub async fn shutdown_within(&self, timeout: Duration) -> ShutdownReport {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);

        let mut workers =
            std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));

        let drain = async {
            while workers.join_next().await.is_some() {}
        };
        if tokio::time::timeout(timeout, drain).await.is_ok() {
            tracing::info!("notification pool drained");

            return ShutdownReport {
                drained: true,
                dropped: 0,
            };
        }

        let dropped = self.pending.swap(0, Ordering::SeqCst);
        workers.abort_all();
        while workers.join_next().await.is_some() {}

        tracing::warn!(
            dropped,
            timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            "notification pool did not drain in time; remaining jobs cancelled"
        );

        ShutdownReport {
            drained: false,
            dropped,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let pending = self.pending.load(Ordering::SeqCst);
        if pending > 0 {
            tracing::warn!(pending, "notification pool dropped without shutdown");
        }
    }
}

// Worker loop: one job at a time until the queue is closed and empty.
async fn work(worker: usize, queue: Queue, pending: Arc<AtomicUsize>) {
    loop {
        let job = queue.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };

        if let Err(payload) = AssertUnwindSafe(job.task).catch_unwind().await {
            tracing::error!(
                worker,
                job = %job.label,
                panic = %panic_message(payload.as_ref()),
                "notification job panicked"
            );
        }

        release(&pending);
    }

    tracing::trace!(worker, "notification worker stopped");
}

// Saturating: a forced shutdown resets the counter while jobs may still finish.
fn release(pending: &AtomicUsize) {
    let _ = pending.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
        Some(n.saturating_sub(1))
    });
}
