//! Single-flight request queue
//!
//! Every non-unload request of a session goes through one [`RequestQueue`].
//! Submitted operations are kept in FIFO order and run one at a time by a
//! single consumer task, so a response has been fully handled (and the visitor
//! cookie updated) before the next operation starts building its request.

use crate::{OmnilyticsError, Result};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// FIFO of pending operations drained by one consumer task
#[derive(Debug, Clone)]
pub struct RequestQueue {
    sender: mpsc::UnboundedSender<Job>,
    pending: Arc<AtomicUsize>,
    settle_timeout: Option<Duration>,
}

impl RequestQueue {
    /// Create a queue and spawn its consumer on the current tokio runtime
    ///
    /// Fails with [`OmnilyticsError::InvalidState`] outside of a runtime.
    pub fn new() -> Result<Self> {
        Self::with_settle_timeout(None)
    }

    /// Create a queue whose operations fail with a timeout error when they
    /// have not settled after `settle_timeout`
    pub fn with_settle_timeout(settle_timeout: Option<Duration>) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| {
            OmnilyticsError::invalid_state("request queue needs a running tokio runtime")
        })?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        runtime.spawn(drain(receiver));

        Ok(Self {
            sender,
            pending,
            settle_timeout,
        })
    }

    /// Number of operations submitted and not yet settled
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Whether an operation is running or waiting
    pub fn is_busy(&self) -> bool {
        self.pending() > 0
    }

    /// Run `operation` once every operation submitted before it has settled
    ///
    /// The operation is not started until its turn comes, so anything it
    /// reads from shared state reflects the previous operation's outcome.
    pub async fn run<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let settle_timeout = self.settle_timeout;
        let pending = Arc::clone(&self.pending);

        let job: Job = Box::new(move || {
            Box::pin(async move {
                let outcome = match settle_timeout {
                    Some(limit) => match tokio::time::timeout(limit, operation()).await {
                        Ok(outcome) => outcome,
                        Err(_) => {
                            warn!("Queued analytics request did not settle within {:?}", limit);
                            Err(OmnilyticsError::timeout("queued analytics request"))
                        }
                    },
                    None => operation().await,
                };
                pending.fetch_sub(1, Ordering::SeqCst);
                // The caller may have gone away; the slot is released either way.
                let _ = tx.send(outcome);
            })
        });

        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(OmnilyticsError::QueueClosed);
        }
        debug!("Queued analytics request ({} pending)", self.pending());

        rx.await.map_err(|_| OmnilyticsError::QueueClosed)?
    }
}

async fn drain(mut receiver: mpsc::UnboundedReceiver<Job>) {
    while let Some(job) = receiver.recv().await {
        job().await;
    }
    debug!("Request queue consumer stopped");
}
