//! Work scheduling for the worker pool

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::ReplayMode;
use crate::record::Record;
use crate::{Result, RetraceError};

/// Endless round-robin walk over a non-empty sequence
#[derive(Debug, Clone)]
pub struct Cycle<T> {
    items: Arc<[T]>,
    next: usize,
}

impl<T: Clone> Cycle<T> {
    /// Create a cycle starting at the first item
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `items` is empty
    pub fn new(items: Arc<[T]>) -> Result<Self> {
        if items.is_empty() {
            return Err(RetraceError::ConfigError(
                "cyclic replay needs at least one record".to_string(),
            ));
        }
        Ok(Self { items, next: 0 })
    }

    /// Index of the item the next call yields
    #[must_use]
    pub fn position(&self) -> usize {
        self.next
    }
}

impl<T: Clone> Iterator for Cycle<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let item = self.items[self.next].clone();
        self.next = (self.next + 1) % self.items.len();
        Some(item)
    }
}

/// Receiving side of the work queue, shared by every worker
#[derive(Clone)]
pub struct WorkReceiver {
    inner: Arc<Mutex<mpsc::Receiver<Arc<Record>>>>,
}

impl WorkReceiver {
    /// Wait for the next record; `None` once the queue is closed and empty
    ///
    /// Cancel-safe: dropping the future loses no item.
    pub async fn recv(&self) -> Option<Arc<Record>> {
        self.inner.lock().await.recv().await
    }
}

fn work_queue(capacity: usize) -> (mpsc::Sender<Arc<Record>>, WorkReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        tx,
        WorkReceiver {
            inner: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Turns the record sequence into a stream of work items
pub struct Scheduler {
    records: Arc<[Arc<Record>]>,
    mode: ReplayMode,
}

impl Scheduler {
    /// Create a scheduler
    ///
    /// # Errors
    ///
    /// Returns a configuration error for time-boxed mode with no records
    pub fn new(records: Vec<Record>, mode: ReplayMode) -> Result<Self> {
        let records: Arc<[Arc<Record>]> = records.into_iter().map(Arc::new).collect();

        if matches!(mode, ReplayMode::TimeBoxed(_)) && records.is_empty() {
            return Err(RetraceError::ConfigError(
                "time-boxed replay requested but no records were read".to_string(),
            ));
        }

        Ok(Self { records, mode })
    }

    /// Number of distinct records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there is nothing to schedule
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Start producing work
    ///
    /// Single pass enqueues every record and closes the queue before
    /// returning. Time-boxed mode spawns a producer that cycles until `stop`
    /// fires, then closes the queue; its handle yields the enqueue count.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for time-boxed mode with no records
    pub async fn start(
        self,
        stop: CancellationToken,
    ) -> Result<(WorkReceiver, Option<JoinHandle<usize>>)> {
        let (tx, work) = work_queue(self.records.len());

        match self.mode {
            ReplayMode::SinglePass => {
                for record in self.records.iter() {
                    if tx.send(Arc::clone(record)).await.is_err() {
                        break;
                    }
                }
                debug!("Enqueued {} records, queue closed", self.records.len());
                Ok((work, None))
            }
            ReplayMode::TimeBoxed(_) => {
                let cycle = Cycle::new(self.records)?;
                let producer = tokio::spawn(produce(cycle, tx, stop));
                Ok((work, Some(producer)))
            }
        }
    }
}

async fn produce(
    cycle: Cycle<Arc<Record>>,
    tx: mpsc::Sender<Arc<Record>>,
    stop: CancellationToken,
) -> usize {
    let mut enqueued = 0;

    for record in cycle {
        tokio::select! {
            biased;
            () = stop.cancelled() => break,
            sent = tx.send(record) => {
                if sent.is_err() {
                    break;
                }
                enqueued += 1;
            }
        }
    }

    debug!("Producer stopped after {enqueued} items");
    enqueued
}
