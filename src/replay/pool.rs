//! Fixed-size pool of replay workers

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::network::HttpClient;

use super::procedure::{replay_record, Outcome};
use super::scheduler::WorkReceiver;

/// Outcome counters shared by the workers of one run
#[derive(Debug, Default)]
pub struct ReplayStats {
    dispatched: AtomicU64,
    succeeded: AtomicU64,
    rejected: AtomicU64,
    failed: AtomicU64,
}

impl ReplayStats {
    fn record(&self, outcome: &Outcome) {
        let counter = match outcome {
            Outcome::Success { .. } => &self.succeeded,
            Outcome::ReplayError { .. } => &self.rejected,
            Outcome::TransportError(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters
    #[must_use]
    pub fn summary(&self) -> ReplaySummary {
        ReplaySummary {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Aggregate result of a replay run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Items taken off the queue
    pub dispatched: u64,
    /// Items answered with 200 or 204
    pub succeeded: u64,
    /// Items answered with any other status
    pub rejected: u64,
    /// Items that failed in transport
    pub failed: u64,
}

/// Pool of `size` workers draining one work queue
pub struct WorkerPool {
    size: usize,
    client: Arc<HttpClient>,
}

impl WorkerPool {
    /// Create a new worker pool
    ///
    /// # Panics
    ///
    /// Panics if `size` is 0
    #[must_use]
    pub fn new(size: usize, client: Arc<HttpClient>) -> Self {
        assert!(size > 0, "pool size must be > 0");
        Self { size, client }
    }

    /// Number of workers
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Run every worker to completion
    ///
    /// Workers stop taking items when `stop` fires or the queue closes.
    /// `abort` is handed to in-flight requests. Returns once all workers
    /// have exited.
    pub async fn run(
        &self,
        work: WorkReceiver,
        stop: CancellationToken,
        abort: CancellationToken,
    ) -> ReplaySummary {
        let stats = Arc::new(ReplayStats::default());
        let mut workers = JoinSet::new();

        for id in 0..self.size {
            workers.spawn(worker(
                id,
                Arc::clone(&self.client),
                work.clone(),
                stop.clone(),
                abort.clone(),
                Arc::clone(&stats),
            ));
        }
        drop(work);

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                error!("Worker task failed: {e}");
            }
        }

        stats.summary()
    }
}

async fn worker(
    id: usize,
    client: Arc<HttpClient>,
    work: WorkReceiver,
    stop: CancellationToken,
    abort: CancellationToken,
    stats: Arc<ReplayStats>,
) {
    loop {
        let record = tokio::select! {
            biased;
            () = stop.cancelled() => {
                debug!(worker = id, "Worker cancelled");
                return;
            }
            next = work.recv() => match next {
                Some(record) => record,
                None => {
                    debug!(worker = id, "Work queue closed");
                    return;
                }
            },
        };

        stats.dispatched.fetch_add(1, Ordering::Relaxed);
        let outcome = replay_record(&client, &record, &abort).await;
        stats.record(&outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplayMode;
    use crate::record::{Record, RecordedRequest};
    use crate::replay::scheduler::Scheduler;
    use std::time::Duration;

    fn client() -> Arc<HttpClient> {
        Arc::new(HttpClient::new(Duration::from_secs(5)).unwrap())
    }

    fn unreachable_records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| Record {
                request: RecordedRequest {
                    method: "POST".to_string(),
                    url: format!("http://127.0.0.1:1/{i}"),
                    ..Default::default()
                },
                ..Default::default()
            })
            .collect()
    }

    #[test]
    #[should_panic(expected = "pool size must be > 0")]
    fn test_pool_zero_panic() {
        let _ = WorkerPool::new(0, client());
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_pool() {
        let scheduler = Scheduler::new(unreachable_records(6), ReplayMode::SinglePass).unwrap();
        let token = CancellationToken::new();
        let (work, _) = scheduler.start(token.clone()).await.unwrap();

        let pool = WorkerPool::new(3, client());
        let summary = pool.run(work, token.clone(), token).await;

        assert_eq!(summary.dispatched, 6);
        assert_eq!(summary.failed, 6);
        assert_eq!(summary.succeeded, 0);
    }

    #[tokio::test]
    async fn test_empty_queue_joins_immediately() {
        let scheduler = Scheduler::new(Vec::new(), ReplayMode::SinglePass).unwrap();
        let token = CancellationToken::new();
        let (work, _) = scheduler.start(token.clone()).await.unwrap();

        let pool = WorkerPool::new(4, client());
        let summary = tokio::time::timeout(Duration::from_secs(1), pool.run(work, token.clone(), token))
            .await
            .unwrap();

        assert_eq!(summary, ReplaySummary::default());
    }

    #[tokio::test]
    async fn test_cancelled_pool_takes_nothing() {
        let scheduler = Scheduler::new(unreachable_records(3), ReplayMode::SinglePass).unwrap();
        let token = CancellationToken::new();
        let (work, _) = scheduler.start(token.clone()).await.unwrap();
        token.cancel();

        let summary = WorkerPool::new(2, client())
            .run(work, token.clone(), token)
            .await;

        assert_eq!(summary.dispatched, 0);
    }
}
