//! Replay engine driving records against a live endpoint

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{ReplayConfig, ReplayMode};
use crate::network::HttpClient;
use crate::record::Record;
use crate::Result;

use super::pool::{ReplaySummary, WorkerPool};
use super::scheduler::Scheduler;

/// Replay engine for re-issuing captured requests
pub struct ReplayEngine {
    config: ReplayConfig,
    client: Arc<HttpClient>,
}

impl ReplayEngine {
    /// Create a new replay engine with its own HTTP client
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the client cannot
    /// be built
    pub fn new(config: ReplayConfig) -> Result<Self> {
        config.validate()?;
        let client = HttpClient::new(config.timeout)?;
        Self::with_client(config, Arc::new(client))
    }

    /// Create a replay engine around an existing client
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid
    pub fn with_client(config: ReplayConfig, client: Arc<HttpClient>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, client })
    }

    /// Engine configuration
    #[must_use]
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Replay `records` until they are exhausted, the duration elapses, or
    /// `shutdown` fires
    ///
    /// Individual replay failures are logged and counted, never returned.
    ///
    /// # Errors
    ///
    /// Returns a configuration error, before any worker starts, when
    /// time-boxed mode is requested with no records
    pub async fn run(
        &self,
        records: Vec<Record>,
        shutdown: CancellationToken,
    ) -> Result<ReplaySummary> {
        let mode = self.config.mode();
        let scheduler = Scheduler::new(records, mode)?;

        let deadline = shutdown.child_token();
        let timer = match mode {
            ReplayMode::SinglePass => None,
            ReplayMode::TimeBoxed(span) => {
                let deadline = deadline.clone();
                Some(tokio::spawn(async move {
                    tokio::select! {
                        () = tokio::time::sleep(span) => {
                            info!("Replay duration of {} elapsed", humantime::format_duration(span));
                            deadline.cancel();
                        }
                        () = deadline.cancelled() => {}
                    }
                }))
            }
        };

        info!(
            "Warming up with {} workers for {} records",
            self.config.parallel,
            scheduler.len()
        );

        let (work, producer) = scheduler.start(deadline.clone()).await?;
        let pool = WorkerPool::new(self.config.parallel, Arc::clone(&self.client));

        info!("Replaying requests");
        let summary = pool.run(work, deadline.clone(), shutdown).await;

        deadline.cancel();
        if let Some(producer) = producer {
            match producer.await {
                Ok(enqueued) => debug!("Producer enqueued {enqueued} items"),
                Err(e) => warn!("Producer task failed: {e}"),
            }
        }
        if let Some(timer) = timer {
            timer.await.ok();
        }

        info!(
            dispatched = summary.dispatched,
            succeeded = summary.succeeded,
            rejected = summary.rejected,
            failed = summary.failed,
            "Replay finished"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RetraceError;
    use std::time::Duration;

    #[test]
    fn test_engine_rejects_zero_parallel() {
        let config = ReplayConfig {
            parallel: 0,
            ..Default::default()
        };
        assert!(ReplayEngine::new(config).is_err());
    }

    #[test]
    fn test_with_client_rejects_zero_parallel() {
        let client = Arc::new(HttpClient::new(Duration::from_secs(1)).unwrap());
        let config = ReplayConfig {
            parallel: 0,
            ..Default::default()
        };

        let err = ReplayEngine::with_client(config, client).err().unwrap();
        assert!(matches!(err, RetraceError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_time_boxed_without_records() {
        let engine = ReplayEngine::new(ReplayConfig {
            duration: Duration::from_millis(100),
            ..Default::default()
        })
        .unwrap();

        let err = engine
            .run(Vec::new(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RetraceError::ConfigError(_)));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_single_pass_without_records() {
        let engine = ReplayEngine::new(ReplayConfig::default()).unwrap();
        let summary = engine
            .run(Vec::new(), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(summary, ReplaySummary::default());
    }
}
