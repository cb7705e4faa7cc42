//! Request log retention sweeper
//!
//! Periodically deletes request log entries whose deletion date has passed.

use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::config::LogRetentionConfig;
use crate::repositories::HttpRequestLogRepository;
use crate::request_log::LogStoreError;

/// Background task purging expired request log entries
pub struct LogRetentionSweeper {
    logs: HttpRequestLogRepository,
    config: LogRetentionConfig,
}

impl LogRetentionSweeper {
    pub fn new(logs: HttpRequestLogRepository, config: LogRetentionConfig) -> Self {
        Self { logs, config }
    }

    /// Run the sweeper loop until the provided shutdown token fires.
    ///
    /// The first purge happens one interval after start.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_seconds = self.config.sweep_interval_seconds,
            "Starting request log retention sweeper"
        );
        let tick_interval = Duration::from_secs(self.config.sweep_interval_seconds);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Retention sweeper shutdown requested");
                    break;
                }
                _ = sleep(tick_interval) => {
                    let tick_started = Instant::now();
                    if let Err(err) = self.tick().await {
                        error!(error = ?err, "Retention sweep failed");
                    }
                    histogram!("http_request_log_sweep_duration_ms")
                        .record(tick_started.elapsed().as_secs_f64() * 1_000.0);
                }
            }
        }

        info!("Retention sweeper stopped");
    }

    /// Perform one purge and return the number of deleted entries
    pub async fn tick(&self) -> Result<u64, LogStoreError> {
        let deleted = self.logs.purge_expired().await?;
        counter!("http_request_log_purged_total").increment(deleted);
        if deleted > 0 {
            info!(deleted, "Purged expired request log entries");
        }
        Ok(deleted)
    }
}
