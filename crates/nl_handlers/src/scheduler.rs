use std::sync::Arc;

use anyhow::anyhow;
use nl_core::{Error, Result};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::orchestrator::{IngestionOrchestrator, TickOutcome};

/// Every fifteen minutes, on the minute.
pub const DEFAULT_SCHEDULE: &str = "0 */15 * * * *";

fn scheduler_error(e: JobSchedulerError) -> Error {
    Error::External(anyhow!("scheduler: {:?}", e))
}

/// Runs ingestion ticks on a cron schedule.
///
/// Firings that overlap a running tick are rejected by the orchestrator and
/// only logged.
pub struct IngestScheduler {
    scheduler: JobScheduler,
}

impl IngestScheduler {
    pub async fn start(orchestrator: Arc<IngestionOrchestrator>, cron: &str, run_at_startup: bool) -> Result<Self> {
        let scheduler = JobScheduler::new().await.map_err(scheduler_error)?;

        let job_orchestrator = orchestrator.clone();
        let job = Job::new_async(cron, move |_uuid, _lock| {
            let orchestrator = job_orchestrator.clone();
            Box::pin(async move {
                run(&orchestrator, "scheduled").await;
            })
        })
        .map_err(scheduler_error)?;

        scheduler.add(job).await.map_err(scheduler_error)?;
        scheduler.start().await.map_err(scheduler_error)?;
        tracing::info!("⏰ Ingestion scheduled with '{}'", cron);

        if run_at_startup {
            tokio::spawn(async move {
                run(&orchestrator, "startup").await;
            });
        }

        Ok(Self { scheduler })
    }

    pub async fn shutdown(mut self) -> Result<()> {
        self.scheduler.shutdown().await.map_err(scheduler_error)?;
        tracing::info!("⏰ Scheduler stopped");
        Ok(())
    }
}

async fn run(orchestrator: &IngestionOrchestrator, trigger: &str) {
    match orchestrator.run_tick().await {
        TickOutcome::Completed(report) if report.fetch_failed => {
            tracing::warn!("{} tick could not reach the mailbox", trigger);
        }
        TickOutcome::Completed(report) => {
            tracing::debug!("{} tick finished in {}", trigger, report.finished_at - report.started_at);
        }
        TickOutcome::Rejected => {
            tracing::warn!("{} tick rejected, previous tick still running", trigger);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerRegistry;
    use crate::orchestrator::IngestConfig;
    use async_trait::async_trait;
    use nl_core::{EmailSource, Fetched, MessageId, Publication, PublicationSink, SystemClock, TracingMonitor};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingSource {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl EmailSource for CountingSource {
        async fn fetch_unread(&self, _folders: &[String]) -> Result<Vec<Fetched>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn mark_as_read(&self, _id: &MessageId) -> Result<()> {
            Ok(())
        }

        async fn move_to_processed(&self, _id: &MessageId, _folder: &str) -> Result<()> {
            Ok(())
        }
    }

    struct NullSink;

    #[async_trait]
    impl PublicationSink for NullSink {
        async fn save_publications(&self, _publications: &[Publication]) -> Result<()> {
            Ok(())
        }
    }

    fn orchestrator(source: Arc<CountingSource>) -> Arc<IngestionOrchestrator> {
        Arc::new(IngestionOrchestrator::new(
            source,
            Arc::new(NullSink),
            Arc::new(TracingMonitor),
            Arc::new(SystemClock),
            HandlerRegistry::default_handlers(),
            IngestConfig::default(),
        ))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_schedule() {
        let source = Arc::new(CountingSource::default());
        let result = IngestScheduler::start(orchestrator(source), "every now and then", false).await;
        assert!(matches!(result, Err(Error::External(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_startup_tick() {
        let source = Arc::new(CountingSource::default());
        // New Year's midnight only, so just the startup tick runs here.
        let scheduler = IngestScheduler::start(orchestrator(source.clone()), "0 0 0 1 1 *", true)
            .await
            .unwrap();

        for _ in 0..100 {
            if source.fetches.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(source.fetches.load(Ordering::SeqCst), 1);

        scheduler.shutdown().await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_no_startup_tick() {
        let source = Arc::new(CountingSource::default());
        let scheduler = IngestScheduler::start(orchestrator(source.clone()), "0 0 0 1 1 *", false)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);

        scheduler.shutdown().await.unwrap();
    }
}
