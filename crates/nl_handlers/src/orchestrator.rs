use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use nl_core::{
    Clock, EmailSource, Error, MessageId, MonitoringSink, ProcessingContext, Publication, PublicationSink, RawMessage,
    Result,
};

use crate::handlers::{HandlerRegistry, Resolution};
use crate::logging::Logger;

/// Where to look for newsletters and what to do with them afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    pub folders: Vec<String>,
    /// Processed emails are moved here when set, otherwise only flagged as read.
    pub processed_folder: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            folders: vec!["INBOX".to_string()],
            processed_folder: None,
        }
    }
}

/// One email that could not be turned into publications.
#[derive(Debug)]
pub struct ProcessingFailure {
    pub message_id: MessageId,
    pub subject: String,
    pub handler: Option<String>,
    pub error: Error,
}

#[derive(Debug)]
pub struct TickReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub fetched: usize,
    /// Emails no handler claimed. They stay unread.
    pub skipped: usize,
    pub saved: Vec<MessageId>,
    pub failures: Vec<ProcessingFailure>,
    pub fetch_failed: bool,
}

impl TickReport {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            fetched: 0,
            skipped: 0,
            saved: Vec::new(),
            failures: Vec::new(),
            fetch_failed: false,
        }
    }
}

#[derive(Debug)]
pub enum TickOutcome {
    Completed(TickReport),
    /// Another tick was still running.
    Rejected,
}

impl TickOutcome {
    pub fn report(&self) -> Option<&TickReport> {
        match self {
            TickOutcome::Completed(report) => Some(report),
            TickOutcome::Rejected => None,
        }
    }
}

/// Clears the running flag when the tick ends, panics included.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct IngestionOrchestrator {
    source: Arc<dyn EmailSource>,
    sink: Arc<dyn PublicationSink>,
    monitor: Arc<dyn MonitoringSink>,
    clock: Arc<dyn Clock>,
    registry: HandlerRegistry,
    config: IngestConfig,
    running: AtomicBool,
}

impl IngestionOrchestrator {
    pub fn new(
        source: Arc<dyn EmailSource>,
        sink: Arc<dyn PublicationSink>,
        monitor: Arc<dyn MonitoringSink>,
        clock: Arc<dyn Clock>,
        registry: HandlerRegistry,
        config: IngestConfig,
    ) -> Self {
        Self {
            source,
            sink,
            monitor,
            clock,
            registry,
            config,
            running: AtomicBool::new(false),
        }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Fetches unread emails and processes them one by one.
    ///
    /// Never fails: every error ends up in the report and the monitoring sink.
    pub async fn run_tick(&self) -> TickOutcome {
        let logger = Logger::new().with_prefix("tick");
        let Some(_guard) = RunGuard::acquire(&self.running) else {
            logger.warn("⏳ Previous tick still running, skipping this one");
            return TickOutcome::Rejected;
        };

        let mut report = TickReport::new(self.clock.now());

        let messages = match self.source.fetch_unread(&self.config.folders).await {
            Ok(messages) => messages,
            Err(e) => {
                self.monitor.notify_transport_error(&e).await;
                report.fetch_failed = true;
                report.finished_at = self.clock.now();
                return TickOutcome::Completed(report);
            }
        };
        report.fetched = messages.len();
        logger.debug(&format!("📬 {} unread emails", messages.len()));

        for fetched in messages {
            let outcome = match &fetched {
                Ok(message) => self.process_message(message).await,
                Err(unreadable) => Err(ProcessingFailure {
                    message_id: unreadable.message_id.clone(),
                    subject: format!("unreadable message {}", unreadable.message_id),
                    handler: None,
                    error: Error::Transport(unreadable.error.to_string()),
                }),
            };
            let message_id = match &fetched {
                Ok(message) => message.message_id.clone(),
                Err(unreadable) => unreadable.message_id.clone(),
            };
            match outcome {
                Ok(Some(_)) => report.saved.push(message_id),
                Ok(None) => report.skipped += 1,
                Err(failure) => {
                    let context = ProcessingContext {
                        email_subject: &failure.subject,
                        handler_name: failure.handler.as_deref(),
                        error: &failure.error,
                    };
                    self.monitor.notify_processing_error(&context).await;
                    report.failures.push(failure);
                }
            }
        }

        report.finished_at = self.clock.now();
        logger.info(&format!(
            "✅ {} fetched, {} saved, {} skipped, {} failed",
            report.fetched,
            report.saved.len(),
            report.skipped,
            report.failures.len()
        ));
        TickOutcome::Completed(report)
    }

    /// `Ok(None)` when no handler claims the email.
    async fn process_message(
        &self,
        message: &RawMessage,
    ) -> std::result::Result<Option<Vec<Publication>>, ProcessingFailure> {
        let failure = |handler: Option<&str>, error: Error| ProcessingFailure {
            message_id: message.message_id.clone(),
            subject: message.subject.clone(),
            handler: handler.map(str::to_string),
            error,
        };

        let email = nl_mail::resolve(message).map_err(|e| failure(None, e))?;

        let handler = match self.registry.resolve(&email) {
            Resolution::None => {
                tracing::debug!("No handler for {} ({})", email.subject, email.sender);
                return Ok(None);
            }
            Resolution::One(handler) => handler,
            Resolution::Ambiguous(names) => {
                let handlers = names.iter().map(|n| n.to_string()).collect();
                return Err(failure(None, Error::AmbiguousHandler { handlers }));
            }
        };
        let name = handler.name();
        let logger = Logger::new().with_prefix(name).with_prefix(message.message_id.to_string());
        logger.debug(&format!("📰 Extracting {}", email.subject));

        let extracted = panic::catch_unwind(AssertUnwindSafe(|| handler.extract_publications(&email)))
            .unwrap_or_else(|_| Err(Error::parsing(name, "handler panicked")))
            .map_err(|e| failure(Some(name), e))?;

        let publications: Vec<Publication> = extracted.into_iter().filter(Publication::is_valid).collect();
        if publications.is_empty() {
            return Err(failure(Some(name), Error::EmptyExtraction { handler: name.to_string() }));
        }

        self.acknowledge(message, &publications)
            .await
            .map_err(|e| failure(Some(name), e))?;

        let articles: usize = publications.iter().map(|p| p.articles.len()).sum();
        logger.info(&format!("💾 Saved {} publications, {} articles", publications.len(), articles));
        Ok(Some(publications))
    }

    async fn acknowledge(&self, message: &RawMessage, publications: &[Publication]) -> Result<()> {
        self.sink.save_publications(publications).await?;
        self.source.mark_as_read(&message.message_id).await?;
        if let Some(folder) = &self.config.processed_folder {
            self.source.move_to_processed(&message.message_id, folder).await?;
        }
        Ok(())
    }
}
