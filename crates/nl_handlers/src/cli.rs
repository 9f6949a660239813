use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::anyhow;
use chrono::Utc;
use clap::{Args, Subcommand};
use nl_core::{Error, MessageId, Publication, PublicationSink, Result, SystemClock, TracingMonitor};
use nl_mail::{parse_raw_message, resolve, MaildirSource};

use crate::handlers::{HandlerRegistry, Resolution};
use crate::orchestrator::{IngestConfig, IngestionOrchestrator, TickOutcome, TickReport};
use crate::scheduler::{IngestScheduler, DEFAULT_SCHEDULE};

#[derive(Args, Debug, Clone)]
pub struct MailboxArgs {
    /// Root of the Maildir tree holding the newsletters
    #[arg(long, env = "NL_MAILDIR")]
    pub maildir: PathBuf,
    /// Folders to read, comma separated
    #[arg(long, env = "NL_FOLDERS", value_delimiter = ',', default_value = "INBOX")]
    pub folders: Vec<String>,
    /// Move processed emails to this folder instead of only flagging them as read
    #[arg(long, env = "NL_PROCESSED_FOLDER")]
    pub processed_folder: Option<String>,
}

impl MailboxArgs {
    pub fn config(&self) -> IngestConfig {
        IngestConfig {
            folders: self.folders.clone(),
            processed_folder: self.processed_folder.clone(),
        }
    }

    pub fn source(&self) -> MaildirSource {
        MaildirSource::new(&self.maildir)
    }
}

#[derive(Subcommand, Debug)]
pub enum IngestCommands {
    /// Process unread newsletters once
    Run {
        #[command(flatten)]
        mailbox: MailboxArgs,
    },
    /// Process unread newsletters on a schedule until interrupted
    Watch {
        #[command(flatten)]
        mailbox: MailboxArgs,
        /// Cron expression with seconds, e.g. "0 */15 * * * *"
        #[arg(long, env = "NL_SCHEDULE", default_value = DEFAULT_SCHEDULE)]
        schedule: String,
        /// Wait for the first scheduled firing instead of running right away
        #[arg(long)]
        no_startup_run: bool,
    },
    /// List available handlers and their newsletters
    Handlers,
    /// Extract publications from a single .eml file without touching any mailbox
    Extract {
        file: PathBuf,
    },
}

pub fn orchestrator(mailbox: &MailboxArgs, sink: Arc<dyn PublicationSink>) -> IngestionOrchestrator {
    IngestionOrchestrator::new(
        Arc::new(mailbox.source()),
        sink,
        Arc::new(TracingMonitor),
        Arc::new(SystemClock),
        HandlerRegistry::default_handlers(),
        mailbox.config(),
    )
}

pub async fn handle_command(command: IngestCommands, sink: Arc<dyn PublicationSink>) -> Result<()> {
    match command {
        IngestCommands::Run { mailbox } => match orchestrator(&mailbox, sink).run_tick().await {
            TickOutcome::Completed(report) => print_report(&report),
            TickOutcome::Rejected => println!("⏳ A tick is already running"),
        },
        IngestCommands::Watch {
            mailbox,
            schedule,
            no_startup_run,
        } => {
            let orchestrator = Arc::new(orchestrator(&mailbox, sink));
            let scheduler = IngestScheduler::start(orchestrator, &schedule, !no_startup_run).await?;
            tokio::signal::ctrl_c().await?;
            scheduler.shutdown().await?;
        }
        IngestCommands::Handlers => {
            let registry = HandlerRegistry::default_handlers();
            println!("Available handlers:");
            for handler in registry.iter() {
                println!("  {}", handler.name());
                for newsletter in handler.newsletters() {
                    println!("    {} - {} ({})", newsletter.code, newsletter.name, newsletter.website_url);
                }
            }
        }
        IngestCommands::Extract { file } => {
            let publications = extract_file(&file, &HandlerRegistry::default_handlers()).await?;
            println!("{}", serde_json::to_string_pretty(&publications)?);
        }
    }
    Ok(())
}

/// Runs resolution and extraction on one message file. Empty publications are dropped.
pub async fn extract_file(file: &Path, registry: &HandlerRegistry) -> Result<Vec<Publication>> {
    let bytes = tokio::fs::read(file).await?;
    let message_id = MessageId {
        folder: "file".to_string(),
        sequence: 1,
        key: file.display().to_string(),
    };
    let email = resolve(&parse_raw_message(message_id, Utc::now(), &bytes)?)?;

    let handler = match registry.resolve(&email) {
        Resolution::One(handler) => handler,
        Resolution::None => {
            return Err(Error::External(anyhow!("no handler for {} ({})", email.subject, email.sender)));
        }
        Resolution::Ambiguous(names) => {
            return Err(Error::AmbiguousHandler {
                handlers: names.iter().map(|n| n.to_string()).collect(),
            });
        }
    };

    let publications: Vec<Publication> = handler
        .extract_publications(&email)?
        .into_iter()
        .filter(Publication::is_valid)
        .collect();
    if publications.is_empty() {
        return Err(Error::EmptyExtraction {
            handler: handler.name().to_string(),
        });
    }
    Ok(publications)
}

fn print_report(report: &TickReport) {
    if report.fetch_failed {
        println!("📭 Mailbox unavailable");
        return;
    }
    println!(
        "📬 {} fetched, 💾 {} saved, ⏭️ {} skipped, ❌ {} failed",
        report.fetched,
        report.saved.len(),
        report.skipped,
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  {} {}: {}", failure.message_id, failure.subject, failure.error);
    }
}
