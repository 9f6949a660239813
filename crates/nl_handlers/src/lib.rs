pub mod cli;
pub mod handlers;
pub mod logging;
pub mod orchestrator;
pub mod scheduler;

pub use handlers::{HandlerRegistry, NewsletterHandler, Resolution};
pub use logging::{init_logging, Logger};
pub use orchestrator::{IngestConfig, IngestionOrchestrator, ProcessingFailure, TickOutcome, TickReport};
pub use scheduler::{IngestScheduler, DEFAULT_SCHEDULE};

pub use cli::{extract_file, handle_command, IngestCommands, MailboxArgs};

pub mod prelude {
    pub use super::handlers::{MultipleFeedsHandler, NewsletterHandler, SingleFeedHandler};
    pub use nl_core::{Article, Email, Error, Newsletter, Publication, Result};
}
