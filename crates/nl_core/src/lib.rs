pub mod clock;
pub mod error;
pub mod mime;
pub mod monitoring;
pub mod source;
pub mod storage;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use mime::MimePart;
pub use monitoring::{MonitoringSink, ProcessingContext, TracingMonitor};
pub use source::{EmailSource, Fetched, MessageId, RawMessage, UnreadableMessage};
pub use storage::PublicationSink;
pub use types::{Article, Email, EmailContent, Newsletter, Publication};
