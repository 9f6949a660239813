use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mime::MimePart;
use crate::{Error, Result};

/// Handle used to find a fetched message again in its mailbox.
///
/// It carries no connection; the source re-opens the folder on every call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId {
    pub folder: String,
    pub sequence: u32,
    pub key: String,
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.folder, self.sequence)
    }
}

/// A fetched message whose body has already been split into a part tree.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub message_id: MessageId,
    pub from: Vec<String>,
    pub date: Option<DateTime<Utc>>,
    /// Arrival time recorded by the mailbox.
    pub received_at: DateTime<Utc>,
    pub subject: String,
    pub root: MimePart,
}

/// A message that was found in the mailbox but could not be parsed.
#[derive(Debug)]
pub struct UnreadableMessage {
    pub message_id: MessageId,
    pub error: Error,
}

/// Outcome of reading one unread message.
pub type Fetched = std::result::Result<RawMessage, UnreadableMessage>;

#[async_trait]
pub trait EmailSource: Send + Sync {
    /// Returns every unread message of the given folders. Only a mailbox
    /// failure fails the call; a single bad message comes back as `Err`.
    async fn fetch_unread(&self, folders: &[String]) -> Result<Vec<Fetched>>;

    /// Flags a message as read
    async fn mark_as_read(&self, id: &MessageId) -> Result<()>;

    /// Moves a message into `folder`
    async fn move_to_processed(&self, id: &MessageId, folder: &str) -> Result<()>;
}
