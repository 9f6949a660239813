use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No text/plain or text/html part found in message")]
    NoContent,

    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    #[error("Newsletter parsing error in {handler}: {reason}")]
    NewsletterParsing { handler: String, reason: String },

    #[error("Handler {handler} extracted no articles")]
    EmptyExtraction { handler: String },

    #[error("Several handlers claim the same email: {}", handlers.join(", "))]
    AmbiguousHandler { handlers: Vec<String> },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("DOM error: {0}")]
    Dom(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn parsing(handler: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::NewsletterParsing {
            handler: handler.into(),
            reason: reason.into(),
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
