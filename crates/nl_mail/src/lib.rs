//! Mail side of the pipeline: turning mailbox contents into [`nl_core::Email`] values.

pub mod maildir;
pub mod parse;
pub mod resolver;

pub use maildir::MaildirSource;
pub use parse::parse_raw_message;
pub use resolver::resolve;
