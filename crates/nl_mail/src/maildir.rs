use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nl_core::{EmailSource, Error, Fetched, MessageId, Result, UnreadableMessage};
use tokio::fs;

use crate::parse::parse_raw_message;

const INBOX: &str = "INBOX";
const SEEN: char = 'S';

/// [`EmailSource`] over a local Maildir++ tree.
///
/// `INBOX` is the root directory, any other folder `Name` lives in `.Name`.
/// Every call opens the directories it needs and holds nothing afterwards.
#[derive(Debug, Clone)]
pub struct MaildirSource {
    root: PathBuf,
}

impl MaildirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn folder_path(&self, folder: &str) -> PathBuf {
        if folder.eq_ignore_ascii_case(INBOX) {
            self.root.clone()
        } else {
            self.root.join(format!(".{}", folder))
        }
    }

    /// Finds the current file of a message in `new/` or `cur/` by its unique name.
    async fn locate(&self, id: &MessageId) -> Result<PathBuf> {
        let folder = self.folder_path(&id.folder);
        for sub in ["new", "cur"] {
            for name in list_dir(&folder.join(sub)).await? {
                if unique_name(&name) == id.key {
                    return Ok(folder.join(sub).join(name));
                }
            }
        }
        Err(Error::Transport(format!("Message {} not found in {}", id, folder.display())))
    }
}

fn unique_name(file_name: &str) -> &str {
    file_name.split(':').next().unwrap_or(file_name)
}

fn flags(file_name: &str) -> &str {
    file_name.split_once(":2,").map(|(_, flags)| flags).unwrap_or("")
}

fn with_flag(file_name: &str, flag: char) -> String {
    let mut current: Vec<char> = flags(file_name).chars().collect();
    if !current.contains(&flag) {
        current.push(flag);
    }
    current.sort_unstable();
    format!("{}:2,{}", unique_name(file_name), current.into_iter().collect::<String>())
}

async fn list_dir(path: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut entries = match fs::read_dir(path).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
        Err(e) => return Err(Error::Transport(format!("Cannot open {}: {}", path.display(), e))),
    };
    while let Some(entry) = entries.next_entry().await? {
        if let Some(name) = entry.file_name().to_str() {
            if !name.starts_with('.') {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

async fn ensure_folder(path: &Path) -> Result<()> {
    for sub in ["new", "cur", "tmp"] {
        fs::create_dir_all(path.join(sub)).await?;
    }
    Ok(())
}

#[async_trait]
impl EmailSource for MaildirSource {
    async fn fetch_unread(&self, folders: &[String]) -> Result<Vec<Fetched>> {
        let mut messages = Vec::new();

        for folder in folders {
            let path = self.folder_path(folder);
            if fs::metadata(&path).await.is_err() {
                return Err(Error::Transport(format!("Folder {} does not exist", path.display())));
            }

            let mut unread = Vec::new();
            for name in list_dir(&path.join("new")).await? {
                unread.push(path.join("new").join(name));
            }
            for name in list_dir(&path.join("cur")).await? {
                if !flags(&name).contains(SEEN) {
                    unread.push(path.join("cur").join(name));
                }
            }

            for (index, file) in unread.into_iter().enumerate() {
                let name = file
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();
                let bytes = fs::read(&file).await?;
                let received_at: DateTime<Utc> = fs::metadata(&file)
                    .await?
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                let id = MessageId {
                    folder: folder.clone(),
                    sequence: index as u32 + 1,
                    key: unique_name(&name).to_string(),
                };

                match parse_raw_message(id.clone(), received_at, &bytes) {
                    Ok(message) => messages.push(Ok(message)),
                    Err(error) => {
                        tracing::warn!("⚠️ Unreadable message {}: {}", file.display(), error);
                        messages.push(Err(UnreadableMessage { message_id: id, error }));
                    }
                }
            }
        }

        tracing::debug!("📬 Fetched {} unread messages from {:?}", messages.len(), folders);
        Ok(messages)
    }

    async fn mark_as_read(&self, id: &MessageId) -> Result<()> {
        let current = self.locate(id).await?;
        let name = current
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let target = self.folder_path(&id.folder).join("cur").join(with_flag(name, SEEN));
        fs::rename(&current, &target).await?;
        Ok(())
    }

    async fn move_to_processed(&self, id: &MessageId, folder: &str) -> Result<()> {
        let current = self.locate(id).await?;
        let destination = self.folder_path(folder);
        ensure_folder(&destination).await?;

        let name = current
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let file_name = if name.contains(":2,") {
            name.to_string()
        } else {
            format!("{}:2,", name)
        };
        fs::rename(&current, destination.join("cur").join(file_name)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = "From: news@tldrnewsletter.com\r\nSubject: TLDR 2024-01-02\r\nContent-Type: text/html\r\n\r\n<p>hi</p>\r\n";

    async fn maildir() -> (tempfile::TempDir, MaildirSource) {
        let dir = tempfile::tempdir().unwrap();
        ensure_folder(dir.path()).await.unwrap();
        fs::write(dir.path().join("new").join("1704182400.M1P1.host"), MESSAGE).await.unwrap();
        fs::write(dir.path().join("cur").join("1704182300.M2P1.host:2,S"), MESSAGE).await.unwrap();
        fs::write(dir.path().join("cur").join("1704182350.M3P1.host:2,F"), MESSAGE).await.unwrap();
        let source = MaildirSource::new(dir.path());
        (dir, source)
    }

    #[test]
    fn test_flag_names() {
        assert_eq!(with_flag("123.abc", 'S'), "123.abc:2,S");
        assert_eq!(with_flag("123.abc:2,F", 'S'), "123.abc:2,FS");
        assert_eq!(with_flag("123.abc:2,S", 'S'), "123.abc:2,S");
        assert_eq!(unique_name("123.abc:2,FS"), "123.abc");
    }

    #[tokio::test]
    async fn test_fetch_unread_skips_seen() {
        let (_dir, source) = maildir().await;
        let messages: Vec<_> = source
            .fetch_unread(&["INBOX".to_string()])
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.unwrap())
            .collect();

        let keys: Vec<_> = messages.iter().map(|m| m.message_id.key.as_str()).collect();
        assert_eq!(keys, vec!["1704182400.M1P1.host", "1704182350.M3P1.host"]);
        assert_eq!(messages[0].message_id.sequence, 1);
        assert_eq!(messages[1].message_id.sequence, 2);
        assert_eq!(messages[0].subject, "TLDR 2024-01-02");
    }

    #[tokio::test]
    async fn test_missing_folder_is_transport_error() {
        let (_dir, source) = maildir().await;
        let result = source.fetch_unread(&["Newsletters".to_string()]).await;
        assert!(matches!(result, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_mark_then_move() {
        let (dir, source) = maildir().await;
        let messages = source.fetch_unread(&["INBOX".to_string()]).await.unwrap();
        let id = messages[0].as_ref().unwrap().message_id.clone();

        source.mark_as_read(&id).await.unwrap();
        assert!(dir.path().join("cur").join("1704182400.M1P1.host:2,S").exists());
        assert_eq!(source.fetch_unread(&["INBOX".to_string()]).await.unwrap().len(), 1);

        source.move_to_processed(&id, "Processed").await.unwrap();
        assert!(dir
            .path()
            .join(".Processed")
            .join("cur")
            .join("1704182400.M1P1.host:2,S")
            .exists());
        assert!(matches!(source.mark_as_read(&id).await, Err(Error::Transport(_))));
    }

    #[tokio::test]
    async fn test_unreadable_message_is_returned_with_its_id() {
        let (dir, source) = maildir().await;
        let broken = "From: news@tldrnewsletter.com\r\n\
                      Subject: Broken\r\n\
                      Content-Type: text/html\r\n\
                      Content-Transfer-Encoding: base64\r\n\
                      \r\n\
                      @@@ not base64 @@@\r\n";
        fs::write(dir.path().join("new").join("1704182500.M4P1.host"), broken).await.unwrap();

        let fetched = source.fetch_unread(&["INBOX".to_string()]).await.unwrap();
        assert_eq!(fetched.len(), 3);
        match &fetched[1] {
            Err(unreadable) => {
                assert_eq!(unreadable.message_id.key, "1704182500.M4P1.host");
                assert!(matches!(unreadable.error, Error::Transport(_)));
            }
            Ok(message) => panic!("parsed {}", message.message_id),
        }
    }
}
