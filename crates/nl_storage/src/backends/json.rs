use std::path::{Path, PathBuf};

use async_trait::async_trait;
use nl_core::{Publication, PublicationSink, Result};
use tokio::fs;
use tokio::sync::RwLock;

/// Publications persisted as one JSON array.
///
/// Every save rewrites the whole file through a temporary sibling and a
/// rename, so readers never see a half written document.
#[derive(Debug)]
pub struct JsonFileStorage {
    path: PathBuf,
    publications: RwLock<Vec<Publication>>,
}

impl JsonFileStorage {
    /// Loads `path` if it exists, otherwise starts empty. The file is created on first save.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let publications = match fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        tracing::debug!("Loaded {} publications from {}", publications.len(), path.display());

        Ok(Self {
            path,
            publications: RwLock::new(publications),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn publications(&self) -> Vec<Publication> {
        self.publications.read().await.clone()
    }

    async fn persist(&self, publications: &[Publication]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        fs::write(&temp, serde_json::to_vec_pretty(publications)?).await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl PublicationSink for JsonFileStorage {
    async fn save_publications(&self, publications: &[Publication]) -> Result<()> {
        let mut stored = self.publications.write().await;
        let mut merged = stored.clone();
        if super::merge(&mut merged, publications) == 0 {
            return Ok(());
        }

        self.persist(&merged).await?;
        *stored = merged;
        tracing::debug!("Saved {} publications to {}", stored.len(), self.path.display());
        Ok(())
    }
}
