use std::fmt;
use std::path::Path;
use std::sync::Arc;

use clap::ValueEnum;
use nl_core::{Error, PublicationSink, Result};

pub mod backends;

pub use backends::*;

/// Where publications end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StorageKind {
    /// Kept in memory for the lifetime of the process
    #[default]
    Memory,
    /// A single JSON document on disk
    Json,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Memory => write!(f, "memory"),
            StorageKind::Json => write!(f, "json"),
        }
    }
}

pub async fn create_storage(kind: StorageKind, path: Option<&Path>) -> Result<Arc<dyn PublicationSink>> {
    let storage: Arc<dyn PublicationSink> = match kind {
        StorageKind::Memory => Arc::new(MemoryStorage::new()),
        StorageKind::Json => {
            let path = path.ok_or_else(|| Error::Storage("json storage needs a file path".to_string()))?;
            Arc::new(JsonFileStorage::open(path).await?)
        }
    };
    tracing::info!("💾 Storage initialized (using {})", kind);
    Ok(storage)
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, StorageKind};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_storage() {
        assert!(create_storage(StorageKind::Memory, None).await.is_ok());
        assert!(matches!(
            create_storage(StorageKind::Json, None).await,
            Err(Error::Storage(_))
        ));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("publications.json");
        assert!(create_storage(StorageKind::Json, Some(path.as_path())).await.is_ok());
    }

    #[test]
    fn test_storage_kind_values() {
        assert_eq!(StorageKind::from_str("json", true).unwrap(), StorageKind::Json);
        assert_eq!(StorageKind::default().to_string(), "memory");
    }
}
