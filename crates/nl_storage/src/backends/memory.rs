use async_trait::async_trait;
use nl_core::{Publication, PublicationSink, Result};
use tokio::sync::RwLock;

/// Process-local publication store.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    publications: RwLock<Vec<Publication>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn publications(&self) -> Vec<Publication> {
        self.publications.read().await.clone()
    }

    pub async fn by_newsletter(&self, code: &str) -> Vec<Publication> {
        self.publications
            .read()
            .await
            .iter()
            .filter(|p| p.newsletter.code == code)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PublicationSink for MemoryStorage {
    async fn save_publications(&self, publications: &[Publication]) -> Result<()> {
        let mut stored = self.publications.write().await;
        let added = super::merge(&mut stored, publications);
        tracing::debug!("Stored {} of {} publications", added, publications.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_support::publication;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage
            .save_publications(&[publication("kotlin-weekly", "Issue 1", 1), publication("tldr", "TLDR 2023-10-02", 2)])
            .await
            .unwrap();

        assert_eq!(storage.publications().await.len(), 2);
        let kotlin = storage.by_newsletter("kotlin-weekly").await;
        assert_eq!(kotlin.len(), 1);
        assert_eq!(kotlin[0].title, "Issue 1");
        assert!(storage.by_newsletter("android-weekly").await.is_empty());
    }

    #[tokio::test]
    async fn test_saving_twice_does_not_duplicate() {
        let storage = MemoryStorage::new();
        let issue = publication("kotlin-weekly", "Issue 1", 1);

        storage.save_publications(&[issue.clone()]).await.unwrap();
        storage.save_publications(&[issue.clone(), issue]).await.unwrap();

        assert_eq!(storage.publications().await.len(), 1);
    }
}
