use async_trait::async_trait;
use crate::types::Publication;
use crate::Result;

#[async_trait]
pub trait PublicationSink: Send + Sync {
    /// Stores a batch of publications. Saving an already stored issue again must not duplicate it.
    async fn save_publications(&self, publications: &[Publication]) -> Result<()>;
}
