use crate::models::EventRecord;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("event log I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage worker failed: {0}")]
    Worker(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append one record. Written records are never edited or removed.
    async fn append(&self, record: &EventRecord) -> StorageResult<()>;

    /// Every readable record, in append order.
    /// An empty store yields an empty Vec, not an error.
    async fn read_all(&self) -> StorageResult<Vec<EventRecord>>;

    /// The log file's bytes as stored, corrupt lines included.
    /// None when nothing has been written yet.
    async fn read_raw(&self) -> StorageResult<Option<Vec<u8>>>;
}
