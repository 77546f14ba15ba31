use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub mod memory;
pub mod slot;

pub use memory::InMemorySlotRepository;
pub use slot::SqlSlotRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl RepositoryError {
    /// SQLITE_FULL: the database or disk is full.
    pub fn is_storage_full(&self) -> bool {
        match self {
            Self::Database(sqlx::Error::Database(error)) => error.code().as_deref() == Some("13"),
            _ => false,
        }
    }
}

/// One saved quote payload under its slot key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlotRecord {
    pub key: String,
    pub payload: String,
    pub saved_at: DateTime<Utc>,
}

impl SlotRecord {
    pub fn new(key: impl Into<String>, payload: impl Into<String>) -> Self {
        Self { key: key.into(), payload: payload.into(), saved_at: Utc::now() }
    }
}

#[async_trait]
pub trait SlotRepository: Send + Sync {
    async fn find(&self, key: &str) -> Result<Option<SlotRecord>, RepositoryError>;
    async fn save(&self, record: SlotRecord) -> Result<(), RepositoryError>;
    /// Most recently saved first.
    async fn list(&self) -> Result<Vec<SlotRecord>, RepositoryError>;
}
