pub mod connection;
pub mod migrations;
pub mod repositories;
pub mod storage;

pub use connection::{connect_with_settings, DbPool};
pub use repositories::{
    InMemorySlotRepository, RepositoryError, SlotRecord, SlotRepository, SqlSlotRepository,
};
pub use storage::{RepositoryQuoteStorage, StorageOpenError};
