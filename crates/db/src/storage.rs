use blindquote_core::config::StorageConfig;
use blindquote_core::persistence::{QuoteStorage, StorageError};
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};
use tracing::info;

use crate::repositories::{RepositoryError, SlotRecord, SlotRepository, SqlSlotRepository};
use crate::{connect_with_settings, migrations};

#[derive(Debug, Error)]
pub enum StorageOpenError {
    #[error("could not start storage runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("could not connect to `{url}`: {source}")]
    Connect { url: String, source: sqlx::Error },
    #[error("could not apply migrations: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Blocking [`QuoteStorage`] over an async slot repository.
///
/// Owns a current-thread runtime and drives every repository call to completion on it, so it
/// must not be used from inside another async runtime.
pub struct RepositoryQuoteStorage<R> {
    repository: R,
    runtime: Runtime,
}

fn build_runtime() -> Result<Runtime, StorageOpenError> {
    Builder::new_current_thread().enable_all().build().map_err(StorageOpenError::Runtime)
}

fn storage_error(error: RepositoryError) -> StorageError {
    if error.is_storage_full() {
        StorageError::QuotaExceeded(error.to_string())
    } else {
        StorageError::Unavailable(error.to_string())
    }
}

impl<R> RepositoryQuoteStorage<R>
where
    R: SlotRepository,
{
    pub fn new(repository: R) -> Result<Self, StorageOpenError> {
        Ok(Self { repository, runtime: build_runtime()? })
    }

    pub fn list_slots(&self) -> Result<Vec<SlotRecord>, RepositoryError> {
        self.runtime.block_on(self.repository.list())
    }
}

impl RepositoryQuoteStorage<SqlSlotRepository> {
    /// Connects to the configured SQLite database and applies pending migrations.
    pub fn open(config: &StorageConfig) -> Result<Self, StorageOpenError> {
        let runtime = build_runtime()?;
        let pool = runtime.block_on(async {
            let pool =
                connect_with_settings(&config.url, config.max_connections, config.timeout_secs)
                    .await
                    .map_err(|source| StorageOpenError::Connect {
                        url: config.url.clone(),
                        source,
                    })?;
            migrations::run_pending(&pool).await?;
            Ok::<_, StorageOpenError>(pool)
        })?;

        info!(
            event_name = "quote.storage.opened",
            url = %config.url,
            max_connections = config.max_connections,
            "quote storage opened"
        );
        Ok(Self { repository: SqlSlotRepository::new(pool), runtime })
    }
}

impl<R> QuoteStorage for RepositoryQuoteStorage<R>
where
    R: SlotRepository,
{
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.runtime
            .block_on(self.repository.find(key))
            .map(|record| record.map(|record| record.payload))
            .map_err(storage_error)
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), StorageError> {
        self.runtime
            .block_on(self.repository.save(SlotRecord::new(key, payload)))
            .map_err(storage_error)
    }
}
