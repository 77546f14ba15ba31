use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use super::{RepositoryError, SlotRecord, SlotRepository};
use crate::DbPool;

pub struct SqlSlotRepository {
    pool: DbPool,
}

impl SqlSlotRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<SlotRecord, RepositoryError> {
    let key: String = row.try_get("slot_key").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let payload: String =
        row.try_get("payload").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let saved_at_str: String =
        row.try_get("saved_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let saved_at = DateTime::parse_from_rfc3339(&saved_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid saved_at `{saved_at_str}`: {e}")))?;

    Ok(SlotRecord { key, payload, saved_at })
}

#[async_trait::async_trait]
impl SlotRepository for SqlSlotRepository {
    async fn find(&self, key: &str) -> Result<Option<SlotRecord>, RepositoryError> {
        let row = sqlx::query("SELECT slot_key, payload, saved_at FROM quote_slot WHERE slot_key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_record(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, record: SlotRecord) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO quote_slot (slot_key, payload, saved_at)
             VALUES (?, ?, ?)
             ON CONFLICT(slot_key) DO UPDATE SET
                 payload = excluded.payload,
                 saved_at = excluded.saved_at",
        )
        .bind(&record.key)
        .bind(&record.payload)
        .bind(record.saved_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<SlotRecord>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT slot_key, payload, saved_at FROM quote_slot ORDER BY saved_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect::<Result<Vec<_>, _>>()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::SqlSlotRepository;
    use crate::repositories::{RepositoryError, SlotRecord, SlotRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn save_and_find_by_key() {
        let repo = SqlSlotRepository::new(setup().await);
        let record = SlotRecord::new("roller_blind_quote_v2", r#"{"items":[],"summary":{}}"#);

        repo.save(record.clone()).await.expect("save");
        let found = repo.find("roller_blind_quote_v2").await.expect("find").expect("should exist");

        assert_eq!(found.key, record.key);
        assert_eq!(found.payload, record.payload);
        assert_eq!(found.saved_at.timestamp_micros(), record.saved_at.timestamp_micros());
    }

    #[tokio::test]
    async fn missing_slot_is_none() {
        let repo = SqlSlotRepository::new(setup().await);
        assert!(repo.find("never-saved").await.expect("find").is_none());
    }

    #[tokio::test]
    async fn save_overwrites_existing_slot() {
        let repo = SqlSlotRepository::new(setup().await);

        repo.save(SlotRecord::new("slot", "first")).await.expect("save first");
        repo.save(SlotRecord::new("slot", "second")).await.expect("save second");

        let found = repo.find("slot").await.expect("find").expect("should exist");
        assert_eq!(found.payload, "second");
        assert_eq!(repo.list().await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let repo = SqlSlotRepository::new(setup().await);
        let older =
            SlotRecord { saved_at: Utc::now() - Duration::hours(1), ..SlotRecord::new("old", "a") };
        repo.save(older).await.expect("save old");
        repo.save(SlotRecord::new("new", "b")).await.expect("save new");

        let keys: Vec<String> =
            repo.list().await.expect("list").into_iter().map(|record| record.key).collect();
        assert_eq!(keys, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn malformed_timestamp_is_a_decode_error() {
        let pool = setup().await;
        sqlx::query("INSERT INTO quote_slot (slot_key, payload, saved_at) VALUES (?, ?, ?)")
            .bind("slot")
            .bind("{}")
            .bind("yesterday")
            .execute(&pool)
            .await
            .expect("seed row");

        let repo = SqlSlotRepository::new(pool);
        let error = repo.find("slot").await.expect_err("decode should fail");
        assert!(matches!(error, RepositoryError::Decode(_)));
        assert!(!error.is_storage_full());
    }
}
