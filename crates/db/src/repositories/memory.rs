use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{RepositoryError, SlotRecord, SlotRepository};

#[derive(Default)]
pub struct InMemorySlotRepository {
    slots: RwLock<HashMap<String, SlotRecord>>,
}

#[async_trait::async_trait]
impl SlotRepository for InMemorySlotRepository {
    async fn find(&self, key: &str) -> Result<Option<SlotRecord>, RepositoryError> {
        let slots = self.slots.read().await;
        Ok(slots.get(key).cloned())
    }

    async fn save(&self, record: SlotRecord) -> Result<(), RepositoryError> {
        let mut slots = self.slots.write().await;
        slots.insert(record.key.clone(), record);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<SlotRecord>, RepositoryError> {
        let slots = self.slots.read().await;
        let mut records: Vec<SlotRecord> = slots.values().cloned().collect();
        records.sort_by(|left, right| right.saved_at.cmp(&left.saved_at));
        Ok(records)
    }
}
