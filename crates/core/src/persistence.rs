use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::quote::Quote;

pub const DEFAULT_SLOT_KEY: &str = "roller_blind_quote_v2";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded: {0}")]
    QuotaExceeded(String),
}

/// Key-value slot storage backing the persistence gateway.
pub trait QuoteStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, payload: &str) -> Result<(), StorageError>;
}

impl<T> QuoteStorage for Arc<T>
where
    T: QuoteStorage + ?Sized,
{
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), StorageError> {
        (**self).write(key, payload)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryQuoteStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryQuoteStorage {
    pub fn raw(&self, key: &str) -> Option<String> {
        match self.slots.lock() {
            Ok(slots) => slots.get(key).cloned(),
            Err(poisoned) => poisoned.into_inner().get(key).cloned(),
        }
    }
}

impl QuoteStorage for InMemoryQuoteStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), StorageError> {
        match self.slots.lock() {
            Ok(mut slots) => slots.insert(key.to_string(), payload.to_string()),
            Err(poisoned) => poisoned.into_inner().insert(key.to_string(), payload.to_string()),
        };
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("could not serialize quote: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("saved quote is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("saved quote has no line items")]
    NoLineItems,
}

/// Saves and loads the quote in a single named slot.
pub struct PersistenceGateway<S> {
    storage: S,
    slot_key: String,
}

impl<S> PersistenceGateway<S>
where
    S: QuoteStorage,
{
    pub fn new(storage: S, slot_key: impl Into<String>) -> Self {
        Self { storage, slot_key: slot_key.into() }
    }

    pub fn with_default_slot(storage: S) -> Self {
        Self::new(storage, DEFAULT_SLOT_KEY)
    }

    pub fn slot_key(&self) -> &str {
        &self.slot_key
    }

    pub fn save(&self, quote: &Quote) -> Result<(), PersistenceError> {
        let result = serde_json::to_string(quote)
            .map_err(PersistenceError::Serialize)
            .and_then(|payload| self.storage.write(&self.slot_key, &payload).map_err(Into::into));

        match &result {
            Ok(()) => info!(
                event_name = "quote.persistence.saved",
                slot_key = %self.slot_key,
                line_items = quote.items.len(),
                "quote saved"
            ),
            Err(error) => warn!(
                event_name = "quote.persistence.save_failed",
                slot_key = %self.slot_key,
                error = %error,
                "quote save failed"
            ),
        }
        result
    }

    /// `Ok(None)` means nothing has been saved yet.
    pub fn load(&self) -> Result<Option<Quote>, PersistenceError> {
        let result = self.read_slot();

        match &result {
            Ok(Some(quote)) => info!(
                event_name = "quote.persistence.loaded",
                slot_key = %self.slot_key,
                line_items = quote.items.len(),
                "quote loaded"
            ),
            Ok(None) => info!(
                event_name = "quote.persistence.slot_empty",
                slot_key = %self.slot_key,
                "no saved quote in slot"
            ),
            Err(error) => warn!(
                event_name = "quote.persistence.load_failed",
                slot_key = %self.slot_key,
                error = %error,
                "quote load failed"
            ),
        }
        result
    }

    fn read_slot(&self) -> Result<Option<Quote>, PersistenceError> {
        let Some(payload) = self.storage.read(&self.slot_key)? else {
            return Ok(None);
        };
        let quote = serde_json::from_str::<Quote>(&payload).map_err(PersistenceError::Corrupt)?;
        if quote.items.is_empty() {
            return Err(PersistenceError::NoLineItems);
        }
        Ok(Some(quote))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        InMemoryQuoteStorage, PersistenceError, PersistenceGateway, QuoteStorage, StorageError,
        DEFAULT_SLOT_KEY,
    };
    use crate::domain::quote::{FabricType, ItemId, LineItem, Quote, QuoteSummary};

    struct FullStorage;

    impl QuoteStorage for FullStorage {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disk offline".to_string()))
        }

        fn write(&self, _key: &str, _payload: &str) -> Result<(), StorageError> {
            Err(StorageError::QuotaExceeded("slot limit reached".to_string()))
        }
    }

    fn priced_quote() -> Quote {
        Quote {
            items: vec![
                LineItem {
                    width: Some(1200),
                    height: Some(1800),
                    fabric_type: Some(FabricType::Bo1),
                    line_price: Some(Decimal::new(16_400, 2)),
                    ..LineItem::blank(ItemId("item-a".to_string()))
                },
                LineItem::blank(ItemId("item-b".to_string())),
            ],
            summary: QuoteSummary { total_sum: Some(Decimal::new(16_400, 2)) },
        }
    }

    #[test]
    fn save_then_load_round_trips_the_quote() {
        let gateway = PersistenceGateway::with_default_slot(InMemoryQuoteStorage::default());
        let quote = priced_quote();

        gateway.save(&quote).expect("save");
        let loaded = gateway.load().expect("load");

        assert_eq!(loaded, Some(quote));
        assert_eq!(gateway.slot_key(), DEFAULT_SLOT_KEY);
    }

    #[test]
    fn empty_slot_is_not_an_error() {
        let gateway = PersistenceGateway::new(InMemoryQuoteStorage::default(), "custom-slot");
        assert!(matches!(gateway.load(), Ok(None)));
    }

    #[test]
    fn payload_uses_items_and_summary_fields() {
        let storage = InMemoryQuoteStorage::default();
        let gateway = PersistenceGateway::new(storage.clone(), "slot");
        gateway.save(&priced_quote()).expect("save");

        let raw = storage.raw("slot").expect("payload written");
        let json: serde_json::Value = serde_json::from_str(&raw).expect("json payload");
        assert_eq!(json["items"][0]["itemId"], "item-a");
        assert_eq!(json["items"][0]["fabricType"], "BO1");
        assert_eq!(json["summary"]["totalSum"], 164.0);
        assert_eq!(json["items"][0]["linePrice"], 164.0);
    }

    #[test]
    fn corrupt_payload_is_reported() {
        let storage = InMemoryQuoteStorage::default();
        storage.write("slot", "{not json").expect("seed corrupt payload");
        let gateway = PersistenceGateway::new(storage, "slot");

        assert!(matches!(gateway.load(), Err(PersistenceError::Corrupt(_))));
    }

    #[test]
    fn payload_without_rows_is_rejected() {
        let storage = InMemoryQuoteStorage::default();
        storage
            .write("slot", r#"{"items":[],"summary":{"totalSum":null}}"#)
            .expect("seed empty payload");
        let gateway = PersistenceGateway::new(storage, "slot");

        assert!(matches!(gateway.load(), Err(PersistenceError::NoLineItems)));
    }

    #[test]
    fn storage_faults_are_returned_not_raised() {
        let gateway = PersistenceGateway::with_default_slot(FullStorage);

        let save = gateway.save(&priced_quote()).expect_err("quota exceeded");
        assert!(matches!(save, PersistenceError::Storage(StorageError::QuotaExceeded(_))));

        let load = gateway.load().expect_err("storage offline");
        assert!(matches!(load, PersistenceError::Storage(StorageError::Unavailable(_))));
    }
}
