pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod flows;
pub mod persistence;
pub mod pricing;
pub mod rules;
pub mod store;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::product::{Dimension, ProductKind, ValidationRule, ValidationRules};
pub use domain::quote::{FabricType, ItemId, ItemUpdate, LineItem, Quote, QuoteSummary};
pub use errors::ApplicationError;
pub use events::{EventBus, EventSink, InMemoryEventSink, Notification, OutboundEvent};
pub use flows::{Disposition, Intent, QuoteOrchestrator, StateSnapshot, UiState};
pub use persistence::{
    InMemoryQuoteStorage, PersistenceError, PersistenceGateway, QuoteStorage, StorageError,
    DEFAULT_SLOT_KEY,
};
pub use pricing::{
    MatrixShapeError, PriceBook, PriceLookupError, PriceMatrix, PriceMatrixError,
    PriceMatrixSource,
};
pub use rules::{ProductCatalog, ProductRules, RollerBlindRules};
pub use store::QuoteStore;
