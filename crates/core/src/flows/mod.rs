pub mod intents;
pub mod orchestrator;
pub mod state;

pub use intents::{Intent, Key, TableColumn};
pub use orchestrator::{Disposition, QuoteOrchestrator};
pub use state::{ActiveCell, StateSnapshot, UiState, View};
