use serde::{Deserialize, Serialize};

use crate::domain::product::Dimension;
use crate::domain::quote::Quote;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    #[default]
    #[serde(rename = "QUICK_QUOTE")]
    QuickQuote,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCell {
    pub row_index: usize,
    pub column: Dimension,
}

/// Transient interaction state. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub input_value: String,
    pub input_mode: Dimension,
    pub is_editing: bool,
    pub active_cell: ActiveCell,
    pub selected_row_index: Option<usize>,
    pub current_view: View,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            input_value: String::new(),
            input_mode: Dimension::Width,
            is_editing: false,
            active_cell: ActiveCell { row_index: 0, column: Dimension::Width },
            selected_row_index: None,
            current_view: View::QuickQuote,
        }
    }
}

/// What the render side receives after every handled intent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub ui: UiState,
    pub quote_data: Quote,
}
