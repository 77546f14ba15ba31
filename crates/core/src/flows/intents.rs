use serde::{Deserialize, Serialize};

use crate::domain::product::Dimension;

/// A keypad key. Travels as its label: `"0"`..`"9"`, `DEL`, `W`, `H`, `ENT`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Key {
    Digit(u8),
    Delete,
    Width,
    Height,
    Enter,
    Other(String),
}

impl Key {
    pub fn label(&self) -> String {
        match self {
            Self::Digit(digit) => digit.to_string(),
            Self::Delete => "DEL".to_string(),
            Self::Width => "W".to_string(),
            Self::Height => "H".to_string(),
            Self::Enter => "ENT".to_string(),
            Self::Other(label) => label.clone(),
        }
    }
}

impl From<&str> for Key {
    fn from(label: &str) -> Self {
        match label {
            "DEL" => Self::Delete,
            "W" => Self::Width,
            "H" => Self::Height,
            "ENT" => Self::Enter,
            _ => match label.as_bytes() {
                [digit @ b'0'..=b'9'] => Self::Digit(*digit - b'0'),
                _ => Self::Other(label.to_string()),
            },
        }
    }
}

impl From<String> for Key {
    fn from(label: String) -> Self {
        Self::from(label.as_str())
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.label()
    }
}

/// A table column as named by the view: `width`, `height`, `TYPE`, `linePrice`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TableColumn {
    Width,
    Height,
    Type,
    LinePrice,
    Other,
}

impl From<String> for TableColumn {
    fn from(name: String) -> Self {
        match name.as_str() {
            "width" => Self::Width,
            "height" => Self::Height,
            "TYPE" => Self::Type,
            "linePrice" => Self::LinePrice,
            _ => Self::Other,
        }
    }
}

impl From<TableColumn> for String {
    fn from(column: TableColumn) -> Self {
        match column {
            TableColumn::Width => "width",
            TableColumn::Height => "height",
            TableColumn::Type => "TYPE",
            TableColumn::LinePrice => "linePrice",
            TableColumn::Other => "other",
        }
        .to_string()
    }
}

impl TableColumn {
    pub fn dimension(self) -> Option<Dimension> {
        match self {
            Self::Width => Some(Dimension::Width),
            Self::Height => Some(Dimension::Height),
            Self::Type | Self::LinePrice | Self::Other => None,
        }
    }
}

/// User intents delivered to the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Intent {
    NumericKeyPressed {
        key: Key,
    },
    #[serde(rename_all = "camelCase")]
    TableCellClicked {
        row_index: usize,
        column: TableColumn,
    },
    TableHeaderClicked {
        column: TableColumn,
    },
    #[serde(rename_all = "camelCase")]
    SequenceCellClicked {
        row_index: usize,
    },
    #[serde(rename = "userRequestedInsertRow")]
    InsertRowRequested,
    #[serde(rename = "userRequestedDeleteRow")]
    DeleteRowRequested,
    #[serde(rename = "userRequestedPriceCalculation")]
    PriceCalculationRequested,
    #[serde(rename = "userRequestedSummation")]
    SummationRequested,
    #[serde(rename = "userRequestedSave")]
    SaveRequested,
    #[serde(rename = "userRequestedLoad")]
    LoadRequested,
}

impl Intent {
    pub fn key(label: &str) -> Self {
        Self::NumericKeyPressed { key: Key::from(label) }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NumericKeyPressed { .. } => "numericKeyPressed",
            Self::TableCellClicked { .. } => "tableCellClicked",
            Self::TableHeaderClicked { .. } => "tableHeaderClicked",
            Self::SequenceCellClicked { .. } => "sequenceCellClicked",
            Self::InsertRowRequested => "userRequestedInsertRow",
            Self::DeleteRowRequested => "userRequestedDeleteRow",
            Self::PriceCalculationRequested => "userRequestedPriceCalculation",
            Self::SummationRequested => "userRequestedSummation",
            Self::SaveRequested => "userRequestedSave",
            Self::LoadRequested => "userRequestedLoad",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Intent, Key, TableColumn};

    #[test]
    fn keys_parse_from_keypad_labels() {
        assert_eq!(Key::from("7"), Key::Digit(7));
        assert_eq!(Key::from("DEL"), Key::Delete);
        assert_eq!(Key::from("W"), Key::Width);
        assert_eq!(Key::from("H"), Key::Height);
        assert_eq!(Key::from("ENT"), Key::Enter);
        assert_eq!(Key::from("12"), Key::Other("12".to_string()));
        assert_eq!(Key::from("."), Key::Other(".".to_string()));
    }

    #[test]
    fn intents_deserialize_from_bus_payloads() {
        let key: Intent =
            serde_json::from_str(r#"{"type":"numericKeyPressed","key":"ENT"}"#).expect("key");
        assert_eq!(key, Intent::NumericKeyPressed { key: Key::Enter });

        let click: Intent =
            serde_json::from_str(r#"{"type":"tableCellClicked","rowIndex":2,"column":"TYPE"}"#)
                .expect("cell click");
        assert_eq!(click, Intent::TableCellClicked { row_index: 2, column: TableColumn::Type });

        let save: Intent = serde_json::from_str(r#"{"type":"userRequestedSave"}"#).expect("save");
        assert_eq!(save, Intent::SaveRequested);
        assert_eq!(save.name(), "userRequestedSave");
    }

    #[test]
    fn unknown_columns_are_tolerated() {
        let header: Intent =
            serde_json::from_str(r#"{"type":"tableHeaderClicked","column":"sequence"}"#)
                .expect("header click");
        assert_eq!(header, Intent::TableHeaderClicked { column: TableColumn::Other });
        assert_eq!(TableColumn::Other.dimension(), None);
    }

    #[test]
    fn keys_serialize_back_to_labels() {
        let json = serde_json::to_value(Intent::key("4")).expect("serialize");
        assert_eq!(json["type"], "numericKeyPressed");
        assert_eq!(json["key"], "4");
    }
}
