use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product::Dimension;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn generate() -> Self {
        Self(format!("item-{}", Uuid::new_v4()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FabricType {
    #[serde(rename = "BO")]
    Bo,
    #[serde(rename = "BO1")]
    Bo1,
    #[serde(rename = "SN")]
    Sn,
}

impl FabricType {
    /// Order in which clicks on the type column cycle through fabrics.
    pub const SEQUENCE: [FabricType; 3] = [FabricType::Bo, FabricType::Bo1, FabricType::Sn];

    /// Next fabric in the cycle. `None` starts the cycle at its first entry.
    pub fn cycle_from(current: Option<FabricType>) -> FabricType {
        let next_index = match current {
            Some(fabric) => {
                let index = Self::SEQUENCE.iter().position(|candidate| *candidate == fabric);
                index.map(|index| (index + 1) % Self::SEQUENCE.len()).unwrap_or(0)
            }
            None => 0,
        };
        Self::SEQUENCE[next_index]
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::Bo => "BO",
            Self::Bo1 => "BO1",
            Self::Sn => "SN",
        }
    }
}

impl std::fmt::Display for FabricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for FabricType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "BO" => Ok(Self::Bo),
            "BO1" => Ok(Self::Bo1),
            "SN" => Ok(Self::Sn),
            other => Err(format!("unknown fabric type `{other}` (expected BO|BO1|SN)")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub item_id: ItemId,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fabric_type: Option<FabricType>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub line_price: Option<Decimal>,
}

impl LineItem {
    pub fn blank(item_id: ItemId) -> Self {
        Self { item_id, width: None, height: None, fabric_type: None, line_price: None }
    }

    pub fn dimension(&self, dimension: Dimension) -> Option<u32> {
        match dimension {
            Dimension::Width => self.width,
            Dimension::Height => self.height,
        }
    }

    pub fn has_any_dimension(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }

    pub fn has_both_dimensions(&self) -> bool {
        self.width.is_some() && self.height.is_some()
    }

    pub fn is_blank(&self) -> bool {
        !self.has_any_dimension()
    }

    /// Width, height and fabric, when all three are present.
    pub fn priceable(&self) -> Option<(u32, u32, FabricType)> {
        Some((self.width?, self.height?, self.fabric_type?))
    }

    pub fn apply(&mut self, update: ItemUpdate) {
        match update {
            ItemUpdate::Width(value) => self.width = value,
            ItemUpdate::Height(value) => self.height = value,
            ItemUpdate::FabricType(value) => self.fabric_type = value,
            ItemUpdate::LinePrice(value) => self.line_price = value,
        }
    }
}

/// A single-field write against a line item.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemUpdate {
    Width(Option<u32>),
    Height(Option<u32>),
    FabricType(Option<FabricType>),
    LinePrice(Option<Decimal>),
}

impl ItemUpdate {
    pub fn dimension(dimension: Dimension, value: Option<u32>) -> Self {
        match dimension {
            Dimension::Width => Self::Width(value),
            Dimension::Height => Self::Height(value),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_sum: Option<Decimal>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub summary: QuoteSummary,
}

impl Quote {
    /// A quote holding a single blank row.
    pub fn with_blank_row(item: LineItem) -> Self {
        Self { items: vec![item], summary: QuoteSummary::default() }
    }

    pub fn last_index(&self) -> usize {
        self.items.len().saturating_sub(1)
    }

    pub fn is_last(&self, index: usize) -> bool {
        !self.items.is_empty() && index == self.last_index()
    }

    /// Sum of every known line price; rows without a price count as zero.
    pub fn line_total(&self) -> Decimal {
        self.items.iter().filter_map(|item| item.line_price).sum()
    }
}
