use rust_decimal::Decimal;

use crate::domain::product::{ProductKind, ValidationRule, ValidationRules};
use crate::domain::quote::{ItemId, LineItem};
use crate::pricing::{PriceLookupError, PriceMatrix};

/// Per-product validation bounds, blank-row template and pricing.
pub trait ProductRules: Send + Sync {
    fn kind(&self) -> ProductKind;

    fn validation_rules(&self) -> &ValidationRules;

    fn initial_item(&self) -> LineItem;

    /// Prices one item against the matrix for its fabric. A missing matrix or a size outside the
    /// matrix is reported through the error, never raised.
    fn calculate_price(
        &self,
        item: &LineItem,
        matrix: Option<&PriceMatrix>,
    ) -> Result<Decimal, PriceLookupError>;
}

#[derive(Clone, Debug)]
pub struct RollerBlindRules {
    validation: ValidationRules,
}

impl RollerBlindRules {
    pub fn new(validation: ValidationRules) -> Self {
        Self { validation }
    }
}

impl Default for RollerBlindRules {
    fn default() -> Self {
        Self::new(ValidationRules {
            width: ValidationRule::new(1, 3300, "Width"),
            height: ValidationRule::new(1, 3300, "Height"),
        })
    }
}

impl ProductRules for RollerBlindRules {
    fn kind(&self) -> ProductKind {
        ProductKind::RollerBlind
    }

    fn validation_rules(&self) -> &ValidationRules {
        &self.validation
    }

    fn initial_item(&self) -> LineItem {
        LineItem::blank(ItemId::generate())
    }

    fn calculate_price(
        &self,
        item: &LineItem,
        matrix: Option<&PriceMatrix>,
    ) -> Result<Decimal, PriceLookupError> {
        let (width, height, fabric) = item.priceable().ok_or(PriceLookupError::Incomplete)?;
        let matrix = matrix.ok_or(PriceLookupError::MissingMatrix { fabric })?;

        matrix.price_for(width, height).ok_or(PriceLookupError::OutOfRange {
            fabric,
            width,
            height,
            max_width: matrix.max_width(),
            max_drop: matrix.max_drop(),
        })
    }
}

/// Resolves the rules for a product kind.
#[derive(Clone, Debug, Default)]
pub struct ProductCatalog {
    roller_blind: RollerBlindRules,
}

impl ProductCatalog {
    pub fn new(roller_blind: RollerBlindRules) -> Self {
        Self { roller_blind }
    }

    pub fn rules(&self, kind: ProductKind) -> &dyn ProductRules {
        match kind {
            ProductKind::RollerBlind => &self.roller_blind,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{ProductCatalog, ProductRules, RollerBlindRules};
    use crate::domain::product::{Dimension, ProductKind};
    use crate::domain::quote::{FabricType, ItemId, LineItem};
    use crate::pricing::{PriceLookupError, PriceMatrix};

    fn matrix() -> PriceMatrix {
        PriceMatrix::new(vec![1000], vec![2000], vec![vec![Decimal::from(140)]]).expect("matrix")
    }

    fn item(width: u32, height: u32, fabric: Option<FabricType>) -> LineItem {
        LineItem {
            width: Some(width),
            height: Some(height),
            fabric_type: fabric,
            ..LineItem::blank(ItemId("item-1".to_string()))
        }
    }

    #[test]
    fn catalog_returns_roller_blind_rules() {
        let catalog = ProductCatalog::default();
        let rules = catalog.rules(ProductKind::RollerBlind);
        assert_eq!(rules.kind(), ProductKind::RollerBlind);
        assert_eq!(rules.validation_rules().rule_for(Dimension::Width).display_name, "Width");
    }

    #[test]
    fn initial_items_are_blank_with_fresh_ids() {
        let rules = RollerBlindRules::default();
        let first = rules.initial_item();
        let second = rules.initial_item();
        assert!(first.is_blank());
        assert_eq!(first.fabric_type, None);
        assert_eq!(first.line_price, None);
        assert_ne!(first.item_id, second.item_id);
    }

    #[test]
    fn price_comes_from_matching_cell() {
        let rules = RollerBlindRules::default();
        let price = rules.calculate_price(&item(800, 1900, Some(FabricType::Bo)), Some(&matrix()));
        assert_eq!(price, Ok(Decimal::from(140)));
    }

    #[test]
    fn missing_coverage_is_reported_not_raised() {
        let rules = RollerBlindRules::default();
        let error = rules
            .calculate_price(&item(1200, 1900, Some(FabricType::Sn)), Some(&matrix()))
            .expect_err("width beyond matrix");
        assert!(matches!(error, PriceLookupError::OutOfRange { width: 1200, .. }));
        assert!(error.to_string().contains("SN"));

        let error = rules
            .calculate_price(&item(800, 1900, Some(FabricType::Bo1)), None)
            .expect_err("no matrix");
        assert_eq!(error, PriceLookupError::MissingMatrix { fabric: FabricType::Bo1 });

        let error =
            rules.calculate_price(&item(800, 1900, None), Some(&matrix())).expect_err("no fabric");
        assert_eq!(error, PriceLookupError::Incomplete);
    }
}
