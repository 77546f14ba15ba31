use rust_decimal::Decimal;

use crate::domain::quote::{ItemId, ItemUpdate, LineItem, Quote};

/// Owns the quote and its ordered line items.
///
/// Operations are structural only: no validation, no events. Policy lives in the orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub struct QuoteStore {
    quote: Quote,
}

impl Default for QuoteStore {
    fn default() -> Self {
        Self::new(Quote::with_blank_row(LineItem::blank(ItemId::generate())))
    }
}

impl QuoteStore {
    pub fn new(mut quote: Quote) -> Self {
        ensure_not_empty(&mut quote);
        Self { quote }
    }

    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    pub fn items(&self) -> &[LineItem] {
        &self.quote.items
    }

    pub fn item(&self, index: usize) -> Option<&LineItem> {
        self.quote.items.get(index)
    }

    pub fn len(&self) -> usize {
        self.quote.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quote.items.is_empty()
    }

    /// Inserts before `index`; an index past the end appends.
    pub fn insert_item(&mut self, index: usize, item: LineItem) {
        let index = index.min(self.quote.items.len());
        self.quote.items.insert(index, item);
    }

    /// Removes the row at `index`, then appends a fresh blank row if nothing is left.
    pub fn delete_item(&mut self, index: usize) -> Option<LineItem> {
        let removed =
            (index < self.quote.items.len()).then(|| self.quote.items.remove(index));
        ensure_not_empty(&mut self.quote);
        removed
    }

    /// Returns `false` when `index` is out of range and nothing was written.
    pub fn update_item_value(&mut self, index: usize, update: ItemUpdate) -> bool {
        match self.quote.items.get_mut(index) {
            Some(item) => {
                item.apply(update);
                true
            }
            None => false,
        }
    }

    pub fn set_total(&mut self, value: Decimal) {
        self.quote.summary.total_sum = Some(value);
    }

    pub fn clear_total(&mut self) {
        self.quote.summary.total_sum = None;
    }

    pub fn replace_quote(&mut self, mut quote: Quote) {
        ensure_not_empty(&mut quote);
        self.quote = quote;
    }
}

fn ensure_not_empty(quote: &mut Quote) {
    if quote.items.is_empty() {
        quote.items.push(LineItem::blank(ItemId::generate()));
    }
}
