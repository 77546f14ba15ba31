use tracing::{debug, info};

use crate::domain::product::{Dimension, ProductKind};
use crate::domain::quote::{FabricType, ItemUpdate};
use crate::events::{EventBus, Notification, OutboundEvent};
use crate::flows::intents::{Intent, Key, TableColumn};
use crate::flows::state::{ActiveCell, StateSnapshot, UiState};
use crate::persistence::{PersistenceGateway, QuoteStorage};
use crate::pricing::PriceMatrixSource;
use crate::rules::ProductCatalog;
use crate::store::QuoteStore;

pub const SELECT_ROW_BEFORE_INSERT: &str =
    "Please select a row by clicking its number before inserting.";
pub const SELECT_ROW_BEFORE_DELETE: &str =
    "Please select a row by clicking its number before deleting.";
pub const CANNOT_INSERT_AFTER_EMPTY_ROW: &str = "Cannot insert after the final empty row.";
pub const CANNOT_DELETE_EMPTY_ROW: &str = "Cannot delete the final empty row.";
pub const QUOTE_SAVED: &str = "Quote saved successfully!";
pub const QUOTE_SAVE_FAILED: &str = "Error: Could not save quote.";
pub const QUOTE_LOADED: &str = "Quote loaded successfully!";
pub const NO_SAVED_QUOTE: &str = "No saved quote found.";
pub const QUOTE_LOAD_FAILED: &str = "Error: Could not load quote.";

/// Whether handling an intent produced a state snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    Published,
    Unpublished,
}

/// Result of one handler: the replacement UI state and whether to publish it.
struct Step {
    ui: UiState,
    disposition: Disposition,
}

impl Step {
    fn publish(ui: UiState) -> Self {
        Self { ui, disposition: Disposition::Published }
    }

    fn silent(ui: UiState) -> Self {
        Self { ui, disposition: Disposition::Unpublished }
    }
}

/// Owns the interaction state and funnels every mutation of the quote.
///
/// Each intent is reduced to exactly one replacement [`UiState`] plus a disposition; the
/// dispatcher publishes at most one snapshot per intent. Notifications are published as they
/// arise, ahead of the snapshot.
pub struct QuoteOrchestrator<S, P> {
    store: QuoteStore,
    catalog: ProductCatalog,
    gateway: PersistenceGateway<S>,
    prices: P,
    bus: EventBus,
    ui: UiState,
}

impl<S, P> QuoteOrchestrator<S, P>
where
    S: QuoteStorage,
    P: PriceMatrixSource,
{
    pub fn new(
        store: QuoteStore,
        catalog: ProductCatalog,
        gateway: PersistenceGateway<S>,
        prices: P,
        bus: EventBus,
    ) -> Self {
        info!(
            event_name = "quote.orchestrator.initialized",
            line_items = store.len(),
            subscribers = bus.subscriber_count(),
            "quote orchestrator initialized"
        );
        Self { store, catalog, gateway, prices, bus, ui: UiState::default() }
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn store(&self) -> &QuoteStore {
        &self.store
    }

    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot { ui: self.ui.clone(), quote_data: self.store.quote().clone() }
    }

    /// Publishes the current state without handling an intent, e.g. for the first render.
    pub fn publish_current(&self) {
        self.bus.publish(OutboundEvent::StateChanged(self.snapshot()));
    }

    pub fn dispatch(&mut self, product: ProductKind, intent: Intent) -> Disposition {
        let intent_name = intent.name();
        let current = self.ui.clone();

        let step = match intent {
            Intent::NumericKeyPressed { key } => self.handle_key(product, current, key),
            Intent::TableCellClicked { row_index, column } => {
                self.handle_cell_click(current, row_index, column)
            }
            Intent::TableHeaderClicked { column } => self.handle_header_click(current, column),
            Intent::SequenceCellClicked { row_index } => {
                self.handle_sequence_click(current, row_index)
            }
            Intent::InsertRowRequested => self.handle_insert_row(product, current),
            Intent::DeleteRowRequested => self.handle_delete_row(current),
            Intent::PriceCalculationRequested => self.handle_price_calculation(product, current),
            Intent::SummationRequested => self.handle_summation(current),
            Intent::SaveRequested => self.handle_save(current),
            Intent::LoadRequested => self.handle_load(current),
        };

        self.ui = step.ui;
        if step.disposition == Disposition::Published {
            self.publish_current();
        }

        debug!(
            event_name = "quote.intent.handled",
            intent = intent_name,
            product = ?product,
            published = step.disposition == Disposition::Published,
            active_row = self.ui.active_cell.row_index,
            line_items = self.store.len(),
            "intent handled"
        );
        step.disposition
    }

    fn notify(&self, notification: Notification) {
        debug!(
            event_name = "quote.notification.raised",
            message = %notification.message,
            "notification raised"
        );
        self.bus.publish(OutboundEvent::ShowNotification(notification));
    }

    fn handle_key(&mut self, product: ProductKind, ui: UiState, key: Key) -> Step {
        match key {
            Key::Digit(digit) => {
                let mut input_value = ui.input_value;
                input_value.push(char::from(b'0' + digit));
                Step::publish(UiState { input_value, ..ui })
            }
            Key::Delete => {
                let mut input_value = ui.input_value;
                input_value.pop();
                Step::publish(UiState { input_value, ..ui })
            }
            Key::Width => self.switch_mode(ui, Dimension::Width),
            Key::Height => self.switch_mode(ui, Dimension::Height),
            Key::Enter => self.commit_value(product, ui),
            Key::Other(_) => Step::publish(ui),
        }
    }

    fn commit_value(&mut self, product: ProductKind, ui: UiState) -> Step {
        let mode = ui.input_mode;
        let rule = self.catalog.rules(product).validation_rules().rule_for(mode).clone();

        let value = if ui.input_value.is_empty() {
            None
        } else {
            match ui.input_value.parse::<u32>() {
                Ok(value) if rule.accepts(value) => Some(value),
                _ => {
                    self.notify(Notification::info(rule.violation_message()));
                    return Step::publish(UiState { input_value: String::new(), ..ui });
                }
            }
        };

        let row = ui.active_cell.row_index;
        self.store.update_item_value(row, ItemUpdate::dimension(mode, value));
        if value.is_none() {
            self.store.update_item_value(row, ItemUpdate::LinePrice(None));
        }

        if !ui.is_editing {
            let filled_last_row = self.store.quote().is_last(row)
                && self.store.item(row).is_some_and(|item| item.has_any_dimension());
            if filled_last_row {
                let template = self.catalog.rules(product).initial_item();
                self.store.insert_item(self.store.len(), template);
            }
        }

        self.switch_mode(UiState { input_value: String::new(), is_editing: false, ..ui }, mode)
    }

    fn switch_mode(&self, ui: UiState, mode: Dimension) -> Step {
        let row_index = self
            .store
            .items()
            .iter()
            .position(|item| item.dimension(mode).is_none())
            .unwrap_or_else(|| self.store.quote().last_index());

        Step::publish(UiState {
            input_mode: mode,
            is_editing: false,
            selected_row_index: None,
            active_cell: ActiveCell { row_index, column: mode },
            ..ui
        })
    }

    fn handle_cell_click(&mut self, ui: UiState, row_index: usize, column: TableColumn) -> Step {
        let ui = UiState { selected_row_index: None, ..ui };
        let Some(item) = self.store.item(row_index).cloned() else {
            return Step::silent(ui);
        };

        if let Some(dimension) = column.dimension() {
            let input_value =
                item.dimension(dimension).map(|value| value.to_string()).unwrap_or_default();
            return Step::publish(UiState {
                input_mode: dimension,
                active_cell: ActiveCell { row_index, column: dimension },
                is_editing: true,
                input_value,
                ..ui
            });
        }

        if column == TableColumn::Type && item.has_both_dimensions() {
            let next = FabricType::cycle_from(item.fabric_type);
            self.store.update_item_value(row_index, ItemUpdate::FabricType(Some(next)));
        }
        Step::publish(ui)
    }

    fn handle_sequence_click(&self, ui: UiState, row_index: usize) -> Step {
        if self.store.item(row_index).is_none() {
            return Step::silent(ui);
        }
        let selected_row_index =
            if ui.selected_row_index == Some(row_index) { None } else { Some(row_index) };
        Step::publish(UiState { selected_row_index, ..ui })
    }

    fn handle_header_click(&mut self, ui: UiState, column: TableColumn) -> Step {
        if column != TableColumn::Type {
            return Step::silent(ui);
        }

        // The first dimensioned row sets the pace for every dimensioned row.
        let current = self
            .store
            .items()
            .iter()
            .find(|item| item.has_any_dimension())
            .and_then(|item| item.fabric_type);
        let next = FabricType::cycle_from(current);

        let dimensioned: Vec<usize> = self
            .store
            .items()
            .iter()
            .enumerate()
            .filter(|(_, item)| item.has_any_dimension())
            .map(|(index, _)| index)
            .collect();
        for index in dimensioned {
            self.store.update_item_value(index, ItemUpdate::FabricType(Some(next)));
        }

        Step::publish(ui)
    }

    fn selected_row(&self, ui: &UiState) -> Option<usize> {
        ui.selected_row_index.filter(|index| *index < self.store.len())
    }

    fn is_trailing_blank(&self, index: usize) -> bool {
        self.store.quote().is_last(index) && self.store.item(index).is_some_and(|item| item.is_blank())
    }

    fn handle_insert_row(&mut self, product: ProductKind, ui: UiState) -> Step {
        let Some(selected) = self.selected_row(&ui) else {
            self.notify(Notification::info(SELECT_ROW_BEFORE_INSERT));
            return Step::silent(ui);
        };
        if self.is_trailing_blank(selected) {
            self.notify(Notification::info(CANNOT_INSERT_AFTER_EMPTY_ROW));
            return Step::silent(ui);
        }

        let template = self.catalog.rules(product).initial_item();
        self.store.insert_item(selected + 1, template);

        let mut active_cell = ui.active_cell;
        if active_cell.row_index > selected {
            active_cell.row_index += 1;
        }
        Step::publish(UiState { selected_row_index: None, active_cell, ..ui })
    }

    fn handle_delete_row(&mut self, ui: UiState) -> Step {
        let Some(selected) = self.selected_row(&ui) else {
            self.notify(Notification::info(SELECT_ROW_BEFORE_DELETE));
            return Step::silent(ui);
        };
        if self.is_trailing_blank(selected) {
            self.notify(Notification::info(CANNOT_DELETE_EMPTY_ROW));
            return Step::silent(ui);
        }

        self.store.delete_item(selected);

        let mut active_cell = ui.active_cell;
        if active_cell.row_index > selected {
            active_cell.row_index -= 1;
        }
        active_cell.row_index = active_cell.row_index.min(self.store.quote().last_index());
        Step::publish(UiState { selected_row_index: None, active_cell, ..ui })
    }

    fn handle_price_calculation(&mut self, product: ProductKind, ui: UiState) -> Step {
        let rules = self.catalog.rules(product);
        let outcomes: Vec<_> = self
            .store
            .items()
            .iter()
            .enumerate()
            .filter_map(|(index, item)| {
                let (_, _, fabric) = item.priceable()?;
                let matrix = self.prices.price_matrix(fabric);
                Some((index, item.line_price, rules.calculate_price(item, matrix)))
            })
            .collect();

        let mut changed = false;
        for (index, previous, outcome) in outcomes {
            match outcome {
                Ok(price) => {
                    if previous != Some(price) {
                        self.store.update_item_value(index, ItemUpdate::LinePrice(Some(price)));
                        changed = true;
                    }
                }
                Err(error) => {
                    debug!(
                        event_name = "quote.pricing.row_uncovered",
                        row = index,
                        error = %error,
                        "line item could not be priced"
                    );
                    self.notify(Notification::info(error.to_string()));
                }
            }
        }

        if changed {
            Step::publish(ui)
        } else {
            Step::silent(ui)
        }
    }

    fn handle_summation(&mut self, ui: UiState) -> Step {
        let total = self.store.quote().line_total();
        self.store.set_total(total);
        Step::publish(ui)
    }

    fn handle_save(&self, ui: UiState) -> Step {
        match self.gateway.save(self.store.quote()) {
            Ok(()) => self.notify(Notification::info(QUOTE_SAVED)),
            Err(_) => self.notify(Notification::error(QUOTE_SAVE_FAILED)),
        }
        Step::silent(ui)
    }

    fn handle_load(&mut self, ui: UiState) -> Step {
        match self.gateway.load() {
            Ok(Some(quote)) => {
                self.store.replace_quote(quote);
                self.notify(Notification::info(QUOTE_LOADED));
                let mode = ui.input_mode;
                self.switch_mode(UiState { input_value: String::new(), ..ui }, mode)
            }
            Ok(None) => {
                self.notify(Notification::info(NO_SAVED_QUOTE));
                Step::silent(ui)
            }
            Err(_) => {
                self.notify(Notification::error(QUOTE_LOAD_FAILED));
                Step::silent(ui)
            }
        }
    }
}
