use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use blindquote_core::config::{AppConfig, LoadOptions};
use blindquote_core::{
    ApplicationError, Disposition, EventBus, InMemoryEventSink, Intent, PersistenceGateway,
    PriceBook, ProductCatalog, ProductKind, Quote, QuoteOrchestrator, QuoteStore,
    RollerBlindRules,
};
use blindquote_db::RepositoryQuoteStorage;
use tracing::{debug, info, warn};

use super::CommandResult;

const COMMAND: &str = "session";

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub script: Option<PathBuf>,
    pub product: ProductKind,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub dispatched: usize,
    pub published: usize,
    pub skipped: usize,
}

impl fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dispatched {} intents ({} published, {} skipped)",
            self.dispatched, self.published, self.skipped
        )
    }
}

/// Loads configuration once, installs logging from it, then runs the session.
pub fn run(options: SessionOptions) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return CommandResult::from_error(COMMAND, &ApplicationError::from(error)),
    };
    crate::init_logging(&config.logging);
    run_with_config(&config, options)
}

pub fn run_with_config(config: &AppConfig, options: SessionOptions) -> CommandResult {
    let stdout = io::stdout();
    let result = match &options.script {
        Some(path) => File::open(path)
            .map_err(|error| {
                ApplicationError::InvalidInput(format!(
                    "could not open script `{}`: {error}",
                    path.display()
                ))
            })
            .and_then(|file| {
                run_with_io(config, options.product, BufReader::new(file), stdout.lock())
            }),
        None => run_with_io(config, options.product, io::stdin().lock(), stdout.lock()),
    };

    match result {
        Ok(summary) => CommandResult::success(COMMAND, summary.to_string()),
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

/// Replays JSON-line intents from `input` against a fresh orchestrator, writing every outbound
/// event to `output` as one JSON line. The first line is always the initial snapshot.
///
/// Blank lines and lines starting with `#` are ignored. Lines that do not parse as an intent are
/// logged and skipped.
pub fn run_with_io<R, W>(
    config: &AppConfig,
    product: ProductKind,
    input: R,
    mut output: W,
) -> Result<SessionSummary, ApplicationError>
where
    R: BufRead,
    W: Write,
{
    let prices = PriceBook::from_path_or_default(config.pricing.matrix_path.as_deref())?;
    let storage = RepositoryQuoteStorage::open(&config.storage)
        .map_err(|error| ApplicationError::Storage(error.to_string()))?;

    let catalog = ProductCatalog::new(RollerBlindRules::new(config.rules.validation_rules()));
    let initial = Quote::with_blank_row(catalog.rules(product).initial_item());

    let sink = InMemoryEventSink::default();
    let mut bus = EventBus::default();
    bus.subscribe(Arc::new(sink.clone()));

    let mut orchestrator = QuoteOrchestrator::new(
        QuoteStore::new(initial),
        catalog,
        PersistenceGateway::new(storage, config.storage.slot_key.clone()),
        prices,
        bus,
    );
    orchestrator.publish_current();
    drain_events(&sink, &mut output)?;

    let mut summary = SessionSummary::default();
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let intent = match serde_json::from_str::<Intent>(trimmed) {
            Ok(intent) => intent,
            Err(error) => {
                warn!(
                    event_name = "cli.session.intent_rejected",
                    line = index + 1,
                    error = %error,
                    "skipping malformed intent"
                );
                summary.skipped += 1;
                continue;
            }
        };

        summary.dispatched += 1;
        if orchestrator.dispatch(product, intent) == Disposition::Published {
            summary.published += 1;
        }
        drain_events(&sink, &mut output)?;
    }
    output.flush()?;

    info!(
        event_name = "cli.session.finished",
        dispatched = summary.dispatched,
        published = summary.published,
        skipped = summary.skipped,
        "session finished"
    );
    Ok(summary)
}

fn drain_events<W: Write>(sink: &InMemoryEventSink, output: &mut W) -> Result<(), ApplicationError> {
    for event in sink.events() {
        debug!(event_name = "cli.session.event_written", topic = event.topic(), "event written");
        serde_json::to_writer(&mut *output, &event).map_err(io::Error::from)?;
        writeln!(output)?;
    }
    sink.clear();
    Ok(())
}
