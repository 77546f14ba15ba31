pub mod commands;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use blindquote_core::config::{LogFormat, LoggingConfig};
use blindquote_core::ProductKind;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "blindquote",
    about = "Blindquote quick-quote CLI",
    long_about = "Drive a roller-blind quote session from JSON-line intents, inspect configuration, and check readiness.",
    after_help = "Examples:\n  blindquote session --script intents.jsonl\n  blindquote config\n  blindquote doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Dispatch JSON-line intents (stdin or --script) and print each outbound event as JSON"
    )]
    Session {
        #[arg(long, help = "Read intents from this file instead of stdin")]
        script: Option<PathBuf>,
        #[arg(long, default_value = "roller-blind", help = "Product kind to quote")]
        product: ProductKind,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, price book and quote storage readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Session { script, product } => {
            commands::session::run(commands::session::SessionOptions { script, product })
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber. Logs go to stderr so stdout stays machine-readable.
pub fn init_logging(logging: &LoggingConfig) {
    let filter = log_filter(&logging.level, env::var("RUST_LOG").ok().as_deref());
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        tracing::debug!(event_name = "cli.logging.already_installed", "subscriber already set");
    }
}

/// `RUST_LOG` directives win over the configured level when they parse.
fn log_filter(level: &str, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level))
}
