pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::catalog::CatalogCommand;
use commands::memo::MemoCommand;
use commands::rules::RulesCommand;
use commands::sync::SyncCommand;
use quotedesk_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "quotedesk",
    about = "QuoteDesk device configuration CLI",
    long_about = "Inspect and edit the catalog, sales rules and reference documents stored on this device, and move them between devices.",
    after_help = "Examples:\n  quotedesk show\n  quotedesk catalog plans mw-1 36 60\n  quotedesk memo add april-promo.pdf\n  quotedesk sync export\n  quotedesk reset --yes"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Print the resolved working configuration")]
    Show,
    #[command(subcommand, about = "Edit the product catalog")]
    Catalog(CatalogCommand),
    #[command(subcommand, about = "Show or replace the sales rule text")]
    Rules(RulesCommand),
    #[command(subcommand, about = "Manage reference documents")]
    Memo(MemoCommand),
    #[command(subcommand, about = "Export or import the configuration between devices")]
    Sync(SyncCommand),
    #[command(about = "Discard every device customization and return to the shipped defaults")]
    Reset {
        #[arg(long, help = "Confirm the reset")]
        yes: bool,
    },
    #[command(about = "Build the pricing request for an order form stored as JSON")]
    QuoteRequest {
        #[arg(long)]
        order: PathBuf,
    },
}

/// `RUST_LOG` directives when present and valid, otherwise the configured
/// level.
fn log_filter(rust_log: Option<String>, level: &str) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn init_logging() {
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), &config.logging.level);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Show => commands::show::run(),
        Command::Catalog(command) => commands::catalog::run(command),
        Command::Rules(command) => commands::rules::run(command),
        Command::Memo(command) => commands::memo::run(command),
        Command::Sync(command) => commands::sync::run(command),
        Command::Reset { yes } => commands::reset::run(yes),
        Command::QuoteRequest { order } => commands::quote_request::run(&order),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
