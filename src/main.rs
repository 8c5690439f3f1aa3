mod account;
mod app;
mod asset;
mod cli;
mod config;
mod consts;
mod error;
mod http;
mod output;
mod predict;
mod state;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use account::SessionStore;
use app::CommandContext;
use cli::Cli;
use config::Config;

/// Logs go to stderr; FITCHECK_LOG_FORMAT=json switches to machine-readable lines.
fn init_tracing(debug: bool) {
    let default_filter = if debug { "fitcheck=debug" } else { "fitcheck=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let json = std::env::var("FITCHECK_LOG_FORMAT").is_ok_and(|v| v == "json");
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = Config::load();
    let cli = cli.with_config(&config);

    let ctx = CommandContext {
        cli: &cli,
        config: &config,
        sessions: SessionStore::in_dir(&Config::state_dir()),
    };

    if let Err(e) = app::run(&ctx) {
        tracing::debug!(error = ?e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
