//! logrig CLI - inspect presets, rotation expressions and config files

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    output::set_json_mode(cli.json);

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("logrig={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();

    // LOGRIG_* overrides may live in a .env file
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!("Failed to load .env: {}", e);
        }
    }

    let result = match cli.command {
        Commands::Presets => presets::execute(),
        Commands::Parse(args) => parse::execute(args),
        Commands::Names(args) => names::execute(args),
        Commands::Check { file } => check::execute(&file),
        Commands::Clean(args) => clean::execute(args),
    };

    if let Err(e) = result {
        output::print_error_json(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
