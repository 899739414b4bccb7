//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "logrig")]
#[command(version, about = "Inspect logrig presets, rotation expressions and config files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format instead of tables
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the built-in presets and their values
    Presets,

    /// Parse a rotation or retention expression
    Parse(ParseArgs),

    /// Show the file names a rotation produces for a logger
    Names(NamesArgs),

    /// Validate a config file (JSON, YAML or TOML)
    Check {
        /// Path to the config file
        file: PathBuf,
    },

    /// Prune rotated files according to a config file's retention
    Clean(CleanArgs),
}

#[derive(Args)]
pub struct ParseArgs {
    /// Expression, e.g. "10 MB", "friday at 18:00", "daily"
    pub expression: String,

    /// Parse as a retention expression ("7 days", "5 files")
    #[arg(long)]
    pub retention: bool,
}

#[derive(Args)]
pub struct NamesArgs {
    /// Rotation expression or preset
    pub rotation: String,

    /// Logger (component) name
    pub name: String,

    /// Start of the rotated period: "YYYY-MM-DD", "YYYY-MM-DD HH:MM" or
    /// "YYYY-MM-DDTHH:MM:SS" (default: now)
    #[arg(long)]
    pub at: Option<String>,

    /// Custom active file template
    #[arg(long)]
    pub active_name: Option<String>,

    /// Custom rotated file template
    #[arg(long)]
    pub rotated_name: Option<String>,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Path to the config file
    pub file: PathBuf,

    /// Logger names to clean (default: the file's `loggers`)
    #[arg(short, long = "name")]
    pub names: Vec<String>,
}
