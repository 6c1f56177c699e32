//! # Findex CLI
//!
//! Command-line host for the Findex location index.
//!
//! ## Commands
//!
//! - `findex index` - Scan the configured patterns once and report
//! - `findex query <text>` - Scan once and print ranked results
//! - `findex interactive` - Keep the index fresh in the background and answer queries from stdin
//! - `findex config` - Show the normalized configuration
//!
//! ## Example Usage
//!
//! ```bash
//! # Everything matching "report" under the configured patterns
//! findex query report
//!
//! # Live listing of a directory
//! findex query ~/Documents/
//!
//! # Line-by-line session with periodic rescans
//! findex interactive
//! ```

mod app;
mod commands;

use clap::{Parser, Subcommand};
use findex_core::ResolverKind;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Findex - find and open files, folders and places
#[derive(Parser)]
#[command(name = "findex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// How entries are resolved (metadata, path)
    #[arg(short, long, global = true, default_value = "metadata")]
    resolver: ResolverKind,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the configured patterns once
    Index,

    /// Search the index, or list a directory when given a path
    Query {
        /// Query text
        text: String,

        /// Maximum number of results to show
        #[arg(short, long, default_value = "100")]
        limit: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Answer queries read from stdin while rescanning in the background
    #[command(alias = "i")]
    Interactive {
        /// Maximum number of results to show per query
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show the normalized configuration and where it lives
    Config,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => findex_core::Config::default_config_path()?,
    };

    match cli.command {
        Commands::Index => commands::index::run(&config_path, cli.resolver),
        Commands::Query {
            text,
            limit,
            output,
        } => commands::query::run(&config_path, cli.resolver, &text, limit, output),
        Commands::Interactive { limit } => {
            commands::interactive::run(&config_path, cli.resolver, limit)
        }
        Commands::Config => commands::config::run(&config_path),
    }
}
