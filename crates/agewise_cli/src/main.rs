//! agewise CLI
//!
//! Command-line tools for planning compaction selections.
//!
//! # Commands
//!
//! - `plan` - Run one selection over a JSON table listing
//! - `validate` - Validate an option map for a selector
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use commands::SelectorKind;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// agewise command-line compaction planning tools.
#[derive(Parser)]
#[command(name = "agewise")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one selection over a JSON table listing
    Plan {
        /// Path to a JSON array of tables
        #[arg(short, long)]
        tables: PathBuf,

        /// GC horizon in seconds since the epoch
        #[arg(long)]
        horizon: i32,

        /// Selector to run
        #[arg(short, long, value_enum, default_value_t = SelectorKind::Aging)]
        selector: SelectorKind,

        /// Option as key=value (repeatable)
        #[arg(short = 'o', long = "option")]
        options: Vec<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Pin the clock to this many milliseconds since the epoch
        #[arg(long)]
        now_millis: Option<i64>,
    },

    /// Validate an option map
    Validate {
        /// Selector whose options are validated
        #[arg(short, long, value_enum, default_value_t = SelectorKind::Aging)]
        selector: SelectorKind,

        /// Option as key=value (repeatable)
        #[arg(short = 'o', long = "option")]
        options: Vec<String>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Plan {
            tables,
            horizon,
            selector,
            options,
            format,
            now_millis,
        } => {
            let options = commands::parse_options(&options)?;
            commands::plan::run(&tables, horizon, selector, &options, &format, now_millis)?;
        }
        Commands::Validate { selector, options } => {
            let options = commands::parse_options(&options)?;
            commands::validate::run(selector, &options)?;
        }
        Commands::Version => {
            println!("agewise CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("agewise core v{}", agewise_core::VERSION);
        }
    }

    Ok(())
}
