//! Cardspace CLI
//!
//! Command-line tools for local Cardspace workspaces.
//!
//! # Commands
//!
//! - `inspect` - Display card counts and storage details
//! - `verify` - Check that the workspace blob decodes and is consistent
//! - `export` - Write the workspace to a JSON snapshot file
//! - `import` - Replace the workspace with a JSON snapshot file
//! - `clear` - Remove every card

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Cardspace command-line workspace tools.
#[derive(Parser)]
#[command(name = "cardspace")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the workspace storage directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Storage key of the workspace blob
    #[arg(global = true, short, long, default_value = cardspace_core::DEFAULT_WORKSPACE_KEY)]
    key: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display card counts and storage details
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Check that the workspace blob decodes and is consistent
    Verify,

    /// Write the workspace to a JSON snapshot file
    Export {
        /// Output file
        output: PathBuf,
    },

    /// Replace the workspace with a JSON snapshot file
    Import {
        /// Snapshot file written by `export`
        input: PathBuf,
    },

    /// Remove every card
    Clear {
        /// Skip the confirmation check
        #[arg(short, long)]
        yes: bool,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Workspace path required for inspect")?;
            commands::inspect::run(&path, &cli.key, &format)?;
        }
        Commands::Verify => {
            let path = cli.path.ok_or("Workspace path required for verify")?;
            commands::verify::run(&path, &cli.key)?;
        }
        Commands::Export { output } => {
            let path = cli.path.ok_or("Workspace path required for export")?;
            commands::transfer::export(&path, &cli.key, &output)?;
        }
        Commands::Import { input } => {
            let path = cli.path.ok_or("Workspace path required for import")?;
            commands::transfer::import(&path, &cli.key, &input)?;
        }
        Commands::Clear { yes } => {
            let path = cli.path.ok_or("Workspace path required for clear")?;
            if !yes {
                return Err("Refusing to clear without --yes".into());
            }
            commands::transfer::clear(&path, &cli.key)?;
        }
        Commands::Version => {
            println!("Cardspace CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Cardspace Core v{}", cardspace_core::VERSION);
        }
    }

    Ok(())
}
