//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mediavault - content-addressed media blob storage
#[derive(Parser, Debug)]
#[command(name = "mediavault")]
#[command(about = "Content-addressed media blob storage", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to bundled, home and ./mediavault.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store a file, printing its hash, size and location
    Store {
        /// File to store ("-" reads standard input)
        file: PathBuf,
    },

    /// Print the storage path for a hash
    Path {
        /// Content hash
        hash: String,
    },

    /// Write a stored blob to standard output after verifying it
    Cat {
        /// Content hash
        hash: String,
    },

    /// Delete a stored blob
    Delete {
        /// Content hash
        hash: String,
    },

    /// Remove abandoned staging directories
    Sweep {
        /// Minimum age of a staging directory before it is removed
        #[arg(long, default_value = "86400")]
        older_than_secs: u64,
    },
}
