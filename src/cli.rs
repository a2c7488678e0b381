//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// shorturl - short-link generation and redirect service
#[derive(Parser, Debug)]
#[command(name = "shorturl")]
#[command(version)]
#[command(about = "Short-link generation and redirect service", long_about = None)]
pub struct Cli {
    /// Configuration file path (TOML)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Print a sample configuration with every default filled in
    GenConfig {
        /// Write to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<String>,
    },
}
