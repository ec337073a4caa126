//! Command line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Live environmental snapshots for Laguna municipalities
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the location catalog
    Locations {},
    /// Fetch one snapshot and print it
    Snapshot {
        /// Location id, e.g. `calamba`
        #[arg(short, long)]
        location: Option<String>,
        /// Print JSON instead of the summary
        #[arg(long)]
        json: bool,
    },
    /// Keep refreshing and print every new snapshot until Ctrl-C
    Watch {
        #[arg(short, long)]
        location: Option<String>,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
}
