//! Command-line configuration for the suite binary

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Fixture-based regression suite for numeric algorithm units
#[derive(Debug, Parser)]
#[command(name = "numsuite")]
#[command(about = "Generate and check golden fixtures for numeric algorithm units")]
pub struct Cli {
    /// Directory holding the fixture files
    #[arg(long, default_value = "fixtures")]
    pub fixture_dir: PathBuf,

    /// Base seed for all per-pair random sources
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Enable verbose output (full per-pair listing)
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every unit and snapshot its results as golden fixtures
    Generate {
        /// Only units whose name contains this substring
        #[arg(long)]
        units: Option<String>,
    },

    /// Run every unit against its stored fixtures
    Test {
        /// Only units whose name contains this substring
        #[arg(long)]
        units: Option<String>,

        /// Save the full JSON report to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },
}
