//! Command line interface

pub mod commands;

use clap::{Parser, Subcommand};

use commands::export::ExportArgs;
use commands::plan::{SeedArgs, SplitArgs};

#[derive(Parser, Debug)]
#[command(name = "orgseed")]
#[command(about = "Export related org records as a replayable seed dataset")]
#[command(version)]
pub struct Cli {
    /// Log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter for the requested verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export records and a data plan for the given objects
    Export(ExportArgs),

    /// Split data files over the importer's record limit into chunks
    Split(SplitArgs),

    /// Add a seed file for a self-referencing object to a plan
    Seed(SeedArgs),
}
