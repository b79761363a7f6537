//! Command-line interface wiring for readout-calendar.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Settings;

pub mod build;
pub mod resolve;
pub mod serve;

/// Top-level CLI definition.
#[derive(Debug, Parser)]
#[command(author, version, about = "Clinical readout calendar for biotech holdings", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Parse CLI arguments from the environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Dispatch the selected sub-command.
    pub async fn dispatch(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Build(args) => build::run(args, settings).await,
            Commands::Resolve(args) => resolve::run(args),
            Commands::Serve(args) => serve::run(args, settings).await,
        }
    }
}

/// Supported sub-commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch holdings and registry data, then write the calendar and snapshot.
    Build(build::Args),
    /// Show how partial registry dates resolve.
    Resolve(resolve::Args),
    /// Serve the generated calendar and snapshot over HTTP.
    Serve(serve::Args),
}
