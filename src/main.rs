//! Entry point wiring CLI dispatch to pipeline modules.

use anyhow::Result;
use readout_calendar::{cli::Cli, config::Settings, logging};
use tracing::{info, instrument};

#[tokio::main]
#[instrument]
async fn main() -> Result<()> {
    logging::init_tracing()?;
    let cli = Cli::parse();
    let settings = Settings::load()?;

    info!(?cli, "starting command");
    cli.dispatch(settings).await
}
