//! CLI entry-point for building the readout calendar.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Args as ClapArgs;
use tracing::{info, instrument};

use crate::{
    calendar::{
        assemble::{assemble, Window},
        ics,
        snapshot::Snapshot,
    },
    config::Settings,
    data::{self, http::CachedHttp, RegistrySource},
};

/// Args for the `build` sub-command.
#[derive(Debug, Clone, ClapArgs)]
pub struct Args {
    /// Read holdings from a local xlsx instead of downloading them.
    #[arg(long)]
    pub holdings: Option<PathBuf>,
    /// Anchor date for the windows (defaults to today, UTC).
    #[arg(long)]
    pub today: Option<NaiveDate>,
    /// Override the forward readout window in months.
    #[arg(long)]
    pub window_months: Option<u32>,
    /// Override the recently-posted results window in days.
    #[arg(long)]
    pub recent_days: Option<i64>,
    /// Subjects processed at once.
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,
}

#[instrument(skip(settings))]
pub async fn run(args: Args, settings: Settings) -> Result<()> {
    settings.ensure_dirs()?;
    let today = args.today.unwrap_or_else(|| Utc::now().date_naive());
    let window = Window::new(
        today,
        args.window_months.unwrap_or(settings.window_months),
        args.recent_days.unwrap_or(settings.recent_results_days),
    );
    let overrides = data::overrides::load_overrides(&settings.overrides_path());

    info!("fetching holdings");
    let subjects = match &args.holdings {
        Some(path) => data::holdings::load_holdings_file(path),
        None => {
            let http = CachedHttp::new(&settings)?;
            data::holdings::fetch_holdings(
                &http,
                &settings.holdings_url,
                &settings.cache_dir().join("holdings.xlsx"),
            )
            .await
        }
    }
    .context("loading holdings")?;
    info!(count = subjects.len(), "holdings loaded");

    let source = RegistrySource::new(&settings)?;
    let ctgov_data_timestamp = source.ctgov.data_timestamp().await;

    let events = assemble(&source, &subjects, &overrides, &window, args.concurrency).await;

    let generated_at = Utc::now();
    let calendar_path = settings.calendar_path();
    std::fs::write(&calendar_path, ics::render(&events, generated_at))
        .with_context(|| format!("write {calendar_path:?}"))?;

    let snapshot = Snapshot {
        generated_at,
        ctgov_data_timestamp,
        window_start: window.today,
        window_end: window.end,
        events,
    };
    snapshot.write(&settings.snapshot_path())?;

    info!(
        events = snapshot.events.len(),
        path = %calendar_path.display(),
        "wrote calendar"
    );
    Ok(())
}
