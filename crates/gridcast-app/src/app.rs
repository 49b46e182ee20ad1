// One projection run: ingest, build the engine, emit results.

use crate::config::AppConfig;
use crate::{ingest, output};
use anyhow::Context;
use gridcast_core::engine::ProjectionEngine;
use gridcast_core::gamelog::{GameLogSource, InMemoryGameLogs};
use std::io::Write;
use std::sync::Arc;
use tracing::{info, warn};

/// Counts reported back to the caller after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub weekly_projected: usize,
    pub weekly_failed: usize,
    pub seasonal_projected: usize,
    pub seasonal_failed: usize,
    /// Week the weekly batch targeted, if one ran.
    pub week: Option<u8>,
}

/// Week to project when the config leaves it open: the week after the
/// latest logged week of the season, or week 1.
pub fn target_week(config: &AppConfig, source: &dyn GameLogSource) -> u8 {
    config.run.week.unwrap_or_else(|| {
        source
            .latest_week(config.run.season)
            .map_or(1, |w| w.saturating_add(1))
    })
}

/// Execute the configured run, writing JSON lines to `out`.
pub fn run<W: Write>(config: &AppConfig, out: &mut W) -> anyhow::Result<RunSummary> {
    let registry = config
        .scoring_registry()
        .context("failed to build scoring registry")?;

    let logs_path = config.game_logs_path();
    let logs = ingest::load_game_logs(&logs_path).context("failed to load game logs")?;
    let source = Arc::new(InMemoryGameLogs::new(logs));
    info!(
        "Game log source ready: {} logs, {} players",
        source.len(),
        source.player_count()
    );

    let week = target_week(config, source.as_ref());

    let mut engine = ProjectionEngine::new(
        source,
        &registry,
        &config.scoring_system,
        config.projection.clone(),
    )
    .context("failed to construct projection engine")?;

    if let Some(path) = config.availability_path() {
        if path.exists() {
            let signals = ingest::load_availability(&path).context("failed to load availability")?;
            engine = engine.with_availability(signals);
        } else {
            warn!("availability file {} not found, projecting without it", path.display());
        }
    }

    let mut summary = RunSummary::default();
    let season = config.run.season;

    if config.run.mode.includes_weekly() {
        let batch = engine.get_weekly_projections(week, season);
        output::write_weekly(out, &batch).context("failed to write weekly projections")?;
        summary.weekly_projected = batch.projections.len();
        summary.weekly_failed = batch.failures.len();
        summary.week = Some(week);
    }

    if config.run.mode.includes_seasonal() {
        let batch = engine.get_seasonal_projections(season);
        output::write_seasonal(out, &batch).context("failed to write seasonal projections")?;
        summary.seasonal_projected = batch.projections.len();
        summary.seasonal_failed = batch.failures.len();
    }

    out.flush().context("failed to flush output")?;
    info!("Run complete: {:?}", summary);
    Ok(summary)
}
