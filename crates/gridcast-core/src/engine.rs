// Projection engine: roster iteration, per-player fan-out, ranking.

use crate::availability::{AvailabilityBoard, AvailabilityDecision, AvailabilitySignal};
use crate::config::ProjectionSettings;
use crate::error::ProjectionError;
use crate::features::FeatureBuilder;
use crate::gamelog::{GameLogSource, Position, WeekCursor};
use crate::scoring::{ScoringRegistry, ScoringSystem};
use crate::seasonal::{SeasonalModel, SeasonalProjection};
use crate::variance::league_points_variance;
use crate::weekly::{WeeklyModel, WeeklyProjection};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Batch results
// ---------------------------------------------------------------------------

/// A player the engine could not project, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerFailure {
    pub player_id: String,
    pub error: ProjectionError,
}

/// Successful records (ranked) plus per-player failures (by player id).
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionBatch<T> {
    pub projections: Vec<T>,
    pub failures: Vec<PlayerFailure>,
}

impl<T> ProjectionBatch<T> {
    pub fn len(&self) -> usize {
        self.projections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.player_id.as_str()).collect()
    }
}

/// Records that can be ranked by estimate.
pub trait Ranked {
    fn player_id(&self) -> &str;
    fn projected_points(&self) -> f64;
}

impl Ranked for WeeklyProjection {
    fn player_id(&self) -> &str {
        &self.player_id
    }
    fn projected_points(&self) -> f64 {
        self.projected_points
    }
}

impl Ranked for SeasonalProjection {
    fn player_id(&self) -> &str {
        &self.player_id
    }
    fn projected_points(&self) -> f64 {
        self.projected_points
    }
}

/// Estimate descending, then player id ascending.
pub fn rank<T: Ranked>(records: &mut [T]) {
    records.sort_by(|a, b| {
        b.projected_points()
            .total_cmp(&a.projected_points())
            .then_with(|| a.player_id().cmp(b.player_id()))
    });
}

// ---------------------------------------------------------------------------
// Roster filter
// ---------------------------------------------------------------------------

/// Restricts a batch to specific players and/or positions. Empty sets match
/// everything.
#[derive(Debug, Clone, Default)]
pub struct RosterFilter {
    pub player_ids: HashSet<String>,
    pub positions: HashSet<Position>,
}

impl RosterFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_players<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.player_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn with_positions(mut self, positions: impl IntoIterator<Item = Position>) -> Self {
        self.positions.extend(positions);
        self
    }

    /// A player with unknown position never matches a position filter.
    pub fn matches(&self, player_id: &str, position: Option<Position>) -> bool {
        let id_ok = self.player_ids.is_empty() || self.player_ids.contains(player_id);
        let pos_ok = self.positions.is_empty() || position.is_some_and(|p| self.positions.contains(&p));
        id_ok && pos_ok
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct ProjectionEngine {
    source: Arc<dyn GameLogSource>,
    system: ScoringSystem,
    settings: ProjectionSettings,
    availability: AvailabilityBoard,
    league_variance: Option<f64>,
}

impl ProjectionEngine {
    /// Resolve the scoring system and validate settings up front; either
    /// failure is fatal here rather than surfacing per player later.
    pub fn new(
        source: Arc<dyn GameLogSource>,
        registry: &ScoringRegistry,
        scoring_system: &str,
        settings: ProjectionSettings,
    ) -> Result<Self, ProjectionError> {
        let system = registry.get(scoring_system)?.clone();
        settings.validate()?;

        let league_variance = league_points_variance(source.as_ref(), &system);
        match league_variance {
            Some(v) => info!(
                "Projection engine ready: scoring={}, league per-game variance {:.2}",
                system.name, v
            ),
            None => warn!(
                "Projection engine ready: scoring={}, too few league games for a variance baseline, using fallback {}",
                system.name, settings.fallback_variance
            ),
        }

        Ok(Self {
            source,
            system,
            settings,
            availability: AvailabilityBoard::default(),
            league_variance,
        })
    }

    /// Attach externally supplied roster/injury statuses.
    pub fn with_availability(mut self, signals: impl IntoIterator<Item = AvailabilitySignal>) -> Self {
        self.availability = AvailabilityBoard::new(signals);
        self.availability.summary().log("engine");
        self
    }

    pub fn scoring_system(&self) -> &ScoringSystem {
        &self.system
    }

    pub fn settings(&self) -> &ProjectionSettings {
        &self.settings
    }

    pub fn availability(&self) -> &AvailabilityBoard {
        &self.availability
    }

    pub fn league_variance(&self) -> Option<f64> {
        self.league_variance
    }

    // -- Batch queries ------------------------------------------------------

    pub fn get_weekly_projections(&self, week: u8, season: u16) -> ProjectionBatch<WeeklyProjection> {
        self.get_weekly_projections_filtered(week, season, &RosterFilter::all())
    }

    pub fn get_weekly_projections_filtered(
        &self,
        week: u8,
        season: u16,
        filter: &RosterFilter,
    ) -> ProjectionBatch<WeeklyProjection> {
        let roster = self.roster(season, filter);
        let batch = self.run_batch(&roster, |id| self.project_player_week(id, week, season));
        info!(
            "Weekly projections {season} week {week}: {} projected, {} failed",
            batch.projections.len(),
            batch.failures.len()
        );
        batch
    }

    pub fn get_seasonal_projections(&self, season: u16) -> ProjectionBatch<SeasonalProjection> {
        self.get_seasonal_projections_filtered(season, &RosterFilter::all())
    }

    pub fn get_seasonal_projections_filtered(
        &self,
        season: u16,
        filter: &RosterFilter,
    ) -> ProjectionBatch<SeasonalProjection> {
        let roster = self.roster(season, filter);
        let model = self.seasonal_model();
        let start = WeekCursor::new(season, model.start_week(season));
        let batch = self.run_batch(&roster, |id| self.project_season_from(&model, id, start));
        info!(
            "Seasonal projections {season}: {} projected, {} failed",
            batch.projections.len(),
            batch.failures.len()
        );
        batch
    }

    // -- Single-player queries ----------------------------------------------

    pub fn project_player_week(
        &self,
        player_id: &str,
        week: u8,
        season: u16,
    ) -> Result<WeeklyProjection, ProjectionError> {
        let builder = FeatureBuilder::new(self.source.as_ref(), self.settings.recency_decay);
        let profile = builder.build_profile(player_id, season, week, self.settings.window_size)?;
        let projection = WeeklyModel::new(&self.settings)
            .with_league_variance(self.league_variance)
            .project_week(&profile, &self.system, None);

        Ok(match self.availability.weekly_decision(player_id) {
            AvailabilityDecision::Zero => projection.zeroed_by_availability(),
            AvailabilityDecision::Pass => projection,
        })
    }

    /// Project the rest of `season`: from the week after the latest logged
    /// week through the player's last regular-season game.
    pub fn project_player_season(
        &self,
        player_id: &str,
        season: u16,
    ) -> Result<SeasonalProjection, ProjectionError> {
        let model = self.seasonal_model();
        let start = WeekCursor::new(season, model.start_week(season));
        self.project_season_from(&model, player_id, start)
    }

    // -- Internals ----------------------------------------------------------

    fn seasonal_model(&self) -> SeasonalModel<'_> {
        SeasonalModel::new(self.source.as_ref(), &self.settings, self.league_variance)
    }

    fn project_season_from(
        &self,
        model: &SeasonalModel<'_>,
        player_id: &str,
        start: WeekCursor,
    ) -> Result<SeasonalProjection, ProjectionError> {
        let remaining = model.remaining_games(player_id, start);
        model.project_from(
            player_id,
            start,
            &self.system,
            remaining,
            self.availability.get(player_id),
        )
    }

    /// Players with logs in `season`, or in the previous season when
    /// `season` has none yet, narrowed by `filter`.
    fn roster(&self, season: u16, filter: &RosterFilter) -> Vec<String> {
        let mut players = self.source.players_in_season(season);
        if players.is_empty() && season > 0 {
            info!("No logs for season {season}, using season {} roster", season - 1);
            players = self.source.players_in_season(season - 1);
        }
        players.retain(|id| filter.matches(id, self.source.position_of(id)));
        players
    }

    fn run_batch<T, F>(&self, roster: &[String], project: F) -> ProjectionBatch<T>
    where
        T: Ranked + Send,
        F: Fn(&str) -> Result<T, ProjectionError> + Sync,
    {
        let results: Vec<(&String, Result<T, ProjectionError>)> = roster
            .par_iter()
            .map(|id| (id, project(id.as_str())))
            .collect();

        let mut projections = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for (id, result) in results {
            match result {
                Ok(p) => projections.push(p),
                Err(error) => {
                    warn!("could not project {id}: {error}");
                    failures.push(PlayerFailure {
                        player_id: id.clone(),
                        error,
                    });
                }
            }
        }

        rank(&mut projections);
        failures.sort_by(|a, b| a.player_id.cmp(&b.player_id));
        ProjectionBatch {
            projections,
            failures,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
