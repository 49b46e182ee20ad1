// Seasonal projection model: rolling forward simulation of the remaining
// weeks plus an uncertainty band from historical week-to-week variance.
//
// The band assumes weeks are independent, so the half-width grows with the
// square root of the weeks covered. Real week-to-week correlation (sustained
// role changes, injuries) is ignored; treat the band as a simplification.

use crate::availability::{AvailabilityDecision, AvailabilitySignal};
use crate::config::ProjectionSettings;
use crate::error::ProjectionError;
use crate::features::{FeatureBuilder, PlayerFeatureProfile};
use crate::gamelog::{GameLog, GameLogSource, Position, WeekCursor};
use crate::scoring::ScoringSystem;
use crate::variance::PointSpread;
use crate::weekly::WeeklyModel;
use serde::Serialize;
use tracing::debug;

/// Opponent label carried by simulated games.
const SIMULATED_OPPONENT: &str = "TBD";

/// Season-long estimate with an uncertainty interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalProjection {
    pub player_id: String,
    pub player_name: Option<String>,
    pub position: Option<Position>,
    pub team: Option<String>,
    pub season: u16,
    pub scoring_system: String,
    pub projected_points: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// First simulated week.
    pub start_week: u8,
    pub weeks_covered: u8,
    /// Per-game standard deviation the band was built from.
    pub per_game_std_dev: f64,
    /// Set when the variance came from the single-game fallback.
    pub is_high_uncertainty: bool,
    pub availability: AvailabilityDecision,
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

pub struct SeasonalModel<'a> {
    source: &'a dyn GameLogSource,
    settings: &'a ProjectionSettings,
    builder: FeatureBuilder<'a>,
    weekly: WeeklyModel<'a>,
    league_variance: Option<f64>,
}

impl<'a> SeasonalModel<'a> {
    /// `league_variance` is the league-wide per-game points variance under
    /// the scoring system being projected (see `variance::league_points_variance`).
    pub fn new(
        source: &'a dyn GameLogSource,
        settings: &'a ProjectionSettings,
        league_variance: Option<f64>,
    ) -> Self {
        Self {
            source,
            settings,
            builder: FeatureBuilder::new(source, settings.recency_decay),
            weekly: WeeklyModel::new(settings),
            league_variance,
        }
    }

    /// First week still to be played: the week after the latest logged week
    /// of `season`, or week 1 when the season has no logs yet.
    pub fn start_week(&self, season: u16) -> u8 {
        self.source
            .latest_week(season)
            .map_or(1, |week| week.saturating_add(1))
    }

    /// Games left for a player from `start` to the end of the regular
    /// season: the weeks left, capped by `games_per_season` less the games
    /// already logged for the player that season (bye weeks have no log).
    pub fn remaining_games(&self, player_id: &str, start: WeekCursor) -> u8 {
        let weeks_elapsed = start.week.saturating_sub(1);
        let weeks_left = self.settings.regular_season_weeks.saturating_sub(weeks_elapsed);
        let logged = self
            .source
            .logs_before(player_id, start, usize::from(weeks_elapsed))
            .iter()
            .filter(|log| log.season == start.season)
            .count();
        let logged = u8::try_from(logged).unwrap_or(u8::MAX);
        weeks_left.min(self.settings.games_per_season.saturating_sub(logged))
    }

    /// Project `remaining_weeks` weeks of `season`, starting at `start_week`.
    pub fn project_season(
        &self,
        player_id: &str,
        season: u16,
        system: &ScoringSystem,
        remaining_weeks: u8,
    ) -> Result<SeasonalProjection, ProjectionError> {
        self.project_season_with(player_id, season, system, remaining_weeks, None)
    }

    /// Like `project_season`, applying an availability signal: a long-term
    /// absence zeroes every week, a game-level absence zeroes the first.
    pub fn project_season_with(
        &self,
        player_id: &str,
        season: u16,
        system: &ScoringSystem,
        remaining_weeks: u8,
        availability: Option<&AvailabilitySignal>,
    ) -> Result<SeasonalProjection, ProjectionError> {
        let start = WeekCursor::new(season, self.start_week(season));
        self.project_from(player_id, start, system, remaining_weeks, availability)
    }

    /// Project `remaining_weeks` weeks from an already resolved `start`.
    /// Batches resolve the start once and reuse it for every player.
    pub fn project_from(
        &self,
        player_id: &str,
        start: WeekCursor,
        system: &ScoringSystem,
        remaining_weeks: u8,
        availability: Option<&AvailabilitySignal>,
    ) -> Result<SeasonalProjection, ProjectionError> {
        let window_size = self.settings.window_size;

        let actual = self.source.logs_before(player_id, start, window_size);
        let initial = self.builder.profile_from_window(player_id, start, &actual)?;
        let spread = PointSpread::of_profile(&initial, system, self.settings, self.league_variance);

        let long_term = availability.is_some_and(AvailabilitySignal::is_long_term_absence);
        let sits_first_week =
            availability.is_some_and(|s| s.decision() == AvailabilityDecision::Zero);

        let projected_points = if long_term {
            0.0
        } else {
            self.simulate(&initial, &actual, system, remaining_weeks, sits_first_week)?
        };

        let half_width = spread.half_width(self.settings, remaining_weeks);

        debug!(
            "seasonal projection for {player_id}: {projected_points:.2} pts over {remaining_weeks} weeks from {start}, sd {:.2}",
            spread.std_dev
        );

        Ok(SeasonalProjection {
            player_id: player_id.to_string(),
            player_name: initial.player_name.clone(),
            position: initial.position,
            team: initial.team.clone(),
            season: start.season,
            scoring_system: system.name.clone(),
            projected_points,
            lower_bound: (projected_points - half_width).max(0.0),
            upper_bound: projected_points + half_width,
            start_week: start.week,
            weeks_covered: remaining_weeks,
            per_game_std_dev: spread.std_dev,
            is_high_uncertainty: spread.is_high_uncertainty,
            availability: if long_term || sits_first_week {
                AvailabilityDecision::Zero
            } else {
                AvailabilityDecision::Pass
            },
        })
    }

    /// Walk the remaining weeks, re-profiling each week over actual history
    /// plus the games simulated so far, and sum the weekly estimates.
    fn simulate(
        &self,
        initial: &PlayerFeatureProfile,
        actual: &[GameLog],
        system: &ScoringSystem,
        remaining_weeks: u8,
        sits_first_week: bool,
    ) -> Result<f64, ProjectionError> {
        let window_size = self.settings.window_size;
        // Newest last.
        let mut simulated: Vec<GameLog> = Vec::new();
        let mut total = 0.0;

        for offset in 0..remaining_weeks {
            let cursor = WeekCursor::new(
                initial.as_of.season,
                initial.as_of.week.saturating_add(offset),
            );
            let profile = if simulated.is_empty() {
                PlayerFeatureProfile {
                    as_of: cursor,
                    ..initial.clone()
                }
            } else {
                let window: Vec<GameLog> = simulated
                    .iter()
                    .rev()
                    .chain(actual.iter())
                    .take(window_size)
                    .cloned()
                    .collect();
                self.builder
                    .profile_from_window(&initial.player_id, cursor, &window)?
            };

            if offset == 0 && sits_first_week {
                continue;
            }

            let projection = self.weekly.project_week(&profile, system, None);
            total += projection.projected_points;

            let line = self
                .weekly
                .projected_line(&profile, system, projection.opponent_factor);
            let mut game = GameLog::new(
                initial.player_id.clone(),
                cursor.season,
                cursor.week,
                SIMULATED_OPPONENT,
                line,
            );
            game.player_name = profile.player_name.clone();
            game.position = profile.position;
            game.team = profile.team.clone();
            simulated.push(game);
        }

        Ok(total)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
