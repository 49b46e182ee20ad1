// Weekly projection model: one player, one upcoming week.

use crate::availability::AvailabilityDecision;
use crate::config::ProjectionSettings;
use crate::features::PlayerFeatureProfile;
use crate::gamelog::{Position, StatLine};
use crate::scoring::ScoringSystem;
use crate::variance::PointSpread;
use serde::Serialize;
use tracing::warn;

/// Estimate for one player in one week under one scoring system, with a
/// one-week interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyProjection {
    pub player_id: String,
    pub player_name: Option<String>,
    pub position: Option<Position>,
    pub team: Option<String>,
    pub season: u16,
    pub week: u8,
    pub scoring_system: String,
    /// Never negative.
    pub projected_points: f64,
    /// Clamped at zero.
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub per_game_std_dev: f64,
    pub is_high_uncertainty: bool,
    /// Opponent factor after clamping.
    pub opponent_factor: f64,
    pub games_in_profile: usize,
    pub availability: AvailabilityDecision,
}

impl WeeklyProjection {
    /// Zero the estimate and its interval because the availability gate
    /// said the player sits.
    pub fn zeroed_by_availability(mut self) -> Self {
        self.projected_points = 0.0;
        self.lower_bound = 0.0;
        self.upper_bound = 0.0;
        self.availability = AvailabilityDecision::Zero;
        self
    }
}

pub struct WeeklyModel<'a> {
    settings: &'a ProjectionSettings,
    league_variance: Option<f64>,
}

impl<'a> WeeklyModel<'a> {
    pub fn new(settings: &'a ProjectionSettings) -> Self {
        Self {
            settings,
            league_variance: None,
        }
    }

    /// League-wide per-game variance used for single-game players.
    pub fn with_league_variance(mut self, league_variance: Option<f64>) -> Self {
        self.league_variance = league_variance;
        self
    }

    /// Resolve the optional opponent adjustment to the factor actually used.
    pub fn opponent_factor(&self, opponent_adjustment: Option<f64>) -> f64 {
        let raw = opponent_adjustment.unwrap_or(1.0);
        if !raw.is_finite() {
            warn!("non-finite opponent adjustment {raw}, using neutral factor");
        }
        self.settings.clamp_opponent_factor(raw)
    }

    /// The adjusted per-category line that gets scored: the profile's
    /// recency-weighted line floored at zero, with every category the system
    /// rewards scaled by the opponent factor. Penalized categories
    /// (interceptions, lost fumbles) stay unscaled so a tougher or softer
    /// matchup moves the score in one direction only.
    pub fn projected_line(
        &self,
        profile: &PlayerFeatureProfile,
        system: &ScoringSystem,
        factor: f64,
    ) -> StatLine {
        profile
            .weighted_line
            .floored_at_zero()
            .iter()
            .map(|(category, value)| {
                if system.multiplier(category) < 0.0 {
                    (category, value)
                } else {
                    (category, value * factor)
                }
            })
            .collect()
    }

    pub fn project_week(
        &self,
        profile: &PlayerFeatureProfile,
        system: &ScoringSystem,
        opponent_adjustment: Option<f64>,
    ) -> WeeklyProjection {
        let factor = self.opponent_factor(opponent_adjustment);
        let line = self.projected_line(profile, system, factor);
        let projected_points = system.score_line(&line);
        let spread = PointSpread::of_profile(profile, system, self.settings, self.league_variance);
        let half_width = spread.half_width(self.settings, 1);

        WeeklyProjection {
            player_id: profile.player_id.clone(),
            player_name: profile.player_name.clone(),
            position: profile.position,
            team: profile.team.clone(),
            season: profile.as_of.season,
            week: profile.as_of.week,
            scoring_system: system.name.clone(),
            projected_points,
            lower_bound: (projected_points - half_width).max(0.0),
            upper_bound: projected_points + half_width,
            per_game_std_dev: spread.std_dev,
            is_high_uncertainty: spread.is_high_uncertainty,
            opponent_factor: factor,
            games_in_profile: profile.games_played,
            availability: AvailabilityDecision::Pass,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
