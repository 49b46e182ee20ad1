// Tuning parameters for the projection models.

use crate::error::ProjectionError;
use serde::{Deserialize, Serialize};

/// Every tunable the engine reads, with documented defaults.
///
/// Deserializes from a TOML table; omitted keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionSettings {
    /// Number of most recent games in the feature window. Default 6.
    pub window_size: usize,
    /// Geometric weight decay per game of age. Default 0.8, so the oldest
    /// game in a full 6-game window weighs about a third of the newest.
    pub recency_decay: f64,
    /// Lower clamp for the opponent-strength factor. Default 0.5.
    pub opponent_min_factor: f64,
    /// Upper clamp for the opponent-strength factor. Default 1.5.
    pub opponent_max_factor: f64,
    /// Standard deviations spanned by the seasonal half-width. Default 1.0
    /// (roughly a 68% interval).
    pub confidence_multiplier: f64,
    /// Fraction of the league-wide per-game variance substituted for a
    /// player with a single qualifying game. Default 0.5.
    pub fallback_variance_fraction: f64,
    /// Variance used for single-game players when the league itself has
    /// fewer than two played games. Default 36.0 (a 6-point deviation).
    pub fallback_variance: f64,
    /// Floor on the per-game standard deviation, in points. Default 1.0.
    pub min_weekly_std_dev: f64,
    /// Weeks in the regular season. Default 18.
    pub regular_season_weeks: u8,
    /// Games each team plays in the regular season; the difference from
    /// `regular_season_weeks` is bye weeks. Default 17.
    pub games_per_season: u8,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            window_size: 6,
            recency_decay: 0.8,
            opponent_min_factor: 0.5,
            opponent_max_factor: 1.5,
            confidence_multiplier: 1.0,
            fallback_variance_fraction: 0.5,
            fallback_variance: 36.0,
            min_weekly_std_dev: 1.0,
            regular_season_weeks: 18,
            games_per_season: 17,
        }
    }
}

impl ProjectionSettings {
    /// Check every parameter, reporting the first out-of-range field.
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if self.window_size == 0 {
            return Err(ProjectionError::invalid("window_size", "must be greater than 0"));
        }

        let decay = self.recency_decay;
        if !(decay.is_finite() && decay > 0.0 && decay <= 1.0) {
            return Err(ProjectionError::invalid(
                "recency_decay",
                format!("must be in (0, 1], got {decay}"),
            ));
        }

        let (lo, hi) = (self.opponent_min_factor, self.opponent_max_factor);
        if !(lo.is_finite() && lo > 0.0) {
            return Err(ProjectionError::invalid(
                "opponent_min_factor",
                format!("must be finite and > 0, got {lo}"),
            ));
        }
        if !(hi.is_finite() && hi >= lo) {
            return Err(ProjectionError::invalid(
                "opponent_max_factor",
                format!("must be finite and >= opponent_min_factor ({lo}), got {hi}"),
            ));
        }

        let positive_fields: &[(&str, f64)] = &[
            ("confidence_multiplier", self.confidence_multiplier),
            ("fallback_variance_fraction", self.fallback_variance_fraction),
            ("fallback_variance", self.fallback_variance),
            ("min_weekly_std_dev", self.min_weekly_std_dev),
        ];
        for (name, val) in positive_fields {
            if !(val.is_finite() && *val > 0.0) {
                return Err(ProjectionError::invalid(
                    *name,
                    format!("must be finite and > 0, got {val}"),
                ));
            }
        }

        if self.regular_season_weeks == 0 {
            return Err(ProjectionError::invalid(
                "regular_season_weeks",
                "must be greater than 0",
            ));
        }
        let (games, weeks) = (self.games_per_season, self.regular_season_weeks);
        if games == 0 || games > weeks {
            return Err(ProjectionError::invalid(
                "games_per_season",
                format!("must be between 1 and regular_season_weeks ({weeks}), got {games}"),
            ));
        }

        Ok(())
    }

    /// Clamp an opponent factor into the configured range. Non-finite input
    /// is treated as neutral.
    pub fn clamp_opponent_factor(&self, factor: f64) -> f64 {
        let factor = if factor.is_finite() { factor } else { 1.0 };
        factor.clamp(self.opponent_min_factor, self.opponent_max_factor)
    }
}
