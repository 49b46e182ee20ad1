// Historical feature builder: rolling per-player profiles from game logs.

use crate::error::ProjectionError;
use crate::gamelog::{GameLog, GameLogSource, Position, StatLine, WeekCursor};
use serde::Serialize;

/// Rolling statistical profile for one player as of a (season, week) cursor.
///
/// Built from the most recent games strictly before the cursor. Only played
/// games feed the averages; did-not-play games still occupy a window slot
/// and age the games behind them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerFeatureProfile {
    pub player_id: String,
    pub player_name: Option<String>,
    pub position: Option<Position>,
    pub team: Option<String>,
    pub as_of: WeekCursor,
    /// Recency-weighted per-category average over played games.
    pub weighted_line: StatLine,
    /// Unweighted per-category average over played games.
    pub mean_line: StatLine,
    /// `weighted_line - mean_line`; positive means trending up.
    pub trend: StatLine,
    pub games_in_window: usize,
    pub games_played: usize,
    /// Mean share of team opportunities, when team totals are known.
    pub usage_share: Option<f64>,
    /// Played games' lines, most recent first.
    pub game_lines: Vec<StatLine>,
}

/// Geometric recency weights for `n` window slots, newest first:
/// `[1, decay, decay^2, ...]`.
pub fn recency_weights(n: usize, decay: f64) -> Vec<f64> {
    let mut weights = Vec::with_capacity(n);
    let mut w = 1.0;
    for _ in 0..n {
        weights.push(w);
        w *= decay;
    }
    weights
}

/// Builds `PlayerFeatureProfile`s from any `GameLogSource`.
pub struct FeatureBuilder<'a> {
    source: &'a dyn GameLogSource,
    decay: f64,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(source: &'a dyn GameLogSource, decay: f64) -> Self {
        Self { source, decay }
    }

    /// Profile from the `window_size` most recent logs strictly before
    /// (`season`, `week`).
    ///
    /// Fails with `InsufficientHistory` when no played game falls in the
    /// window.
    pub fn build_profile(
        &self,
        player_id: &str,
        season: u16,
        week: u8,
        window_size: usize,
    ) -> Result<PlayerFeatureProfile, ProjectionError> {
        let as_of = WeekCursor::new(season, week);
        let window = self.source.logs_before(player_id, as_of, window_size);
        self.profile_from_window(player_id, as_of, &window)
    }

    /// Profile from an explicit window (newest first). The caller is
    /// responsible for truncating the window to the desired size.
    pub fn profile_from_window(
        &self,
        player_id: &str,
        as_of: WeekCursor,
        window: &[GameLog],
    ) -> Result<PlayerFeatureProfile, ProjectionError> {
        let weights = recency_weights(window.len(), self.decay);

        let mut weighted_line = StatLine::new();
        let mut mean_line = StatLine::new();
        let mut weight_total = 0.0;
        let mut game_lines = Vec::new();
        let mut shares = Vec::new();

        for (log, weight) in window.iter().zip(&weights) {
            if !log.played {
                continue;
            }
            weighted_line.add_scaled(&log.stats, *weight);
            mean_line.add_scaled(&log.stats, 1.0);
            weight_total += weight;
            game_lines.push(log.stats.clone());

            if let Some(share) = self.usage_share(log) {
                shares.push(share);
            }
        }

        let games_played = game_lines.len();
        if games_played == 0 {
            return Err(ProjectionError::InsufficientHistory {
                player_id: player_id.to_string(),
                season: as_of.season,
                week: as_of.week,
            });
        }

        let weighted_line = weighted_line.scaled(1.0 / weight_total);
        let mean_line = mean_line.scaled(1.0 / games_played as f64);
        let mut trend = weighted_line.clone();
        trend.add_scaled(&mean_line, -1.0);

        let usage_share = if shares.is_empty() {
            None
        } else {
            Some(shares.iter().sum::<f64>() / shares.len() as f64)
        };

        Ok(PlayerFeatureProfile {
            player_id: player_id.to_string(),
            player_name: window.iter().find_map(|l| l.player_name.clone()),
            position: window.iter().find_map(|l| l.position),
            team: window.iter().find_map(|l| l.team.clone()),
            as_of,
            weighted_line,
            mean_line,
            trend,
            games_in_window: window.len(),
            games_played,
            usage_share,
            game_lines,
        })
    }

    fn usage_share(&self, log: &GameLog) -> Option<f64> {
        let team = log.team.as_deref()?;
        let total = self
            .source
            .team_opportunities(team, log.season, log.week)?;
        if total > 0.0 {
            Some(log.stats.opportunities() / total)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
