// Week-to-week spread of scored points, shared by the weekly and seasonal
// models.

use crate::config::ProjectionSettings;
use crate::features::PlayerFeatureProfile;
use crate::gamelog::GameLogSource;
use crate::scoring::ScoringSystem;

/// Sample variance (n - 1 denominator). `None` for fewer than two values.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    Some(values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0))
}

/// Sample variance of per-game scored points across every played log.
pub fn league_points_variance(source: &dyn GameLogSource, system: &ScoringSystem) -> Option<f64> {
    let points: Vec<f64> = source.played_logs().map(|log| system.score(log)).collect();
    sample_variance(&points)
}

/// Per-game standard deviation for one player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSpread {
    pub std_dev: f64,
    /// Set when the variance came from the single-game fallback.
    pub is_high_uncertainty: bool,
}

impl PointSpread {
    /// Standard deviation of scored points over the profile's played games,
    /// floored at `min_weekly_std_dev`. A single game falls back to a
    /// fraction of `league_variance` (or the fixed fallback when the league
    /// has no baseline) and is flagged as high uncertainty.
    pub fn of_profile(
        profile: &PlayerFeatureProfile,
        system: &ScoringSystem,
        settings: &ProjectionSettings,
        league_variance: Option<f64>,
    ) -> Self {
        let points: Vec<f64> = profile
            .game_lines
            .iter()
            .map(|line| system.score_line(line))
            .collect();

        let (variance, is_high_uncertainty) = match sample_variance(&points) {
            Some(v) => (v, false),
            None => {
                let fallback = league_variance
                    .map(|v| v * settings.fallback_variance_fraction)
                    .unwrap_or(settings.fallback_variance);
                (fallback, true)
            }
        };

        Self {
            std_dev: variance.sqrt().max(settings.min_weekly_std_dev),
            is_high_uncertainty,
        }
    }

    /// Interval half-width over `weeks` independent weeks.
    pub fn half_width(&self, settings: &ProjectionSettings, weeks: u8) -> f64 {
        settings.confidence_multiplier * self.std_dev * f64::from(weeks).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureBuilder;
    use crate::gamelog::{stat, GameLog, InMemoryGameLogs, StatLine};

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn receiving(player: &str, week: u8, receptions: f64, yards: f64) -> GameLog {
        GameLog::new(
            player,
            2024,
            week,
            "OPP",
            StatLine::new()
                .with(stat::RECEPTIONS, receptions)
                .with(stat::RECEIVING_YARDS, yards),
        )
    }

    fn profile(source: &InMemoryGameLogs, player: &str) -> PlayerFeatureProfile {
        FeatureBuilder::new(source, 0.8)
            .build_profile(player, 2024, 10, 6)
            .unwrap()
    }

    #[test]
    fn sample_variance_known_values() {
        // Mean 5, squared deviations sum 32, n - 1 = 7.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx_eq(sample_variance(&values).unwrap(), 32.0 / 7.0, 1e-12));
        assert!(sample_variance(&[3.0]).is_none());
        assert!(sample_variance(&[]).is_none());
    }

    #[test]
    fn league_variance_ignores_inactive_games() {
        let source = InMemoryGameLogs::new(vec![
            receiving("a", 1, 2.0, 0.0),
            receiving("b", 1, 4.0, 0.0),
            receiving("c", 1, 50.0, 0.0).did_not_play(),
        ]);
        let variance = league_points_variance(&source, &ScoringSystem::ppr()).unwrap();
        assert!(approx_eq(variance, 2.0, 1e-12));
    }

    #[test]
    fn spread_from_two_games_is_sample_sd() {
        let source = InMemoryGameLogs::new(vec![
            receiving("wr", 1, 0.0, 100.0),
            receiving("wr", 2, 0.0, 200.0),
        ]);
        let settings = ProjectionSettings::default();
        let spread = PointSpread::of_profile(
            &profile(&source, "wr"),
            &ScoringSystem::standard(),
            &settings,
            Some(400.0),
        );
        // Scores 10 and 20.
        assert!(approx_eq(spread.std_dev, 50f64.sqrt(), 1e-12));
        assert!(!spread.is_high_uncertainty);
        assert!(approx_eq(spread.half_width(&settings, 4), 2.0 * 50f64.sqrt(), 1e-12));
    }

    #[test]
    fn single_game_falls_back_and_flags() {
        let source = InMemoryGameLogs::new(vec![receiving("wr", 1, 4.0, 60.0)]);
        let settings = ProjectionSettings::default();
        let p = profile(&source, "wr");
        let ppr = ScoringSystem::ppr();

        let with_league = PointSpread::of_profile(&p, &ppr, &settings, Some(64.0));
        assert!(with_league.is_high_uncertainty);
        assert!(approx_eq(with_league.std_dev, 32f64.sqrt(), 1e-12));

        let without_league = PointSpread::of_profile(&p, &ppr, &settings, None);
        assert!(approx_eq(without_league.std_dev, 6.0, 1e-12));
    }

    #[test]
    fn flat_history_uses_floor() {
        let source = InMemoryGameLogs::new(vec![
            receiving("wr", 1, 5.0, 50.0),
            receiving("wr", 2, 5.0, 50.0),
        ]);
        let settings = ProjectionSettings::default();
        let spread =
            PointSpread::of_profile(&profile(&source, "wr"), &ScoringSystem::ppr(), &settings, None);
        assert_eq!(spread.std_dev, settings.min_weekly_std_dev);
    }
}
