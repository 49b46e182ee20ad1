// Game log data model and the read capability the feature builder depends on.
//
// The engine never fetches or normalizes raw feeds. Callers materialize
// already-cleaned game logs and hand them over through a `GameLogSource`;
// `InMemoryGameLogs` is the adapter for a plain collection.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::warn;

// ---------------------------------------------------------------------------
// Statistical categories
// ---------------------------------------------------------------------------

/// Well-known category names. Any other name is accepted and scores zero
/// unless a scoring system assigns it a multiplier.
pub mod stat {
    pub const PASSING_YARDS: &str = "passing_yards";
    pub const PASSING_TDS: &str = "passing_tds";
    pub const INTERCEPTIONS: &str = "interceptions";
    pub const PASSING_2PT: &str = "passing_2pt";
    pub const RUSHING_YARDS: &str = "rushing_yards";
    pub const RUSHING_TDS: &str = "rushing_tds";
    pub const RUSHING_2PT: &str = "rushing_2pt";
    pub const RECEIVING_YARDS: &str = "receiving_yards";
    pub const RECEIVING_TDS: &str = "receiving_tds";
    pub const RECEIVING_2PT: &str = "receiving_2pt";
    pub const RECEPTIONS: &str = "receptions";
    pub const FUMBLES_LOST: &str = "fumbles_lost";

    // Volume categories used for the usage proxy.
    pub const PASSING_ATTEMPTS: &str = "passing_attempts";
    pub const RUSHING_ATTEMPTS: &str = "rushing_attempts";
    pub const TARGETS: &str = "targets";

    /// Categories that count as a team opportunity for the usage share.
    pub const OPPORTUNITY_CATEGORIES: &[&str] = &[PASSING_ATTEMPTS, RUSHING_ATTEMPTS, TARGETS];
}

/// A statistical line: category name → value.
///
/// Backed by an ordered map so iteration (and therefore floating-point
/// summation order) is identical on every run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatLine(BTreeMap<String, f64>);

impl StatLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `category`, or 0.0 when the category is absent.
    pub fn get(&self, category: &str) -> f64 {
        self.0.get(category).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, category: impl Into<String>, value: f64) {
        self.0.insert(category.into(), value);
    }

    pub fn with(mut self, category: impl Into<String>, value: f64) -> Self {
        self.set(category, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Accumulate `weight * other` into this line, category by category.
    pub fn add_scaled(&mut self, other: &StatLine, weight: f64) {
        for (category, value) in other.iter() {
            *self.0.entry(category.to_string()).or_insert(0.0) += value * weight;
        }
    }

    /// A copy with every value multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> StatLine {
        StatLine(self.0.iter().map(|(k, v)| (k.clone(), v * factor)).collect())
    }

    /// A copy with every negative (or NaN) value replaced by zero.
    pub fn floored_at_zero(&self) -> StatLine {
        StatLine(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), if *v > 0.0 { *v } else { 0.0 }))
                .collect(),
        )
    }

    /// Passing attempts + rushing attempts + targets.
    pub fn opportunities(&self) -> f64 {
        stat::OPPORTUNITY_CATEGORIES
            .iter()
            .map(|c| self.get(c))
            .sum()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for StatLine {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        StatLine(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Offensive fantasy positions (plus kicker / team defense).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Kicker,
    Defense,
}

impl Position {
    /// Parse a position abbreviation ("QB", "RB", "WR", "TE", "K"/"PK",
    /// "DEF"/"DST"/"D/ST"). Also accepts "FB" as a running back.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" | "FB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" | "PK" => Some(Position::Kicker),
            "DEF" | "DST" | "D/ST" => Some(Position::Defense),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DEF",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

// ---------------------------------------------------------------------------
// Game logs
// ---------------------------------------------------------------------------

/// A (season, week) point in time. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeekCursor {
    pub season: u16,
    pub week: u8,
}

impl WeekCursor {
    pub fn new(season: u16, week: u8) -> Self {
        Self { season, week }
    }
}

impl fmt::Display for WeekCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} week {}", self.season, self.week)
    }
}

/// One player's recorded line in one completed game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLog {
    pub player_id: String,
    pub player_name: Option<String>,
    pub position: Option<Position>,
    pub team: Option<String>,
    pub season: u16,
    pub week: u8,
    pub opponent: String,
    pub stats: StatLine,
    /// False when the player was on the roster but did not play.
    pub played: bool,
}

impl GameLog {
    pub fn new(
        player_id: impl Into<String>,
        season: u16,
        week: u8,
        opponent: impl Into<String>,
        stats: StatLine,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            player_name: None,
            position: None,
            team: None,
            season,
            week,
            opponent: opponent.into(),
            stats,
            played: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = Some(name.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    pub fn did_not_play(mut self) -> Self {
        self.played = false;
        self
    }

    pub fn cursor(&self) -> WeekCursor {
        WeekCursor::new(self.season, self.week)
    }
}

// ---------------------------------------------------------------------------
// Source capability
// ---------------------------------------------------------------------------

/// Read access to historical game logs.
///
/// Injury, weather or other feeds can be layered in later as additional
/// implementations of this trait.
pub trait GameLogSource: Send + Sync {
    /// Ids of every player with at least one log in `season`, sorted.
    fn players_in_season(&self, season: u16) -> Vec<String>;

    /// Up to `limit` logs for the player strictly before `cursor`, newest first.
    fn logs_before(&self, player_id: &str, cursor: WeekCursor, limit: usize) -> Vec<GameLog>;

    /// Summed opportunities for a team in one week, when known.
    fn team_opportunities(&self, team: &str, season: u16, week: u8) -> Option<f64>;

    /// Every log, did-not-play records included.
    fn logs(&self) -> Box<dyn Iterator<Item = &GameLog> + '_>;

    /// Most recently known position for a player.
    fn position_of(&self, player_id: &str) -> Option<Position>;

    /// Every log with `played == true`.
    fn played_logs(&self) -> Box<dyn Iterator<Item = &GameLog> + '_> {
        Box::new(self.logs().filter(|log| log.played))
    }

    /// Latest week with any log in `season`, did-not-play records included.
    fn latest_week(&self, season: u16) -> Option<u8> {
        self.logs()
            .filter(|log| log.season == season)
            .map(|log| log.week)
            .max()
    }
}

/// `GameLogSource` over a caller-supplied collection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryGameLogs {
    /// Per player, ascending by (season, week).
    by_player: BTreeMap<String, Vec<GameLog>>,
    team_totals: HashMap<(String, u16, u8), f64>,
}

impl InMemoryGameLogs {
    /// Index the logs. A repeated (player, season, week) keeps the last
    /// record seen.
    pub fn new(logs: impl IntoIterator<Item = GameLog>) -> Self {
        let mut keyed: BTreeMap<String, BTreeMap<WeekCursor, GameLog>> = BTreeMap::new();
        for log in logs {
            let slot = keyed.entry(log.player_id.clone()).or_default();
            if let Some(previous) = slot.insert(log.cursor(), log) {
                warn!(
                    "duplicate game log for player {} at {}, using latest record",
                    previous.player_id,
                    previous.cursor()
                );
            }
        }

        let by_player: BTreeMap<String, Vec<GameLog>> = keyed
            .into_iter()
            .map(|(id, logs)| (id, logs.into_values().collect()))
            .collect();

        let mut team_totals: HashMap<(String, u16, u8), f64> = HashMap::new();
        for log in by_player.values().flatten().filter(|l| l.played) {
            if let Some(team) = &log.team {
                *team_totals
                    .entry((team.clone(), log.season, log.week))
                    .or_insert(0.0) += log.stats.opportunities();
            }
        }

        Self {
            by_player,
            team_totals,
        }
    }

    /// Total number of logs held.
    pub fn len(&self) -> usize {
        self.by_player.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_player.is_empty()
    }

    pub fn player_count(&self) -> usize {
        self.by_player.len()
    }
}

impl GameLogSource for InMemoryGameLogs {
    fn players_in_season(&self, season: u16) -> Vec<String> {
        self.by_player
            .iter()
            .filter(|(_, logs)| logs.iter().any(|l| l.season == season))
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn logs_before(&self, player_id: &str, cursor: WeekCursor, limit: usize) -> Vec<GameLog> {
        let Some(logs) = self.by_player.get(player_id) else {
            return Vec::new();
        };
        let end = logs.partition_point(|l| l.cursor() < cursor);
        logs[..end].iter().rev().take(limit).cloned().collect()
    }

    fn team_opportunities(&self, team: &str, season: u16, week: u8) -> Option<f64> {
        self.team_totals
            .get(&(team.to_string(), season, week))
            .copied()
    }

    fn logs(&self) -> Box<dyn Iterator<Item = &GameLog> + '_> {
        Box::new(self.by_player.values().flatten())
    }

    fn position_of(&self, player_id: &str) -> Option<Position> {
        self.by_player
            .get(player_id)?
            .iter()
            .rev()
            .find_map(|l| l.position)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rushing(yards: f64, attempts: f64) -> StatLine {
        StatLine::new()
            .with(stat::RUSHING_YARDS, yards)
            .with(stat::RUSHING_ATTEMPTS, attempts)
    }

    #[test]
    fn stat_line_missing_category_reads_zero() {
        let line = rushing(80.0, 15.0);
        assert_eq!(line.get(stat::RECEPTIONS), 0.0);
        assert_eq!(line.get(stat::RUSHING_YARDS), 80.0);
    }

    #[test]
    fn stat_line_floor_replaces_negatives() {
        let line = rushing(-4.0, 3.0).floored_at_zero();
        assert_eq!(line.get(stat::RUSHING_YARDS), 0.0);
        assert_eq!(line.get(stat::RUSHING_ATTEMPTS), 3.0);
    }

    #[test]
    fn stat_line_opportunities_sum_volume_categories() {
        let line = rushing(50.0, 12.0)
            .with(stat::TARGETS, 4.0)
            .with(stat::RECEPTIONS, 3.0);
        assert_eq!(line.opportunities(), 16.0);
    }

    #[test]
    fn position_parsing_accepts_aliases() {
        assert_eq!(Position::from_str_pos("qb"), Some(Position::Quarterback));
        assert_eq!(Position::from_str_pos(" FB "), Some(Position::RunningBack));
        assert_eq!(Position::from_str_pos("DST"), Some(Position::Defense));
        assert_eq!(Position::from_str_pos("LS"), None);
        assert_eq!(Position::TightEnd.to_string(), "TE");
    }

    #[test]
    fn cursor_orders_by_season_then_week() {
        assert!(WeekCursor::new(2023, 18) < WeekCursor::new(2024, 1));
        assert!(WeekCursor::new(2024, 2) < WeekCursor::new(2024, 10));
    }

    #[test]
    fn logs_before_is_strict_and_newest_first() {
        let source = InMemoryGameLogs::new(vec![
            GameLog::new("p1", 2023, 17, "DAL", rushing(40.0, 10.0)),
            GameLog::new("p1", 2024, 1, "NYG", rushing(60.0, 14.0)),
            GameLog::new("p1", 2024, 2, "PHI", rushing(70.0, 16.0)),
            GameLog::new("p1", 2024, 3, "WAS", rushing(90.0, 20.0)),
        ]);

        let logs = source.logs_before("p1", WeekCursor::new(2024, 3), 10);
        let weeks: Vec<(u16, u8)> = logs.iter().map(|l| (l.season, l.week)).collect();
        assert_eq!(weeks, vec![(2024, 2), (2024, 1), (2023, 17)]);

        let limited = source.logs_before("p1", WeekCursor::new(2024, 3), 2);
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].week, 2);

        assert!(source.logs_before("unknown", WeekCursor::new(2024, 3), 5).is_empty());
    }

    #[test]
    fn duplicate_logs_keep_latest_record() {
        let source = InMemoryGameLogs::new(vec![
            GameLog::new("p1", 2024, 1, "NYG", rushing(10.0, 5.0)),
            GameLog::new("p1", 2024, 1, "NYG", rushing(99.0, 5.0)),
        ]);
        assert_eq!(source.len(), 1);
        let logs = source.logs_before("p1", WeekCursor::new(2024, 2), 5);
        assert_eq!(logs[0].stats.get(stat::RUSHING_YARDS), 99.0);
    }

    #[test]
    fn team_opportunities_sum_played_logs_only() {
        let source = InMemoryGameLogs::new(vec![
            GameLog::new("rb", 2024, 1, "NYG", rushing(60.0, 15.0)).with_team("DAL"),
            GameLog::new("wr", 2024, 1, "NYG", StatLine::new().with(stat::TARGETS, 5.0))
                .with_team("DAL"),
            GameLog::new("hurt", 2024, 1, "NYG", rushing(0.0, 30.0))
                .with_team("DAL")
                .did_not_play(),
        ]);
        assert_eq!(source.team_opportunities("DAL", 2024, 1), Some(20.0));
        assert_eq!(source.team_opportunities("DAL", 2024, 2), None);
    }

    #[test]
    fn roster_and_latest_week_by_season() {
        let source = InMemoryGameLogs::new(vec![
            GameLog::new("b", 2024, 4, "NYG", StatLine::new()),
            GameLog::new("a", 2024, 6, "NYG", StatLine::new()).did_not_play(),
            GameLog::new("c", 2023, 9, "NYG", StatLine::new()),
        ]);
        assert_eq!(source.players_in_season(2024), vec!["a", "b"]);
        assert_eq!(source.players_in_season(2023), vec!["c"]);
        assert_eq!(source.latest_week(2024), Some(6));
        assert_eq!(source.latest_week(2025), None);
        assert_eq!(source.played_logs().count(), 2);
    }

    #[test]
    fn position_of_uses_most_recent_known() {
        let source = InMemoryGameLogs::new(vec![
            GameLog::new("p", 2023, 1, "NYG", StatLine::new()).with_position(Position::WideReceiver),
            GameLog::new("p", 2024, 1, "NYG", StatLine::new()).with_position(Position::TightEnd),
            GameLog::new("p", 2024, 2, "NYG", StatLine::new()),
        ]);
        assert_eq!(source.position_of("p"), Some(Position::TightEnd));
        assert_eq!(source.position_of("q"), None);
    }

    /// Implements only the required methods, relying on the defaults.
    struct Delegating(InMemoryGameLogs);

    impl GameLogSource for Delegating {
        fn players_in_season(&self, season: u16) -> Vec<String> {
            self.0.players_in_season(season)
        }
        fn logs_before(&self, player_id: &str, cursor: WeekCursor, limit: usize) -> Vec<GameLog> {
            self.0.logs_before(player_id, cursor, limit)
        }
        fn team_opportunities(&self, team: &str, season: u16, week: u8) -> Option<f64> {
            self.0.team_opportunities(team, season, week)
        }
        fn logs(&self) -> Box<dyn Iterator<Item = &GameLog> + '_> {
            self.0.logs()
        }
        fn position_of(&self, player_id: &str) -> Option<Position> {
            self.0.position_of(player_id)
        }
    }

    #[test]
    fn default_latest_week_counts_did_not_play_logs() {
        let source = Delegating(InMemoryGameLogs::new(vec![
            GameLog::new("b", 2024, 4, "NYG", StatLine::new()),
            GameLog::new("a", 2024, 6, "NYG", StatLine::new()).did_not_play(),
        ]));
        assert_eq!(source.latest_week(2024), Some(6));
        assert_eq!(source.played_logs().count(), 1);
        assert_eq!(source.logs().count(), 2);
    }
}
