// Availability gate: deterministic zero/pass rules over externally supplied
// roster and injury statuses.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Roster statuses that mean the player is gone for the foreseeable future.
const LONG_TERM_ROSTER_STATUSES: &[&str] = &[
    "IR",
    "PUP",
    "NFI",
    "SUSPENDED",
    "INACTIVE",
    "PRACTICE SQUAD",
];

/// Game-level injury designations that mean the player sits this week.
const GAME_ABSENCE_STATUSES: &[&str] = &["OUT", "DOUBTFUL", "IR", "PUP"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityDecision {
    /// Project normally.
    Pass,
    /// Projection is zeroed.
    Zero,
}

/// Externally supplied status for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySignal {
    pub player_id: String,
    #[serde(default)]
    pub roster_status: Option<String>,
    #[serde(default)]
    pub injury_status: Option<String>,
}

fn normalized(status: Option<&str>) -> String {
    status.unwrap_or_default().trim().to_uppercase()
}

impl AvailabilitySignal {
    pub fn new(
        player_id: impl Into<String>,
        roster_status: Option<&str>,
        injury_status: Option<&str>,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            roster_status: roster_status.map(str::to_string),
            injury_status: injury_status.map(str::to_string),
        }
    }

    /// Out for the foreseeable future (injured reserve, suspension, ...).
    pub fn is_long_term_absence(&self) -> bool {
        let roster = normalized(self.roster_status.as_deref());
        LONG_TERM_ROSTER_STATUSES.contains(&roster.as_str())
    }

    /// Zero/pass decision for the upcoming game.
    pub fn decision(&self) -> AvailabilityDecision {
        decision_from_fields(self.roster_status.as_deref(), self.injury_status.as_deref())
    }

    pub fn is_questionable(&self) -> bool {
        normalized(self.injury_status.as_deref()) == "QUESTIONABLE"
    }
}

/// Decide whether a player's upcoming projection should be zeroed.
///
/// Missing or unrecognized statuses pass through; so do Questionable and
/// Probable designations.
pub fn decision_from_fields(
    roster_status: Option<&str>,
    injury_status: Option<&str>,
) -> AvailabilityDecision {
    let roster = normalized(roster_status);
    let injury = normalized(injury_status);
    if LONG_TERM_ROSTER_STATUSES.contains(&roster.as_str())
        || GAME_ABSENCE_STATUSES.contains(&injury.as_str())
    {
        AvailabilityDecision::Zero
    } else {
        AvailabilityDecision::Pass
    }
}

// ---------------------------------------------------------------------------
// Signal collection
// ---------------------------------------------------------------------------

/// Signals keyed by player id.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityBoard {
    signals: HashMap<String, AvailabilitySignal>,
}

impl AvailabilityBoard {
    /// Later signals for the same player replace earlier ones.
    pub fn new(signals: impl IntoIterator<Item = AvailabilitySignal>) -> Self {
        Self {
            signals: signals
                .into_iter()
                .map(|s| (s.player_id.clone(), s))
                .collect(),
        }
    }

    pub fn get(&self, player_id: &str) -> Option<&AvailabilitySignal> {
        self.signals.get(player_id)
    }

    /// Decision for the upcoming game; players without a signal pass.
    pub fn weekly_decision(&self, player_id: &str) -> AvailabilityDecision {
        self.get(player_id)
            .map(AvailabilitySignal::decision)
            .unwrap_or(AvailabilityDecision::Pass)
    }

    pub fn is_long_term_absence(&self, player_id: &str) -> bool {
        self.get(player_id)
            .is_some_and(AvailabilitySignal::is_long_term_absence)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn summary(&self) -> AvailabilitySummary {
        AvailabilitySummary::from_signals(self.signals.values())
    }
}

/// Counts of gate outcomes across a set of signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AvailabilitySummary {
    pub zeroed: usize,
    pub questionable: usize,
    pub active: usize,
    pub total: usize,
}

impl AvailabilitySummary {
    pub fn from_signals<'a>(signals: impl IntoIterator<Item = &'a AvailabilitySignal>) -> Self {
        let mut summary = Self::default();
        for signal in signals {
            summary.total += 1;
            if signal.decision() == AvailabilityDecision::Zero {
                summary.zeroed += 1;
            } else if signal.is_questionable() {
                summary.questionable += 1;
            } else {
                summary.active += 1;
            }
        }
        summary
    }

    pub fn log(&self, source: &str) {
        info!(
            "Availability gate: zeroed={}, questionable={}, active={}, total={}, source={}",
            self.zeroed, self.questionable, self.active, self.total, source
        );
    }
}
