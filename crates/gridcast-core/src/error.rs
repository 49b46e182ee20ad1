// Error taxonomy for the projection engine.

use thiserror::Error;

/// Every failure the engine can report.
///
/// `UnknownScoringSystem` and `InvalidConfiguration` are construction-time
/// failures. `InsufficientHistory` is a per-player data gap: batch queries
/// collect it next to the successful records instead of aborting.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectionError {
    #[error("unknown scoring system `{name}`")]
    UnknownScoringSystem { name: String },

    #[error("insufficient history for player {player_id} before season {season} week {week}")]
    InsufficientHistory {
        player_id: String,
        season: u16,
        week: u8,
    },

    #[error("invalid configuration for `{field}`: {message}")]
    InvalidConfiguration { field: String, message: String },
}

impl ProjectionError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ProjectionError::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True for per-player data gaps that a batch can absorb.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ProjectionError::InsufficientHistory { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_history_gaps_are_recoverable() {
        let gap = ProjectionError::InsufficientHistory {
            player_id: "00-0033873".into(),
            season: 2024,
            week: 3,
        };
        assert!(gap.is_recoverable());
        assert!(!ProjectionError::UnknownScoringSystem { name: "x".into() }.is_recoverable());
        assert!(!ProjectionError::invalid("window_size", "must be > 0").is_recoverable());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = ProjectionError::UnknownScoringSystem {
            name: "six-pt-pass".into(),
        };
        assert_eq!(err.to_string(), "unknown scoring system `six-pt-pass`");

        let err = ProjectionError::invalid("recency_decay", "must be in (0, 1], got 1.5");
        assert!(err.to_string().contains("recency_decay"));
        assert!(err.to_string().contains("1.5"));
    }
}
