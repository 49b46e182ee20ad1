// gridcast-core: fantasy-football projection engine.
//
// Converts historical per-player game logs into weekly point estimates and
// season-long estimates with an uncertainty band, under a named scoring
// system.

pub mod availability;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod gamelog;
pub mod scoring;
pub mod seasonal;
pub mod variance;
pub mod weekly;

pub use availability::{AvailabilityBoard, AvailabilityDecision, AvailabilitySignal};
pub use config::ProjectionSettings;
pub use engine::{PlayerFailure, ProjectionBatch, ProjectionEngine, RosterFilter};
pub use error::ProjectionError;
pub use features::{FeatureBuilder, PlayerFeatureProfile};
pub use gamelog::{GameLog, GameLogSource, InMemoryGameLogs, Position, StatLine, WeekCursor};
pub use scoring::{ScoringRegistry, ScoringSystem, ScoringSystemDef};
pub use seasonal::{SeasonalModel, SeasonalProjection};
pub use variance::PointSpread;
pub use weekly::{WeeklyModel, WeeklyProjection};
