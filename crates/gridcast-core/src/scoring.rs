// Scoring rules: named systems that turn a stat line into fantasy points.
//
// A line's raw value is a sum of independent per-category contributions
// (multiplier × value plus that category's own threshold bonuses). Nothing
// couples two categories, so scoring per-game lines and summing gives the
// same total as summing per-category contributions.

use crate::error::ProjectionError;
use crate::gamelog::{stat, GameLog, StatLine};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const STANDARD: &str = "standard";
pub const PPR: &str = "ppr";
pub const HALF_PPR: &str = "half-ppr";

// ---------------------------------------------------------------------------
// Scoring system
// ---------------------------------------------------------------------------

/// Flat points awarded once a category reaches `threshold` in a single line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBonus {
    pub category: String,
    pub threshold: f64,
    pub points: f64,
}

/// A named, versioned mapping from category to points per unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringSystem {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub multipliers: BTreeMap<String, f64>,
    #[serde(default)]
    pub bonuses: Vec<ThresholdBonus>,
}

fn default_version() -> u32 {
    1
}

impl ScoringSystem {
    /// Standard (non-PPR) scoring: 1 pt / 25 passing yards, 4 pt passing TD,
    /// 1 pt / 10 rushing or receiving yards, 6 pt rushing/receiving TD,
    /// -2 per interception or lost fumble, 2 per two-point conversion.
    pub fn standard() -> Self {
        let multipliers: BTreeMap<String, f64> = [
            (stat::PASSING_YARDS, 1.0 / 25.0),
            (stat::PASSING_TDS, 4.0),
            (stat::INTERCEPTIONS, -2.0),
            (stat::PASSING_2PT, 2.0),
            (stat::RUSHING_YARDS, 1.0 / 10.0),
            (stat::RUSHING_TDS, 6.0),
            (stat::RUSHING_2PT, 2.0),
            (stat::RECEIVING_YARDS, 1.0 / 10.0),
            (stat::RECEIVING_TDS, 6.0),
            (stat::RECEIVING_2PT, 2.0),
            (stat::RECEPTIONS, 0.0),
            (stat::FUMBLES_LOST, -2.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            name: STANDARD.into(),
            version: 1,
            multipliers,
            bonuses: Vec::new(),
        }
    }

    /// Standard scoring plus one point per reception.
    pub fn ppr() -> Self {
        Self::standard().renamed(PPR).with_multiplier(stat::RECEPTIONS, 1.0)
    }

    /// Standard scoring plus half a point per reception.
    pub fn half_ppr() -> Self {
        Self::standard()
            .renamed(HALF_PPR)
            .with_multiplier(stat::RECEPTIONS, 0.5)
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_multiplier(mut self, category: impl Into<String>, points: f64) -> Self {
        self.multipliers.insert(category.into(), points);
        self
    }

    pub fn with_bonus(mut self, category: impl Into<String>, threshold: f64, points: f64) -> Self {
        self.bonuses.push(ThresholdBonus {
            category: category.into(),
            threshold,
            points,
        });
        self
    }

    pub fn multiplier(&self, category: &str) -> f64 {
        self.multipliers.get(category).copied().unwrap_or(0.0)
    }

    /// Points contributed by one category value, bonuses included.
    pub fn category_points(&self, category: &str, value: f64) -> f64 {
        let bonus: f64 = self
            .bonuses
            .iter()
            .filter(|b| b.category == category && value >= b.threshold)
            .map(|b| b.points)
            .sum();
        self.multiplier(category) * value + bonus
    }

    /// Per-category contributions for every category present in `line`.
    pub fn breakdown(&self, line: &StatLine) -> BTreeMap<String, f64> {
        line.iter()
            .map(|(category, value)| (category.to_string(), self.category_points(category, value)))
            .collect()
    }

    /// Sum of per-category contributions. Negative when turnovers outweigh
    /// production.
    pub fn raw_points(&self, line: &StatLine) -> f64 {
        line.iter()
            .map(|(category, value)| self.category_points(category, value))
            .sum()
    }

    /// Published fantasy points for a line, never below zero.
    pub fn score_line(&self, line: &StatLine) -> f64 {
        self.raw_points(line).max(0.0)
    }

    /// Published fantasy points for one game log.
    pub fn score(&self, log: &GameLog) -> f64 {
        self.score_line(&log.stats)
    }

    /// Reject non-finite multipliers and malformed bonuses.
    pub fn validate(&self) -> Result<(), ProjectionError> {
        if normalize_name(&self.name).is_empty() {
            return Err(ProjectionError::invalid("scoring.name", "must not be empty"));
        }
        for (category, points) in &self.multipliers {
            if !points.is_finite() {
                return Err(ProjectionError::invalid(
                    format!("scoring.{}.multipliers.{category}", self.name),
                    format!("must be finite, got {points}"),
                ));
            }
        }
        for bonus in &self.bonuses {
            if !bonus.threshold.is_finite() || bonus.threshold < 0.0 {
                return Err(ProjectionError::invalid(
                    format!("scoring.{}.bonuses.{}", self.name, bonus.category),
                    format!("threshold must be finite and >= 0, got {}", bonus.threshold),
                ));
            }
            if !bonus.points.is_finite() {
                return Err(ProjectionError::invalid(
                    format!("scoring.{}.bonuses.{}", self.name, bonus.category),
                    format!("points must be finite, got {}", bonus.points),
                ));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Custom definitions
// ---------------------------------------------------------------------------

/// A scoring system as written in configuration. `base` names an already
/// registered system whose multipliers and bonuses are inherited before
/// applying the overrides below.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSystemDef {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub multipliers: BTreeMap<String, f64>,
    #[serde(default)]
    pub bonuses: Vec<ThresholdBonus>,
}

impl ScoringSystemDef {
    pub fn resolve(self, registry: &ScoringRegistry) -> Result<ScoringSystem, ProjectionError> {
        let mut system = match &self.base {
            Some(base) => registry.get(base)?.clone(),
            None => ScoringSystem {
                name: String::new(),
                version: self.version,
                multipliers: BTreeMap::new(),
                bonuses: Vec::new(),
            },
        };
        system.name = self.name;
        system.version = self.version;
        system.multipliers.extend(self.multipliers);
        system.bonuses.extend(self.bonuses);
        Ok(system)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Canonical lookup key: trimmed, lowercase, `_` treated as `-`.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace('_', "-")
}

/// Named scoring systems available to the engine.
#[derive(Debug, Clone, Default)]
pub struct ScoringRegistry {
    systems: BTreeMap<String, ScoringSystem>,
}

impl ScoringRegistry {
    /// A registry with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in "standard", "ppr" and "half-ppr" systems.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for system in [
            ScoringSystem::standard(),
            ScoringSystem::ppr(),
            ScoringSystem::half_ppr(),
        ] {
            registry
                .systems
                .insert(normalize_name(&system.name), system);
        }
        registry
    }

    /// Add a system. Names must be unique after normalization.
    pub fn register(&mut self, system: ScoringSystem) -> Result<(), ProjectionError> {
        system.validate()?;
        let key = normalize_name(&system.name);
        if self.systems.contains_key(&key) {
            return Err(ProjectionError::invalid(
                "scoring.name",
                format!("scoring system `{}` is already registered", system.name),
            ));
        }
        self.systems.insert(key, system);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&ScoringSystem, ProjectionError> {
        self.systems
            .get(&normalize_name(name))
            .ok_or_else(|| ProjectionError::UnknownScoringSystem { name: name.into() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.systems.contains_key(&normalize_name(name))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.systems.values().map(|s| s.name.as_str()).collect()
    }

    /// Score one game log under the named system.
    pub fn score(&self, log: &GameLog, system: &str) -> Result<f64, ProjectionError> {
        Ok(self.get(system)?.score(log))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
