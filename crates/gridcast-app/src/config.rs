// Configuration loading and parsing (engine.toml, scoring.toml).

use gridcast_core::config::ProjectionSettings;
use gridcast_core::error::ProjectionError;
use gridcast_core::scoring::{ScoringRegistry, ScoringSystemDef};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

impl From<ProjectionError> for ConfigError {
    fn from(err: ProjectionError) -> Self {
        match err {
            ProjectionError::InvalidConfiguration { field, message } => {
                ConfigError::ValidationError { field, message }
            }
            ProjectionError::UnknownScoringSystem { name } => ConfigError::ValidationError {
                field: "scoring_system".into(),
                message: format!("unknown scoring system `{name}`"),
            },
            other => ConfigError::ValidationError {
                field: "projection".into(),
                message: other.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level assembled config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory the config was loaded from; relative data paths resolve
    /// against it.
    pub base_dir: PathBuf,
    pub scoring_system: String,
    pub projection: ProjectionSettings,
    pub run: RunConfig,
    pub data_paths: DataPaths,
    /// Custom systems from scoring.toml, in file order.
    pub scoring_systems: Vec<ScoringSystemDef>,
}

// ---------------------------------------------------------------------------
// engine.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct EngineFile {
    engine: EngineSection,
    #[serde(default)]
    projection: ProjectionSettings,
    run: RunConfig,
    data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
struct EngineSection {
    scoring_system: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Weekly,
    Seasonal,
    Both,
}

impl RunMode {
    pub fn includes_weekly(&self) -> bool {
        matches!(self, RunMode::Weekly | RunMode::Both)
    }

    pub fn includes_seasonal(&self) -> bool {
        matches!(self, RunMode::Seasonal | RunMode::Both)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub mode: RunMode,
    pub season: u16,
    /// Week to project. When omitted, the week after the latest logged week.
    #[serde(default)]
    pub week: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub game_logs: String,
    #[serde(default)]
    pub availability: Option<String>,
}

// ---------------------------------------------------------------------------
// scoring.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
struct ScoringFile {
    #[serde(default)]
    systems: Vec<ScoringSystemDef>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/engine.toml` and
/// (optionally) `config/scoring.toml`, relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<AppConfig, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- engine.toml (required) ---
    let engine_path = config_dir.join("engine.toml");
    let engine_text = read_file(&engine_path)?;
    let engine_file: EngineFile =
        toml::from_str(&engine_text).map_err(|e| ConfigError::ParseError {
            path: engine_path.clone(),
            source: e,
        })?;

    // --- scoring.toml (optional) ---
    let scoring_path = config_dir.join("scoring.toml");
    let scoring_file = if scoring_path.exists() {
        let scoring_text = read_file(&scoring_path)?;
        toml::from_str(&scoring_text).map_err(|e| ConfigError::ParseError {
            path: scoring_path.clone(),
            source: e,
        })?
    } else {
        ScoringFile::default()
    };

    let config = AppConfig {
        base_dir: base_dir.to_path_buf(),
        scoring_system: engine_file.engine.scoring_system,
        projection: engine_file.projection,
        run: engine_file.run,
        data_paths: engine_file.data_paths,
        scoring_systems: scoring_file.systems,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    copied.sort();
    Ok(copied)
}

/// Pick the directory holding `config/` and `defaults/`: the working
/// directory when it has either, else the platform config directory.
pub fn resolve_base_dir() -> Result<PathBuf, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if cwd.join("config").exists() || cwd.join("defaults").exists() {
        return Ok(cwd);
    }
    match directories::ProjectDirs::from("", "", "gridcast") {
        Some(dirs) => Ok(dirs.config_dir().to_path_buf()),
        None => Ok(cwd),
    }
}

/// Resolve the base directory, copy defaults, then load.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let base_dir = resolve_base_dir()?;
    ensure_config_files(&base_dir)?;
    load_config_from(&base_dir)
}

impl AppConfig {
    /// Built-in systems plus every custom system from scoring.toml. A custom
    /// system may extend any system registered before it.
    pub fn scoring_registry(&self) -> Result<ScoringRegistry, ConfigError> {
        let mut registry = ScoringRegistry::with_builtins();
        for def in &self.scoring_systems {
            let system = def.clone().resolve(&registry)?;
            registry.register(system)?;
        }
        Ok(registry)
    }

    pub fn game_logs_path(&self) -> PathBuf {
        self.base_dir.join(&self.data_paths.game_logs)
    }

    pub fn availability_path(&self) -> Option<PathBuf> {
        self.data_paths
            .availability
            .as_ref()
            .map(|p| self.base_dir.join(p))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    config.projection.validate()?;

    let registry = config.scoring_registry()?;
    if !registry.contains(&config.scoring_system) {
        return Err(ConfigError::ValidationError {
            field: "engine.scoring_system".into(),
            message: format!(
                "unknown scoring system `{}` (available: {})",
                config.scoring_system,
                registry.names().join(", ")
            ),
        });
    }

    if let Some(week) = config.run.week {
        let max = config.projection.regular_season_weeks;
        if week == 0 || week > max {
            return Err(ConfigError::ValidationError {
                field: "run.week".into(),
                message: format!("must be between 1 and {max}, got {week}"),
            });
        }
    }

    if config.data_paths.game_logs.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data_paths.game_logs".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
