// CSV ingestion of already-cleaned game logs and availability statuses.
//
// Game log files carry a fixed set of identity columns followed by any number
// of stat columns; every column not listed in `IDENTITY_COLUMNS` becomes a
// stat category named after its header.

use gridcast_core::availability::AvailabilitySignal;
use gridcast_core::gamelog::{GameLog, Position, StatLine};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Game logs
// ---------------------------------------------------------------------------

/// Columns that describe the game rather than the stat line.
const IDENTITY_COLUMNS: &[&str] = &[
    "player_id",
    "player_name",
    "position",
    "team",
    "season",
    "week",
    "opponent",
    "played",
];

/// Header positions of the identity columns; `None` when absent.
struct ColumnMap {
    player_id: usize,
    season: usize,
    week: usize,
    opponent: Option<usize>,
    player_name: Option<usize>,
    position: Option<usize>,
    team: Option<usize>,
    played: Option<usize>,
    stats: Vec<(usize, String)>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, String> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| find(name).ok_or_else(|| format!("missing required column `{name}`"));

        let stats = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| !h.trim().is_empty() && !IDENTITY_COLUMNS.contains(&h.trim()))
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        Ok(Self {
            player_id: require("player_id")?,
            season: require("season")?,
            week: require("week")?,
            opponent: find("opponent"),
            player_name: find("player_name"),
            position: find("position"),
            team: find("team"),
            played: find("played"),
            stats,
        })
    }
}

/// Trimmed, non-empty field value.
fn field<'r>(record: &'r csv::StringRecord, index: Option<usize>) -> Option<&'r str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Accepts 1/0, true/false, yes/no, y/n. A missing value means played.
fn parse_played(value: Option<&str>) -> Option<bool> {
    match value.map(str::to_lowercase).as_deref() {
        None => Some(true),
        Some("1" | "true" | "yes" | "y") => Some(true),
        Some("0" | "false" | "no" | "n") => Some(false),
        Some(_) => None,
    }
}

fn parse_row(columns: &ColumnMap, record: &csv::StringRecord) -> Result<GameLog, String> {
    let player_id = field(record, Some(columns.player_id)).ok_or("empty player_id")?;
    let season: u16 = field(record, Some(columns.season))
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| format!("player '{player_id}': invalid season"))?;
    let week: u8 = field(record, Some(columns.week))
        .and_then(|s| s.parse().ok())
        .filter(|w| *w > 0)
        .ok_or_else(|| format!("player '{player_id}': invalid week"))?;
    let played = parse_played(field(record, columns.played))
        .ok_or_else(|| format!("player '{player_id}': invalid played flag"))?;

    let mut stats = StatLine::new();
    for (index, category) in &columns.stats {
        let Some(raw) = field(record, Some(*index)) else {
            continue;
        };
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => stats.set(category.clone(), value),
            _ => {
                return Err(format!(
                    "player '{player_id}' week {week}: non-numeric {category} value '{raw}'"
                ))
            }
        }
    }

    let mut log = GameLog::new(
        player_id,
        season,
        week,
        field(record, columns.opponent).unwrap_or_default(),
        stats,
    );
    if let Some(name) = field(record, columns.player_name) {
        log = log.with_name(name);
    }
    if let Some(pos) = field(record, columns.position) {
        match Position::from_str_pos(pos) {
            Some(position) => log = log.with_position(position),
            None => warn!("player '{player_id}': unknown position '{pos}', leaving unset"),
        }
    }
    if let Some(team) = field(record, columns.team) {
        log = log.with_team(team.to_uppercase());
    }
    if !played {
        log = log.did_not_play();
    }
    Ok(log)
}

/// `origin` names the input in error messages. A header without the
/// required columns fails the whole file; bad rows are skipped.
fn load_game_logs_from_reader<R: Read>(rdr: R, origin: &str) -> Result<Vec<GameLog>, IngestError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers = reader
        .headers()
        .map_err(|e| IngestError::Csv {
            path: origin.to_string(),
            source: e,
        })?
        .clone();
    let columns = ColumnMap::from_headers(&headers)
        .map_err(|e| IngestError::Validation(format!("game log CSV {origin}: {e}")))?;

    let mut logs = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => match parse_row(&columns, &record) {
                Ok(log) => logs.push(log),
                Err(e) => warn!("skipping game log row: {e}"),
            },
            Err(e) => warn!("skipping malformed game log row: {e}"),
        }
    }
    Ok(logs)
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// Availability CSV row. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct RawAvailability {
    player_id: String,
    #[serde(default)]
    roster_status: Option<String>,
    #[serde(default)]
    injury_status: Option<String>,
}

fn load_availability_from_reader<R: Read>(rdr: R) -> Result<Vec<AvailabilitySignal>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut signals = Vec::new();
    for result in reader.deserialize::<RawAvailability>() {
        match result {
            Ok(raw) => {
                let player_id = raw.player_id.trim();
                if player_id.is_empty() {
                    warn!("skipping availability row with empty player_id");
                    continue;
                }
                signals.push(AvailabilitySignal::new(
                    player_id,
                    raw.roster_status.as_deref().map(str::trim),
                    raw.injury_status.as_deref().map(str::trim),
                ));
            }
            Err(e) => {
                warn!("skipping malformed availability row: {}", e);
            }
        }
    }
    Ok(signals)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

/// Load game logs from a CSV file. An empty result is an error: the engine
/// has nothing to project from.
pub fn load_game_logs(path: &Path) -> Result<Vec<GameLog>, IngestError> {
    let file = std::fs::File::open(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let logs = load_game_logs_from_reader(file, &path.display().to_string())?;
    if logs.is_empty() {
        return Err(IngestError::Validation(format!(
            "game log CSV {} produced zero valid rows",
            path.display()
        )));
    }
    info!("Loaded {} game logs from {}", logs.len(), path.display());
    Ok(logs)
}

/// Load availability signals from a CSV file.
pub fn load_availability(path: &Path) -> Result<Vec<AvailabilitySignal>, IngestError> {
    let file = std::fs::File::open(path).map_err(|e| IngestError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let signals = load_availability_from_reader(file).map_err(|e| IngestError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;
    info!("Loaded {} availability signals from {}", signals.len(), path.display());
    Ok(signals)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
