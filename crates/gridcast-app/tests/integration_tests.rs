// Integration tests for the gridcast host.
//
// These load a real config directory, ingest the CSV fixtures, run the
// engine and parse the JSON-lines output back.

use std::fs;
use std::path::{Path, PathBuf};

use gridcast_app::app::{self, RunSummary};
use gridcast_app::config::{self, RunMode};
use gridcast_app::ingest;
use gridcast_core::engine::ProjectionEngine;
use gridcast_core::gamelog::{GameLogSource, InMemoryGameLogs};
use gridcast_core::scoring::ScoringRegistry;
use serde_json::Value;
use std::sync::Arc;

// ===========================================================================
// Test helpers
// ===========================================================================

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Temp base dir with a `config/engine.toml` pointing at the fixtures.
fn base_dir(name: &str, scoring: &str, mode: &str, week: Option<u8>, availability: bool) -> PathBuf {
    let tmp = std::env::temp_dir().join(name);
    let _ = fs::remove_dir_all(&tmp);
    fs::create_dir_all(tmp.join("config")).unwrap();

    let week_line = week.map(|w| format!("week = {w}\n")).unwrap_or_default();
    let availability_line = if availability {
        format!(
            "availability = \"{}\"\n",
            fixtures().join("availability.csv").display()
        )
    } else {
        String::new()
    };
    let engine = format!(
        "[engine]\nscoring_system = \"{scoring}\"\n\n\
         [run]\nmode = \"{mode}\"\nseason = 2024\n{week_line}\n\
         [data_paths]\ngame_logs = \"{}\"\n{availability_line}",
        fixtures().join("game_logs.csv").display()
    );
    fs::write(tmp.join("config/engine.toml"), engine).unwrap();
    tmp
}

fn run_lines(base: &Path) -> (RunSummary, Vec<Value>) {
    let config = config::load_config_from(base).expect("fixture config loads");
    let mut buf = Vec::<u8>::new();
    let summary = app::run(&config, &mut buf).expect("run succeeds");
    let lines = String::from_utf8(buf)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    (summary, lines)
}

fn of_kind<'a>(lines: &'a [Value], kind: &str) -> Vec<&'a Value> {
    lines.iter().filter(|l| l["kind"] == kind).collect()
}

fn points_for(lines: &[Value], kind: &str, player: &str) -> f64 {
    lines
        .iter()
        .find(|l| l["kind"] == kind && l["player_id"] == player)
        .and_then(|l| l["projected_points"].as_f64())
        .unwrap_or_else(|| panic!("no {kind} record for {player}"))
}

// ===========================================================================
// Test: CSV fixtures
// ===========================================================================

#[test]
fn fixture_csv_loads_valid_rows_only() {
    let logs = ingest::load_game_logs(&fixtures().join("game_logs.csv")).unwrap();
    // Two malformed rows are skipped.
    assert_eq!(logs.len(), 29);
    let source = InMemoryGameLogs::new(logs);
    assert_eq!(source.players_in_season(2024).len(), 6);
    assert_eq!(source.latest_week(2024), Some(7));

    let signals = ingest::load_availability(&fixtures().join("availability.csv")).unwrap();
    assert_eq!(signals.len(), 4);
}

// ===========================================================================
// Test: End-to-end runs
// ===========================================================================

#[test]
fn weekly_run_reports_rookie_as_failure() {
    let base = base_dir("gridcast_it_weekly", "ppr", "weekly", Some(7), false);
    let (summary, lines) = run_lines(&base);

    assert_eq!(summary.week, Some(7));
    assert_eq!(summary.weekly_projected, 5);
    assert_eq!(summary.weekly_failed, 1);
    assert_eq!(summary.seasonal_projected, 0);

    let weekly = of_kind(&lines, "weekly");
    assert_eq!(weekly.len(), 5);
    for record in &weekly {
        let lo = record["lower_bound"].as_f64().unwrap();
        let hi = record["upper_bound"].as_f64().unwrap();
        let est = record["projected_points"].as_f64().unwrap();
        assert!(0.0 <= lo && lo <= est && est <= hi);
    }
    for pair in weekly.windows(2) {
        let a = pair[0]["projected_points"].as_f64().unwrap();
        let b = pair[1]["projected_points"].as_f64().unwrap();
        assert!(a >= b);
    }
    let failures = of_kind(&lines, "failure");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0]["player_id"], "00-0040001");
    assert_eq!(failures[0]["recoverable"], true);

    let _ = fs::remove_dir_all(&base);
}

#[test]
fn omitted_week_targets_the_next_unplayed_week() {
    let base = base_dir("gridcast_it_next_week", "half-ppr", "weekly", None, false);
    let (summary, lines) = run_lines(&base);
    assert_eq!(summary.week, Some(8));
    assert_eq!(summary.weekly_failed, 0);
    assert!(of_kind(&lines, "weekly").iter().all(|l| l["week"] == 8));
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn both_mode_emits_weekly_then_seasonal() {
    let base = base_dir("gridcast_it_both", "ppr", "both", None, false);
    let (summary, lines) = run_lines(&base);
    assert_eq!(summary.weekly_projected, 6);
    assert_eq!(summary.seasonal_projected, 6);

    let first_seasonal = lines.iter().position(|l| l["kind"] == "seasonal").unwrap();
    assert!(lines[..first_seasonal].iter().all(|l| l["kind"] != "seasonal"));
    for record in of_kind(&lines, "seasonal") {
        let lo = record["lower_bound"].as_f64().unwrap();
        let est = record["projected_points"].as_f64().unwrap();
        let hi = record["upper_bound"].as_f64().unwrap();
        assert!(lo <= est && est <= hi);
        assert_eq!(record["start_week"], 8);
        // 11 weeks left; nobody has logged more than six of 17 games.
        assert_eq!(record["weeks_covered"], 11);
    }
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn availability_file_zeroes_gated_players() {
    let base = base_dir("gridcast_it_availability", "ppr", "both", Some(7), true);
    let (_, lines) = run_lines(&base);

    // IR: zero for the week and the season.
    assert_eq!(points_for(&lines, "weekly", "00-0036223"), 0.0);
    assert_eq!(points_for(&lines, "seasonal", "00-0036223"), 0.0);
    // Out this week only.
    assert_eq!(points_for(&lines, "weekly", "00-0030506"), 0.0);
    assert!(points_for(&lines, "seasonal", "00-0030506") > 0.0);
    // Questionable passes.
    assert!(points_for(&lines, "weekly", "00-0039075") > 0.0);
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn ppr_ranks_receivers_higher_than_standard() {
    let ppr_base = base_dir("gridcast_it_ppr", "ppr", "weekly", Some(7), false);
    let std_base = base_dir("gridcast_it_std", "standard", "weekly", Some(7), false);
    let (_, ppr) = run_lines(&ppr_base);
    let (_, standard) = run_lines(&std_base);

    let wr = "00-0039075";
    assert!(points_for(&ppr, "weekly", wr) > points_for(&standard, "weekly", wr));
    let _ = fs::remove_dir_all(&ppr_base);
    let _ = fs::remove_dir_all(&std_base);
}

#[test]
fn repeated_runs_are_identical() {
    let base = base_dir("gridcast_it_repeat", "ppr", "both", None, true);
    let config = config::load_config_from(&base).unwrap();
    let mut first = Vec::<u8>::new();
    let mut second = Vec::<u8>::new();
    app::run(&config, &mut first).unwrap();
    app::run(&config, &mut second).unwrap();
    assert_eq!(first, second);
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn missing_game_log_file_fails_the_run() {
    let base = base_dir("gridcast_it_missing_logs", "ppr", "weekly", None, false);
    let mut config = config::load_config_from(&base).unwrap();
    config.data_paths.game_logs = "does/not/exist.csv".into();
    let err = app::run(&config, &mut Vec::<u8>::new()).unwrap_err();
    assert!(format!("{err:#}").contains("failed to load game logs"));
    let _ = fs::remove_dir_all(&base);
}

#[test]
fn config_mode_and_engine_agree() {
    let base = base_dir("gridcast_it_engine", "half_ppr", "seasonal", None, false);
    let config = config::load_config_from(&base).unwrap();
    assert_eq!(config.run.mode, RunMode::Seasonal);

    let registry: ScoringRegistry = config.scoring_registry().unwrap();
    let logs = ingest::load_game_logs(&config.game_logs_path()).unwrap();
    let engine = ProjectionEngine::new(
        Arc::new(InMemoryGameLogs::new(logs)),
        &registry,
        &config.scoring_system,
        config.projection.clone(),
    )
    .unwrap();
    assert_eq!(engine.scoring_system().name, "half-ppr");
    let _ = fs::remove_dir_all(&base);
}
