// gridcast entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file; stdout carries results)
// 2. Load config
// 3. Run: ingest game logs, build the engine, emit JSON lines

use gridcast_app::{app, config};

use anyhow::Context;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("gridcast starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded from {}: scoring={}, season={}, mode={:?}",
        config.base_dir.display(),
        config.scoring_system,
        config.run.season,
        config.run.mode
    );

    // 3. Run
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match app::run(&config, &mut out) {
        Ok(summary) => {
            info!("gridcast finished: {:?}", summary);
            Ok(())
        }
        Err(e) => {
            error!("Projection run failed: {:#}", e);
            Err(e)
        }
    }
}

/// Log to `logs/gridcast.log`. `GRIDCAST_LOG` takes precedence over
/// `RUST_LOG`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("gridcast.log"))?;

    let filter = EnvFilter::try_from_env("GRIDCAST_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("gridcast=info,warn"));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
