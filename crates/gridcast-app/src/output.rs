// JSON-lines emission of projection batches.

use gridcast_core::engine::{PlayerFailure, ProjectionBatch};
use gridcast_core::seasonal::SeasonalProjection;
use gridcast_core::weekly::WeeklyProjection;
use serde::Serialize;
use std::io::{self, Write};

/// One output line. `kind` tells consumers which record shape follows.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Line<'a> {
    Weekly(&'a WeeklyProjection),
    Seasonal(&'a SeasonalProjection),
    Failure {
        player_id: &'a str,
        error: String,
        recoverable: bool,
    },
}

fn write_line<W: Write>(out: &mut W, line: &Line<'_>) -> io::Result<()> {
    serde_json::to_writer(&mut *out, line).map_err(io::Error::from)?;
    out.write_all(b"\n")
}

fn write_failures<W: Write>(out: &mut W, failures: &[PlayerFailure]) -> io::Result<()> {
    for failure in failures {
        write_line(
            out,
            &Line::Failure {
                player_id: &failure.player_id,
                error: failure.error.to_string(),
                recoverable: failure.error.is_recoverable(),
            },
        )?;
    }
    Ok(())
}

/// Ranked projections first, then failures. Returns lines written.
pub fn write_weekly<W: Write>(out: &mut W, batch: &ProjectionBatch<WeeklyProjection>) -> io::Result<usize> {
    for projection in &batch.projections {
        write_line(out, &Line::Weekly(projection))?;
    }
    write_failures(out, &batch.failures)?;
    Ok(batch.projections.len() + batch.failures.len())
}

pub fn write_seasonal<W: Write>(
    out: &mut W,
    batch: &ProjectionBatch<SeasonalProjection>,
) -> io::Result<usize> {
    for projection in &batch.projections {
        write_line(out, &Line::Seasonal(projection))?;
    }
    write_failures(out, &batch.failures)?;
    Ok(batch.projections.len() + batch.failures.len())
}
