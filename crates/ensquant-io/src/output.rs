use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::DateTime;
use ensquant_core::{Ensemble, OutputTarget, TableEvaluator, Time};
use rayon::prelude::*;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::{IoError, Result};

/// Cell text for a quantile no case contributed to.
pub const MISSING_SENTINEL: &str = "NaN";

const HEADER_PREFIX: &str = "-- DATE        DAYS     ";
const SEPARATOR_PREFIX: &str = "--------------------------";
const SEPARATOR_COLUMN: &str = "-------------------------";
const COLUMN_WIDTH: usize = 24;

/// What was written for one output target.
#[derive(Clone, Debug, PartialEq)]
pub struct TableSummary {
    pub rows: usize,
    pub columns: usize,
    /// Cells written as [`MISSING_SENTINEL`].
    pub missing: usize,
}

/// Write the quantile table of `target` to `out`: a header, a separator and
/// one row per grid point.
pub fn write_table<W: Write>(
    out: &mut W,
    ensemble: &Ensemble,
    target: &OutputTarget,
) -> Result<TableSummary> {
    let io = |e| IoError::file(&target.destination, e);

    write!(out, "{HEADER_PREFIX}").map_err(io)?;
    for token in target.tokens() {
        write!(out, "{token:>COLUMN_WIDTH$} ").map_err(io)?;
    }
    writeln!(out).map_err(io)?;
    write!(out, "{SEPARATOR_PREFIX}").map_err(io)?;
    for _ in &target.requests {
        write!(out, "{SEPARATOR_COLUMN}").map_err(io)?;
    }
    writeln!(out).map_err(io)?;

    let mut evaluator = TableEvaluator::new(ensemble, target);
    let mut summary = TableSummary {
        rows: 0,
        columns: target.requests.len(),
        missing: 0,
    };
    for index in 0..evaluator.len() {
        let row = evaluator.evaluate_row(index)?;
        write!(out, "{}  {:10.2}  ", format_date(row.time)?, row.days).map_err(io)?;
        for value in &row.values {
            match value {
                Some(v) => write!(out, "{v:COLUMN_WIDTH$.5} ").map_err(io)?,
                None => write!(out, "{MISSING_SENTINEL:>COLUMN_WIDTH$} ").map_err(io)?,
            }
        }
        writeln!(out).map_err(io)?;
        summary.rows += 1;
        summary.missing += row.missing();
    }
    Ok(summary)
}

/// Create the destination of `target` (and its parent directories) and
/// write its table. The table goes to a temporary file in the same
/// directory and replaces the destination only once complete, so a failed
/// evaluation leaves no partial table.
pub fn write_target(ensemble: &Ensemble, target: &OutputTarget) -> Result<TableSummary> {
    let path = target.destination.as_path();
    info!("Creating output file: {}", path.display());

    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            std::fs::create_dir_all(parent).map_err(|e| IoError::file(parent, e))?;
            parent
        }
        None => Path::new("."),
    };
    let staging = NamedTempFile::new_in(parent).map_err(|e| IoError::file(parent, e))?;
    let mut out = BufWriter::new(staging);
    let summary = write_table(&mut out, ensemble, target)?;
    let staging = out
        .into_inner()
        .map_err(|e| IoError::file(path, e.into_error()))?;
    staging
        .persist(path)
        .map_err(|e| IoError::file(path, e.error))?;

    if summary.missing > 0 {
        warn!(
            "{}: {} cells without covering cases written as {MISSING_SENTINEL}",
            path.display(),
            summary.missing
        );
    }
    Ok(summary)
}

/// Write all targets in parallel; each worker evaluates with its own cache.
/// Destinations must be distinct, which `RunConfig` guarantees.
pub fn write_targets(ensemble: &Ensemble, targets: &[OutputTarget]) -> Result<Vec<TableSummary>> {
    targets
        .par_iter()
        .map(|target| write_target(ensemble, target))
        .collect()
}

/// `DD.MM.YYYY` of a timestamp, in UTC.
pub fn format_date(t: Time) -> Result<String> {
    let secs = t.floor();
    let nanos = ((t - secs) * 1e9) as u32;
    let date = DateTime::from_timestamp(secs as i64, nanos.min(999_999_999))
        .filter(|_| t.is_finite())
        .ok_or(IoError::Timestamp(t))?;
    Ok(date.format("%d.%m.%Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ensquant_core::{EnsembleBuilder, SummaryCase, SECONDS_PER_DAY};

    /// 2020-01-01T00:00:00Z
    const JAN_2020: Time = 1_577_836_800.0;

    fn ensemble() -> Ensemble {
        let mut builder = EnsembleBuilder::new();
        for (id, start, end, value) in [
            ("a", 0.0, 10.0, 1.0),
            ("b", 0.0, 10.0, 3.0),
            ("c", 20.0, 30.0, 5.0),
        ] {
            builder.add_case(
                SummaryCase::new(id, vec![JAN_2020 + start * SECONDS_PER_DAY, JAN_2020 + end * SECONDS_PER_DAY])
                    .and_then(|c| c.with_series("FOPT", vec![value, value]))
                    .unwrap(),
            );
        }
        builder.build(7).unwrap()
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(JAN_2020).unwrap(), "01.01.2020");
        assert_eq!(format_date(JAN_2020 + 45.5 * SECONDS_PER_DAY).unwrap(), "15.02.2020");
        assert!(format_date(f64::NAN).is_err());
    }

    #[test]
    fn test_table_layout() {
        let ensemble = ensemble();
        let target = OutputTarget::parse("unused", ["FOPT:0.5", "FOPT:0.0"]).unwrap();
        let mut out = Vec::new();
        let summary = write_table(&mut out, &ensemble, &target).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(summary, TableSummary { rows: 7, columns: 2, missing: 2 });
        assert_eq!(lines.len(), 2 + 7);
        assert_eq!(
            lines[0],
            format!("{HEADER_PREFIX}{:>24} {:>24} ", "FOPT:0.5", "FOPT:0.0")
        );
        assert_eq!(lines[1].len(), SEPARATOR_PREFIX.len() + 2 * SEPARATOR_COLUMN.len());
        assert_eq!(
            lines[2],
            format!("01.01.2020  {:>10}  {:>24} {:>24} ", "0.00", "2.00000", "1.00000")
        );
        assert_eq!(
            lines[4],
            format!("11.01.2020  {:>10}  {:>24} {:>24} ", "10.00", "2.00000", "1.00000")
        );
        // Day 15 falls between the two groups of cases.
        assert_eq!(
            lines[5],
            format!("16.01.2020  {:>10}  {:>24} {:>24} ", "15.00", "NaN", "NaN")
        );
        assert_eq!(
            lines[6],
            format!("21.01.2020  {:>10}  {:>24} {:>24} ", "20.00", "5.00000", "5.00000")
        );
    }

    #[test]
    fn test_write_target_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let ensemble = ensemble();
        let target = OutputTarget::parse(dir.path().join("a/b/P90"), ["FOPT:0.9"]).unwrap();
        let summary = write_target(&ensemble, &target).unwrap();
        assert_eq!(summary.rows, 7);
        let text = std::fs::read_to_string(&target.destination).unwrap();
        assert!(text.starts_with(HEADER_PREFIX));
        assert_eq!(text.lines().count(), 9);
    }
}
