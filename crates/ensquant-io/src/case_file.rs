use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use ensquant_core::{Interpolation, SummaryCase, Time, F};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{IoError, Result};

/// Name of the report time column, seconds since the Unix epoch.
pub const TIME_COLUMN: &str = "time";

/// Arrow field metadata key overriding a series' interpolation.
pub const INTERPOLATION_METADATA: &str = "interpolation";

/// Read one Parquet summary table into a case.
///
/// Layout: a `time` column (Float64 or Int64) and one Float64 column per
/// series, named by its full key. Nulls are rejected.
pub fn load_case(path: &Path) -> Result<SummaryCase> {
    info!("Loading case: {}", path.display());

    let file = File::open(path).map_err(|e| IoError::file(path, e))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let time_index = schema
        .index_of(TIME_COLUMN)
        .map_err(|_| IoError::load(path, format!("missing `{TIME_COLUMN}` column")))?;

    let mut columns: Vec<(usize, &Field, Vec<F>)> = Vec::new();
    for (index, field) in schema.fields().iter().enumerate() {
        if index == time_index {
            continue;
        }
        if field.data_type() != &DataType::Float64 {
            return Err(IoError::load(
                path,
                format!("series `{}` has type {}, expected Float64", field.name(), field.data_type()),
            ));
        }
        columns.push((index, field.as_ref(), Vec::new()));
    }

    let mut times: Vec<Time> = Vec::new();
    for batch in reader {
        let batch = batch?;
        append_times(path, batch.column(time_index), &mut times)?;
        for (index, field, values) in columns.iter_mut() {
            append_values(path, field.name(), batch.column(*index), values)?;
        }
    }

    let mut case = SummaryCase::new(path.display().to_string(), times)?;
    for (_, field, values) in columns {
        let interpolation = match field.metadata().get(INTERPOLATION_METADATA) {
            Some(name) => Interpolation::parse(name).ok_or_else(|| {
                IoError::load(
                    path,
                    format!("series `{}`: unknown interpolation `{name}`", field.name()),
                )
            })?,
            None => Interpolation::for_key(field.name()),
        };
        case.insert_series(field.name(), values, interpolation)?;
    }

    debug!(
        case = %path.display(),
        reports = case.times().len(),
        series = case.series().count(),
        "case loaded"
    );
    Ok(case)
}

/// Load every case in parallel, keeping the order of `paths`. The first
/// failure aborts the whole load.
pub fn load_cases(paths: &[PathBuf]) -> Result<Vec<SummaryCase>> {
    paths.par_iter().map(|path| load_case(path)).collect()
}

fn append_times(path: &Path, column: &ArrayRef, times: &mut Vec<Time>) -> Result<()> {
    if column.null_count() > 0 {
        return Err(IoError::load(path, format!("null values in `{TIME_COLUMN}`")));
    }
    match column.data_type() {
        DataType::Float64 => {
            let array = column.as_any().downcast_ref::<Float64Array>().ok_or_else(|| {
                IoError::load(path, format!("unreadable `{TIME_COLUMN}` column"))
            })?;
            times.extend_from_slice(array.values());
        }
        DataType::Int64 => {
            let array = column.as_any().downcast_ref::<Int64Array>().ok_or_else(|| {
                IoError::load(path, format!("unreadable `{TIME_COLUMN}` column"))
            })?;
            times.extend(array.values().iter().map(|&secs| secs as Time));
        }
        other => {
            return Err(IoError::load(
                path,
                format!("`{TIME_COLUMN}` has type {other}, expected Float64 or Int64"),
            ))
        }
    }
    Ok(())
}

fn append_values(path: &Path, name: &str, column: &ArrayRef, values: &mut Vec<F>) -> Result<()> {
    if column.null_count() > 0 {
        return Err(IoError::load(path, format!("null values in series `{name}`")));
    }
    let array = column
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| IoError::load(path, format!("unreadable series `{name}`")))?;
    values.extend_from_slice(array.values());
    Ok(())
}

/// Write a case as a Parquet summary table readable by [`load_case`].
///
/// Each series column carries its interpolation as field metadata.
pub fn write_case(path: &Path, case: &SummaryCase) -> Result<()> {
    let mut fields = vec![Field::new(TIME_COLUMN, DataType::Float64, false)];
    let mut arrays: Vec<ArrayRef> = vec![Arc::new(Float64Array::from(case.times().to_vec()))];

    for (key, series) in case.series() {
        let metadata = HashMap::from([(
            INTERPOLATION_METADATA.to_string(),
            series.interpolation.as_str().to_string(),
        )]);
        fields.push(Field::new(key, DataType::Float64, false).with_metadata(metadata));
        arrays.push(Arc::new(Float64Array::from(series.values.clone())));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| IoError::file(parent, e))?;
    }
    let file = File::create(path).map_err(|e| IoError::file(path, e))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ensquant_core::Case;

    fn sample_case() -> SummaryCase {
        let mut case = SummaryCase::new("sample", vec![0.0, 86_400.0, 172_800.0]).unwrap();
        case.insert_series("FOPT", vec![0.0, 10.0, 30.0], Interpolation::Linear)
            .unwrap();
        case.insert_series("FOPR", vec![0.0, 10.0, 20.0], Interpolation::Linear)
            .unwrap();
        case
    }

    #[test]
    fn test_metadata_overrides_key_heuristic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/case.parquet");
        write_case(&path, &sample_case()).unwrap();

        let loaded = load_case(&path).unwrap();
        assert_eq!(loaded.times(), &[0.0, 86_400.0, 172_800.0]);
        // FOPR would default to step; the stored metadata says linear.
        assert_eq!(loaded.sample("FOPR", 43_200.0).unwrap(), 5.0);
        assert_eq!(loaded.sample("FOPT", 129_600.0).unwrap(), 20.0);
        assert_eq!(loaded.id(), path.display().to_string());
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_case(&dir.path().join("absent.parquet")).unwrap_err();
        assert!(matches!(err, IoError::File { .. }));
    }

    #[test]
    fn test_not_parquet_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CASE.DATA");
        std::fs::write(&path, "RUNSPEC\n").unwrap();
        assert!(matches!(load_case(&path), Err(IoError::Parquet(_))));
    }
}
