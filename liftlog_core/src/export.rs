//! CSV export of the daily progress series.

use crate::aggregate::{DaySummary, TimeRange};
use crate::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: String,
    label: String,
    workouts: usize,
    total_volume: f64,
    total_reps: i64,
    exercises: usize,
}

impl CsvRow {
    fn new(day: &DaySummary, range: TimeRange) -> Self {
        CsvRow {
            date: day.date.format("%Y-%m-%d").to_string(),
            label: day.label(range),
            workouts: day.workouts,
            total_volume: day.total_volume,
            total_reps: day.total_reps,
            exercises: day.exercises,
        }
    }
}

/// Write the series with a header row
pub fn write_series_csv<W: Write>(writer: W, range: TimeRange, days: &[DaySummary]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
    for day in days {
        writer.serialize(CsvRow::new(day, range))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the series to a file, replacing it if present
pub fn export_series(path: &Path, range: TimeRange, days: &[DaySummary]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    write_series_csv(&file, range, days)?;
    file.sync_all()?;

    tracing::info!("Exported {} days of {} progress to {:?}", days.len(), range, path);
    Ok(days.len())
}
