//! Flat CSV view of compiled records.
//!
//! One row per record in emission order, with repeat controllers shown in the
//! step-shaped encoding the device stores.

use crate::{CompiledRecord, CompiledWorkout, Result};
use std::io::Write;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    index: u32,
    kind: &'static str,
    name: String,
    intensity: Option<u8>,
    duration_type: u8,
    duration_value: u32,
    target_type: u8,
    target_value: u32,
    custom_low: u32,
    custom_high: u32,
    notes: Option<String>,
}

impl CsvRow {
    fn from_record(record: &CompiledRecord) -> Self {
        match record {
            CompiledRecord::Step(step) => CsvRow {
                index: step.index,
                kind: "step",
                name: step.name.clone(),
                intensity: Some(step.intensity.code()),
                duration_type: step.duration_kind.code(),
                duration_value: step.duration_value,
                target_type: step.target.kind.code(),
                target_value: step.target.value,
                custom_low: step.target.custom_low,
                custom_high: step.target.custom_high,
                notes: step.notes.clone(),
            },
            CompiledRecord::RepeatController(controller) => {
                let encoded = controller.encoded();
                CsvRow {
                    index: encoded.index,
                    kind: "repeat",
                    name: String::new(),
                    intensity: None,
                    duration_type: encoded.duration_kind.code(),
                    duration_value: encoded.duration_value,
                    target_type: encoded.target.kind.code(),
                    target_value: encoded.target.value,
                    custom_low: encoded.target.custom_low,
                    custom_high: encoded.target.custom_high,
                    notes: None,
                }
            }
        }
    }
}

/// Write the record table of `workout` to any writer
pub fn write_records<W: Write>(writer: W, workout: &CompiledWorkout) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in &workout.records {
        writer.serialize(CsvRow::from_record(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the record table of `workout` to `path`
pub fn write_records_to(path: &Path, workout: &CompiledWorkout) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_records(std::io::BufWriter::new(file), workout)?;
    tracing::info!("Wrote {} records to {:?}", workout.records.len(), path);
    Ok(())
}
