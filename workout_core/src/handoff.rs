//! Handoff document for the external binary encoder.
//!
//! The encoder owns framing, field definitions and checksums. It receives the
//! compiled workout together with the file identity it stamps on the output.

use crate::{CompiledWorkout, Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Manufacturer code the device accepts workout files from
pub const MANUFACTURER_GARMIN: u16 = 1;

/// Generic product id for files not produced by a device
pub const GENERIC_PRODUCT: u16 = 65534;

/// File identity stamped on the encoded workout
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileIdentity {
    pub file_type: String,
    pub manufacturer: u16,
    pub product: u16,
    pub serial_number: u32,
    pub time_created: DateTime<Utc>,
}

impl FileIdentity {
    /// Identity for a workout file created at `now`
    ///
    /// The serial number is the low 32 bits of the creation time in epoch
    /// milliseconds.
    pub fn workout(now: DateTime<Utc>) -> Self {
        Self {
            file_type: "workout".into(),
            manufacturer: MANUFACTURER_GARMIN,
            product: GENERIC_PRODUCT,
            serial_number: (now.timestamp_millis() & 0xFFFF_FFFF) as u32,
            time_created: now,
        }
    }
}

/// Everything the external encoder needs to write one workout file
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Handoff {
    pub file_id: FileIdentity,
    pub workout: CompiledWorkout,
}

impl Handoff {
    pub fn new(workout: CompiledWorkout, now: DateTime<Utc>) -> Self {
        Self {
            file_id: FileIdentity::workout(now),
            workout,
        }
    }

    /// Read a handoff document back
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let handoff = serde_json::from_str(&contents)?;
        tracing::debug!("Loaded handoff from {:?}", path);
        Ok(handoff)
    }

    /// Write the handoff document atomically
    ///
    /// Writes to a temp file in the target directory under an exclusive
    /// lock, syncs it, then renames it over `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer_pretty(&mut writer, self)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::info!("Wrote handoff to {:?}", path);
        Ok(())
    }
}
