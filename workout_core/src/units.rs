//! Conversion of human duration units into device-native integers.
//!
//! Time is encoded in milliseconds, distance in centimeters, calories and
//! heart-rate thresholds as whole numbers. Every conversion multiplies in
//! `f64` and truncates toward zero.

use crate::error::ErrorKind;
use crate::types::{DurationKind, DurationSpec, DurationUnit};

impl DurationUnit {
    /// Look up a unit name, case-insensitively
    ///
    /// `m` is meters; minutes are spelled `min`, `mins`, `minute` or `minutes`.
    pub fn parse(raw: &str) -> Option<Self> {
        let unit = raw.trim().to_lowercase();
        let parsed = match unit.as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => DurationUnit::Seconds,
            "min" | "mins" | "minute" | "minutes" => DurationUnit::Minutes,
            "km" => DurationUnit::Kilometers,
            "m" => DurationUnit::Meters,
            "cal" | "calories" => DurationUnit::Calories,
            "hr_greater_than" => DurationUnit::HrGreaterThan,
            "hr_less_than" => DurationUnit::HrLessThan,
            _ => return None,
        };
        Some(parsed)
    }

    /// Encoded duration type and multiplier into the device unit
    fn encoding(self) -> (DurationKind, f64) {
        match self {
            DurationUnit::Seconds => (DurationKind::Time, 1000.0),
            DurationUnit::Minutes => (DurationKind::Time, 60_000.0),
            DurationUnit::Kilometers => (DurationKind::Distance, 1000.0 * 100.0),
            DurationUnit::Meters => (DurationKind::Distance, 100.0),
            DurationUnit::Calories => (DurationKind::Calories, 1.0),
            DurationUnit::HrGreaterThan => (DurationKind::HrGreaterThan, 1.0),
            DurationUnit::HrLessThan => (DurationKind::HrLessThan, 1.0),
        }
    }
}

/// Convert a duration specification into its device encoding
pub fn convert_duration(spec: &DurationSpec) -> Result<(DurationKind, u32), ErrorKind> {
    match *spec {
        DurationSpec::Open => Ok((DurationKind::Open, 0)),
        DurationSpec::Measured { value, unit } => {
            let (kind, factor) = unit.encoding();
            Ok((kind, truncate_to_u32(value * factor, "duration.value")?))
        }
    }
}

/// Truncate toward zero into a 32-bit device field
pub(crate) fn truncate_to_u32(scaled: f64, field: &'static str) -> Result<u32, ErrorKind> {
    if !scaled.is_finite() || scaled < 0.0 {
        return Err(ErrorKind::invalid(
            field,
            format!("{} is not a non-negative number", scaled),
        ));
    }
    if scaled >= (u64::from(u32::MAX) + 1) as f64 {
        return Err(ErrorKind::invalid(
            field,
            format!("{} does not fit the device field", scaled),
        ));
    }
    Ok(scaled.trunc() as u32)
}
