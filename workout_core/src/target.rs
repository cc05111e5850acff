//! Target encoding.
//!
//! Maps an authored [`TargetSpec`] to the device's target record. Ranges must
//! be strictly increasing as written, except pace ranges: a faster pace is a
//! smaller time per kilometer but a larger speed, so pace endpoints are
//! reordered after conversion instead of validated.

use crate::error::ErrorKind;
use crate::types::{HrOffsetMode, TargetKind, TargetRecord, TargetSpec};

/// Offset added to absolute bpm values under [`HrOffsetMode::Add100`]
pub const HR_ABSOLUTE_OFFSET: u32 = 100;

/// Encode a target specification
pub fn encode_target(
    spec: &TargetSpec,
    hr_offset_mode: HrOffsetMode,
) -> Result<TargetRecord, ErrorKind> {
    let record = match spec {
        TargetSpec::Open => TargetRecord::open(),
        TargetSpec::Pace(pace) => {
            let speed = pace_to_speed(pace)?;
            custom(TargetKind::Speed, speed, speed)
        }
        TargetSpec::PaceRange { low, high } => {
            let s1 = pace_to_speed(low)?;
            let s2 = pace_to_speed(high)?;
            custom(TargetKind::Speed, s1.min(s2), s1.max(s2))
        }
        TargetSpec::HeartRateZone(zone) => zone_record(TargetKind::HeartRate, *zone),
        TargetSpec::HeartRateRange { low, high } => {
            check_range(*low, *high)?;
            let (low, high) = match hr_offset_mode {
                HrOffsetMode::Add100 => (offset_bpm(*low)?, offset_bpm(*high)?),
                HrOffsetMode::Raw => (*low, *high),
            };
            custom(TargetKind::HeartRate, low, high)
        }
        TargetSpec::PowerZone(zone) => zone_record(TargetKind::Power, *zone),
        TargetSpec::PowerRange { low, high } => {
            check_range(*low, *high)?;
            custom(TargetKind::Power, *low, *high)
        }
        TargetSpec::CadenceRange { low, high } => {
            check_range(*low, *high)?;
            custom(TargetKind::Cadence, *low, *high)
        }
    };
    Ok(record)
}

/// Convert a pace per kilometer into speed in millimeters per second
///
/// Accepts whole seconds (`"300"`) or `mm:ss` (`"5:00"`).
pub fn pace_to_speed(pace: &str) -> Result<u32, ErrorKind> {
    let seconds = parse_pace_seconds(pace)?;
    if seconds == 0 {
        return Err(ErrorKind::invalid("pace", "pace must be greater than zero"));
    }
    let meters_per_second = 1000.0 / f64::from(seconds);
    Ok((meters_per_second * 1000.0).round() as u32)
}

fn parse_pace_seconds(pace: &str) -> Result<u32, ErrorKind> {
    let trimmed = pace.trim();
    let malformed = || ErrorKind::InvalidPaceFormat(pace.to_string());

    if is_digits(trimmed) {
        return trimmed.parse().map_err(|_| malformed());
    }

    let mut parts = trimmed.split(':');
    let (Some(mm), Some(ss), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };
    if !is_digits(mm) || !is_digits(ss) {
        return Err(malformed());
    }
    let minutes: u32 = mm.parse().map_err(|_| malformed())?;
    let seconds: u32 = ss.parse().map_err(|_| malformed())?;
    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(malformed)
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn check_range(low: u32, high: u32) -> Result<(), ErrorKind> {
    if high <= low {
        return Err(ErrorKind::InvalidRange { low, high });
    }
    Ok(())
}

fn offset_bpm(bpm: u32) -> Result<u32, ErrorKind> {
    bpm.checked_add(HR_ABSOLUTE_OFFSET)
        .ok_or_else(|| ErrorKind::invalid("heart_rate", "bpm too large to offset"))
}

fn custom(kind: TargetKind, low: u32, high: u32) -> TargetRecord {
    TargetRecord {
        kind,
        value: 0,
        custom_low: low,
        custom_high: high,
    }
}

fn zone_record(kind: TargetKind, zone: u32) -> TargetRecord {
    TargetRecord {
        kind,
        value: zone,
        custom_low: 0,
        custom_high: 0,
    }
}
