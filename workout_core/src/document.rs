//! Validation of a parsed workout tree into the typed model.
//!
//! The caller hands over an already-parsed map/list/scalar tree (from YAML or
//! JSON). This is the only place that inspects untyped values; the compiler
//! works exclusively on [`WorkoutDescription`].

use crate::error::{CompileError, ErrorKind, NodePath};
use crate::types::{
    DurationSpec, DurationUnit, GroupStep, HrOffsetMode, Intensity, RepeatMode, SimpleStep, Sport,
    StepNode, TargetSpec, WorkoutDescription, WorkoutMetadata, WorkoutOptions,
};
use serde_json::{Map, Value};

type Parsed<T> = std::result::Result<T, CompileError>;

/// Keys that identify a map as a simple step when `type` is absent
const SIMPLE_STEP_KEYS: &[&str] = &["name", "intensity", "duration", "target", "note"];

/// Validate `root` into a workout description
///
/// Absent `options` keys fall back to `defaults`.
pub fn parse_workout(root: &Value, defaults: &WorkoutOptions) -> Parsed<WorkoutDescription> {
    let path = NodePath::root();
    let root = as_map(root, &path, "a workout map")?;

    let version = match field(root, "version") {
        Some(value) => {
            let version = integer(value, &path.key("version"), "version")?;
            if version == 0 {
                return Err(ErrorKind::invalid("version", "must be at least 1").at(path.key("version")));
            }
            version
        }
        None => 1,
    };

    let metadata_path = path.key("metadata");
    let metadata = field(root, "metadata")
        .ok_or_else(|| ErrorKind::MissingSection("metadata").at(metadata_path.clone()))?;
    let metadata = parse_metadata(as_map(metadata, &metadata_path, "a metadata map")?, &metadata_path)?;

    let options = match field(root, "options") {
        Some(value) => {
            let options_path = path.key("options");
            parse_options(as_map(value, &options_path, "an options map")?, &options_path, defaults)?
        }
        None => *defaults,
    };

    let steps_path = path.key("steps");
    let steps = field(root, "steps")
        .ok_or_else(|| ErrorKind::MissingSection("steps").at(steps_path.clone()))?;
    let steps = as_list(steps, &steps_path, "a list of steps")?;
    if steps.is_empty() {
        return Err(ErrorKind::EmptyCollection("steps").at(steps_path));
    }
    let steps = steps
        .iter()
        .enumerate()
        .map(|(i, step)| parse_step(step, &steps_path.index(i)))
        .collect::<Parsed<Vec<_>>>()?;

    Ok(WorkoutDescription {
        version,
        metadata,
        options,
        steps,
    })
}

fn parse_metadata(map: &Map<String, Value>, path: &NodePath) -> Parsed<WorkoutMetadata> {
    let name = text(map, "name", path)?;
    let description = text(map, "description", path)?.filter(|d| !d.trim().is_empty());
    let sport = match text(map, "sport", path)? {
        None => Sport::Running,
        Some(sport) if sport.trim().eq_ignore_ascii_case("running") => Sport::Running,
        Some(sport) => {
            return Err(ErrorKind::invalid("sport", format!("'{}' is not supported, only running", sport))
                .at(path.key("sport")))
        }
    };

    Ok(WorkoutMetadata {
        name,
        description,
        sport,
    })
}

fn parse_options(
    map: &Map<String, Value>,
    path: &NodePath,
    defaults: &WorkoutOptions,
) -> Parsed<WorkoutOptions> {
    let mut options = *defaults;

    if let Some(raw) = text(map, "hr_offset_mode", path)? {
        options.hr_offset_mode = HrOffsetMode::parse(&raw).ok_or_else(|| {
            ErrorKind::invalid("hr_offset_mode", format!("unknown mode '{}'", raw))
                .at(path.key("hr_offset_mode"))
        })?;
    }
    if let Some(raw) = text(map, "default_intensity", path)? {
        options.default_intensity = Intensity::parse(&raw).ok_or_else(|| {
            ErrorKind::invalid("default_intensity", format!("unknown intensity '{}'", raw))
                .at(path.key("default_intensity"))
        })?;
    }
    if let Some(raw) = text(map, "repeat_mode_default", path)? {
        options.repeat_mode_default = RepeatMode::parse(&raw).ok_or_else(|| {
            ErrorKind::invalid("repeat_mode_default", format!("unknown repeat mode '{}'", raw))
                .at(path.key("repeat_mode_default"))
        })?;
    }

    Ok(options)
}

fn parse_step(value: &Value, path: &NodePath) -> Parsed<StepNode> {
    let map = as_map(value, path, "a step map")?;
    match step_type(map, path)?.as_str() {
        "simple" => Ok(StepNode::Simple(parse_simple(map, path)?)),
        "group" => Ok(StepNode::Group(parse_group(map, path)?)),
        other => Err(ErrorKind::UnsupportedStepType(other.to_string()).at(path.key("type"))),
    }
}

/// Explicit `type`, else inferred from the keys present
fn step_type(map: &Map<String, Value>, path: &NodePath) -> Parsed<String> {
    if let Some(kind) = text(map, "type", path)? {
        return Ok(kind.trim().to_lowercase());
    }
    if map.contains_key("children") {
        return Ok("group".into());
    }
    if SIMPLE_STEP_KEYS.iter().any(|key| map.contains_key(*key)) {
        return Ok("simple".into());
    }
    Err(ErrorKind::UnsupportedStepType("<none>".into()).at(path.clone()))
}

fn parse_group(map: &Map<String, Value>, path: &NodePath) -> Parsed<GroupStep> {
    let children_path = path.key("children");
    let children = match field(map, "children") {
        Some(value) => as_list(value, &children_path, "a list of steps")?,
        None => return Err(ErrorKind::EmptyCollection("children").at(children_path)),
    };
    if children.is_empty() {
        return Err(ErrorKind::EmptyCollection("children").at(children_path));
    }

    let children = children
        .iter()
        .enumerate()
        .map(|(i, child)| {
            let child_path = children_path.index(i);
            let child = as_map(child, &child_path, "a step map")?;
            match step_type(child, &child_path)?.as_str() {
                "simple" => parse_simple(child, &child_path),
                other => Err(ErrorKind::UnsupportedStepType(other.to_string()).at(child_path)),
            }
        })
        .collect::<Parsed<Vec<_>>>()?;

    let repeat = field(map, "repeat")
        .map(|value| integer(value, &path.key("repeat"), "repeat"))
        .transpose()?;

    let mode = match text(map, "mode", path)? {
        Some(raw) => Some(RepeatMode::parse(&raw).ok_or_else(|| {
            ErrorKind::invalid("mode", format!("unknown repeat mode '{}'", raw)).at(path.key("mode"))
        })?),
        None => None,
    };

    Ok(GroupStep {
        children,
        repeat,
        mode,
    })
}

fn parse_simple(map: &Map<String, Value>, path: &NodePath) -> Parsed<SimpleStep> {
    let name = text(map, "name", path)?.filter(|n| !n.trim().is_empty());

    let intensity = match text(map, "intensity", path)? {
        Some(raw) => Some(Intensity::parse(&raw).ok_or_else(|| {
            ErrorKind::invalid("intensity", format!("unknown intensity '{}'", raw))
                .at(path.key("intensity"))
        })?),
        None => None,
    };

    let duration = match field(map, "duration") {
        Some(value) => {
            let duration_path = path.key("duration");
            parse_duration(as_map(value, &duration_path, "a duration map")?, &duration_path)?
        }
        None => DurationSpec::Open,
    };

    let target = match field(map, "target") {
        Some(value) => {
            let target_path = path.key("target");
            parse_target(as_map(value, &target_path, "a target map")?, &target_path)?
        }
        None => TargetSpec::Open,
    };

    let note = text(map, "note", path)?.filter(|n| {
        let keep = !n.trim().is_empty();
        if !keep {
            tracing::debug!("Ignoring blank note at {}", path);
        }
        keep
    });

    Ok(SimpleStep {
        name,
        intensity,
        duration,
        target,
        note,
    })
}

fn parse_duration(map: &Map<String, Value>, path: &NodePath) -> Parsed<DurationSpec> {
    if flag(map, "open") {
        return Ok(DurationSpec::Open);
    }

    let value_path = path.key("value");
    let value = field(map, "value")
        .ok_or_else(|| ErrorKind::MissingDurationField("value").at(value_path.clone()))?;
    let value = number(value, &value_path, "duration.value")?;
    if value <= 0.0 {
        return Err(ErrorKind::invalid("duration.value", "must be greater than zero").at(value_path));
    }

    let unit_path = path.key("unit");
    let unit = text(map, "unit", path)?
        .ok_or_else(|| ErrorKind::MissingDurationField("unit").at(unit_path.clone()))?;
    let unit = DurationUnit::parse(&unit)
        .ok_or_else(|| ErrorKind::UnsupportedDurationUnit(unit.clone()).at(unit_path))?;

    Ok(DurationSpec::Measured { value, unit })
}

fn parse_target(map: &Map<String, Value>, path: &NodePath) -> Parsed<TargetSpec> {
    let kind = text(map, "type", path)?
        .ok_or_else(|| ErrorKind::MissingRequiredField("type").at(path.key("type")))?;

    let target = match kind.trim().to_lowercase().as_str() {
        "open" => TargetSpec::Open,
        "pace" => TargetSpec::Pace(required_text(map, "value", path)?),
        "pace_range" => TargetSpec::PaceRange {
            low: required_text(map, "low", path)?,
            high: required_text(map, "high", path)?,
        },
        "heart_rate_zone" => TargetSpec::HeartRateZone(zone(map, path)?),
        "heart_rate_range" => {
            let (low, high) = bounds(map, path)?;
            TargetSpec::HeartRateRange { low, high }
        }
        "power_zone" => TargetSpec::PowerZone(zone(map, path)?),
        "power_range" => {
            let (low, high) = bounds(map, path)?;
            TargetSpec::PowerRange { low, high }
        }
        "cadence_range" => {
            let (low, high) = bounds(map, path)?;
            TargetSpec::CadenceRange { low, high }
        }
        _ => return Err(ErrorKind::UnsupportedTargetType(kind).at(path.key("type"))),
    };
    Ok(target)
}

fn zone(map: &Map<String, Value>, path: &NodePath) -> Parsed<u32> {
    let zone = required_integer(map, "zone", path)?;
    if zone == 0 {
        return Err(ErrorKind::invalid("zone", "zones start at 1").at(path.key("zone")));
    }
    Ok(zone)
}

fn bounds(map: &Map<String, Value>, path: &NodePath) -> Parsed<(u32, u32)> {
    Ok((
        required_integer(map, "low", path)?,
        required_integer(map, "high", path)?,
    ))
}

// ============================================================================
// Scalar helpers
// ============================================================================

/// Present, non-null entry
fn field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn as_map<'a>(
    value: &'a Value,
    path: &NodePath,
    expected: &'static str,
) -> Parsed<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| ErrorKind::MalformedNode { expected }.at(path.clone()))
}

fn as_list<'a>(value: &'a Value, path: &NodePath, expected: &'static str) -> Parsed<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| ErrorKind::MalformedNode { expected }.at(path.clone()))
}

/// Scalar rendered as text; numbers and booleans are accepted as written
fn text(map: &Map<String, Value>, key: &'static str, path: &NodePath) -> Parsed<Option<String>> {
    match field(map, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(ErrorKind::MalformedNode { expected: "a text value" }.at(path.key(key))),
    }
}

fn required_text(map: &Map<String, Value>, key: &'static str, path: &NodePath) -> Parsed<String> {
    text(map, key, path)?.ok_or_else(|| ErrorKind::MissingRequiredField(key).at(path.key(key)))
}

fn required_integer(map: &Map<String, Value>, key: &'static str, path: &NodePath) -> Parsed<u32> {
    let value =
        field(map, key).ok_or_else(|| ErrorKind::MissingRequiredField(key).at(path.key(key)))?;
    integer(value, &path.key(key), key)
}

/// Non-negative integer that fits a 32-bit device field
fn integer(value: &Value, path: &NodePath, field: &'static str) -> Parsed<u32> {
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            ErrorKind::invalid(field, format!("expected a non-negative integer, got {}", value))
                .at(path.clone())
        })
}

fn number(value: &Value, path: &NodePath, field: &'static str) -> Parsed<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|f| f.is_finite()).ok_or_else(|| {
        ErrorKind::invalid(field, format!("expected a number, got {}", value)).at(path.clone())
    })
}

/// `true` for a boolean true or the text "true" in any case
fn flag(map: &Map<String, Value>, key: &str) -> bool {
    match field(map, key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}
