//! Core domain types for the workout compiler.
//!
//! This module defines the fundamental types used throughout the system:
//! - The typed workout description (metadata, options, step tree)
//! - Duration and target specifications as authored
//! - Compiled step and repeat-controller records with device encodings
//! - Chunked text fragments and the assembled workout

use serde::{Deserialize, Serialize};

// ============================================================================
// Options
// ============================================================================

/// Convention for encoding absolute heart-rate values
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum HrOffsetMode {
    /// Absolute bpm is written with a +100 offset to tell it apart from zones
    #[default]
    #[serde(rename = "add_100")]
    Add100,
    #[serde(rename = "raw")]
    Raw,
}

impl HrOffsetMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "add_100" => Some(HrOffsetMode::Add100),
            "raw" => Some(HrOffsetMode::Raw),
            _ => None,
        }
    }
}

/// How a repeated group is expanded
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    /// Emit the block once followed by a single repeat-controller record
    #[default]
    Controller,
    /// Physically re-emit the block for every repetition
    #[serde(alias = "expand")]
    Unroll,
}

impl RepeatMode {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "controller" => Some(RepeatMode::Controller),
            "unroll" | "expand" => Some(RepeatMode::Unroll),
            _ => None,
        }
    }
}

/// Step intensity
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Warmup,
    #[default]
    Active,
    Rest,
    Cooldown,
    #[serde(alias = "repetition")]
    Interval,
}

impl Intensity {
    /// Device enumeration value
    pub fn code(self) -> u8 {
        match self {
            Intensity::Active => 0,
            Intensity::Rest => 1,
            Intensity::Warmup => 2,
            Intensity::Cooldown => 3,
            Intensity::Interval => 5,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Intensity::Active),
            1 => Some(Intensity::Rest),
            2 => Some(Intensity::Warmup),
            3 => Some(Intensity::Cooldown),
            5 => Some(Intensity::Interval),
            _ => None,
        }
    }

    /// Parse a case-insensitive name or a numeric device code
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase();
        match lowered.as_str() {
            "warmup" => Some(Intensity::Warmup),
            "active" => Some(Intensity::Active),
            "rest" => Some(Intensity::Rest),
            "cooldown" => Some(Intensity::Cooldown),
            "interval" | "repetition" => Some(Intensity::Interval),
            digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                digits.parse().ok().and_then(Self::from_code)
            }
            _ => None,
        }
    }
}

/// Sport of the workout. Only running is supported.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sport {
    #[default]
    Running,
}

impl Sport {
    pub fn code(self) -> u8 {
        match self {
            Sport::Running => 1,
        }
    }
}

/// Workout-level options, already resolved against configured defaults
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WorkoutOptions {
    pub hr_offset_mode: HrOffsetMode,
    pub default_intensity: Intensity,
    pub repeat_mode_default: RepeatMode,
}

// ============================================================================
// Workout Description (input)
// ============================================================================

/// Workout metadata section
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkoutMetadata {
    pub name: Option<String>,
    pub description: Option<String>,
    pub sport: Sport,
}

/// A complete, validated workout description
#[derive(Clone, Debug, PartialEq)]
pub struct WorkoutDescription {
    pub version: u32,
    pub metadata: WorkoutMetadata,
    pub options: WorkoutOptions,
    pub steps: Vec<StepNode>,
}

/// Node of the step tree
#[derive(Clone, Debug, PartialEq)]
pub enum StepNode {
    Simple(SimpleStep),
    Group(GroupStep),
}

/// A single exercise segment as authored
#[derive(Clone, Debug, PartialEq)]
pub struct SimpleStep {
    pub name: Option<String>,
    pub intensity: Option<Intensity>,
    pub duration: DurationSpec,
    pub target: TargetSpec,
    pub note: Option<String>,
}

impl SimpleStep {
    /// Open-ended step with no name, target or note
    pub fn open() -> Self {
        Self {
            name: None,
            intensity: None,
            duration: DurationSpec::Open,
            target: TargetSpec::Open,
            note: None,
        }
    }
}

/// A block of simple steps executed `repeat` times
#[derive(Clone, Debug, PartialEq)]
pub struct GroupStep {
    pub children: Vec<SimpleStep>,
    pub repeat: Option<u32>,
    pub mode: Option<RepeatMode>,
}

/// Unit of a measured duration
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    Seconds,
    Minutes,
    Kilometers,
    Meters,
    Calories,
    HrGreaterThan,
    HrLessThan,
}

/// Duration of a step as authored
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DurationSpec {
    Open,
    Measured { value: f64, unit: DurationUnit },
}

/// Target of a step as authored
///
/// Pace values are kept as written (`"4:30"` or `"270"`) and converted by the
/// target encoder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetSpec {
    Open,
    Pace(String),
    PaceRange { low: String, high: String },
    HeartRateZone(u32),
    HeartRateRange { low: u32, high: u32 },
    PowerZone(u32),
    PowerRange { low: u32, high: u32 },
    CadenceRange { low: u32, high: u32 },
}

// ============================================================================
// Compiled Records (output)
// ============================================================================

/// Encoded duration type of a step record
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DurationKind {
    Time,
    Distance,
    HrLessThan,
    HrGreaterThan,
    Calories,
    Open,
    RepeatUntilStepsComplete,
}

impl DurationKind {
    pub fn code(self) -> u8 {
        match self {
            DurationKind::Time => 0,
            DurationKind::Distance => 1,
            DurationKind::HrLessThan => 2,
            DurationKind::HrGreaterThan => 3,
            DurationKind::Calories => 4,
            DurationKind::Open => 5,
            DurationKind::RepeatUntilStepsComplete => 6,
        }
    }
}

/// Encoded target type of a step record
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Speed,
    HeartRate,
    Open,
    Cadence,
    Power,
}

impl TargetKind {
    pub fn code(self) -> u8 {
        match self {
            TargetKind::Speed => 0,
            TargetKind::HeartRate => 1,
            TargetKind::Open => 2,
            TargetKind::Cadence => 3,
            TargetKind::Power => 4,
        }
    }
}

/// Device encoding of a step target
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TargetRecord {
    pub kind: TargetKind,
    pub value: u32,
    pub custom_low: u32,
    pub custom_high: u32,
}

impl TargetRecord {
    pub fn open() -> Self {
        Self {
            kind: TargetKind::Open,
            value: 0,
            custom_low: 0,
            custom_high: 0,
        }
    }
}

/// One encoded exercise segment
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StepRecord {
    pub index: u32,
    pub name: String,
    pub intensity: Intensity,
    pub duration_kind: DurationKind,
    pub duration_value: u32,
    pub target: TargetRecord,
    /// Inline notes preview; the full text travels as chunks when truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Instruction to loop over a previously emitted block of step records
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepeatControllerRecord {
    pub index: u32,
    pub start_index: u32,
    /// Total executions of the block, including the first pass
    pub total_repeats: u32,
    /// Count the device stores, per the configured [`ControllerCount`]
    pub repeat_value: u32,
}

/// Count written into a repeat controller's target value
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ControllerCount {
    /// Total passes including the first
    #[default]
    Total,
    /// Extra passes beyond the first
    Additional,
}

/// Step-shaped view of a repeat controller as the device stores it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodedController {
    pub index: u32,
    pub duration_kind: DurationKind,
    pub duration_value: u32,
    pub target: TargetRecord,
}

impl ControllerCount {
    /// Value written for a block executed `total_repeats` times
    pub fn repeat_value(self, total_repeats: u32) -> u32 {
        match self {
            ControllerCount::Total => total_repeats,
            ControllerCount::Additional => total_repeats.saturating_sub(1),
        }
    }
}

impl RepeatControllerRecord {
    pub fn new(
        index: u32,
        start_index: u32,
        total_repeats: u32,
        convention: ControllerCount,
    ) -> Self {
        Self {
            index,
            start_index,
            total_repeats,
            repeat_value: convention.repeat_value(total_repeats),
        }
    }

    pub fn encoded(&self) -> EncodedController {
        EncodedController {
            index: self.index,
            duration_kind: DurationKind::RepeatUntilStepsComplete,
            duration_value: self.start_index,
            target: TargetRecord {
                value: self.repeat_value,
                ..TargetRecord::open()
            },
        }
    }
}

/// Entry of the compiled record sequence
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompiledRecord {
    Step(StepRecord),
    RepeatController(RepeatControllerRecord),
}

impl CompiledRecord {
    pub fn index(&self) -> u32 {
        match self {
            CompiledRecord::Step(step) => step.index,
            CompiledRecord::RepeatController(controller) => controller.index,
        }
    }

    pub(crate) fn set_index(&mut self, index: u32) {
        match self {
            CompiledRecord::Step(step) => step.index = index,
            CompiledRecord::RepeatController(controller) => controller.index = index,
        }
    }

    pub fn as_step(&self) -> Option<&StepRecord> {
        match self {
            CompiledRecord::Step(step) => Some(step),
            CompiledRecord::RepeatController(_) => None,
        }
    }

    pub fn as_controller(&self) -> Option<&RepeatControllerRecord> {
        match self {
            CompiledRecord::Step(_) => None,
            CompiledRecord::RepeatController(controller) => Some(controller),
        }
    }
}

// ============================================================================
// Chunked Text
// ============================================================================

/// Message kind a text chunk extends
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkTarget {
    WorkoutDescription,
    StepNotes,
}

impl ChunkTarget {
    /// Global message number of the owning record
    pub fn mesg_num(self) -> u16 {
        match self {
            ChunkTarget::WorkoutDescription => 26,
            ChunkTarget::StepNotes => 27,
        }
    }

    /// Field number of the text field being extended
    pub fn field_num(self) -> u8 {
        match self {
            ChunkTarget::WorkoutDescription => 17,
            ChunkTarget::StepNotes => 8,
        }
    }
}

/// A bounded fragment of long text linked to its owning record
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TextChunk {
    pub target: ChunkTarget,
    /// Message number of the owning record, from [`ChunkTarget::mesg_num`]
    pub mesg_num: u16,
    /// Field the payload extends, from [`ChunkTarget::field_num`]
    pub field_num: u8,
    pub parent_index: u32,
    pub part_index: u32,
    pub payload: Vec<u8>,
}

// ============================================================================
// Assembled Workout
// ============================================================================

/// Workout-level metadata record
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutHeader {
    pub name: String,
    pub sport: Sport,
    pub num_valid_steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_preview: Option<String>,
}

/// Final output of one compilation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CompiledWorkout {
    pub header: WorkoutHeader,
    pub records: Vec<CompiledRecord>,
    pub description_chunks: Vec<TextChunk>,
    pub note_chunks: Vec<TextChunk>,
}

/// Record and chunk counts of a compiled workout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompileSummary {
    pub steps: usize,
    pub controllers: usize,
    pub description_chunks: usize,
    pub note_chunks: usize,
}

impl CompiledWorkout {
    pub fn summary(&self) -> CompileSummary {
        let controllers = self
            .records
            .iter()
            .filter(|r| r.as_controller().is_some())
            .count();
        CompileSummary {
            steps: self.records.len() - controllers,
            controllers,
            description_chunks: self.description_chunks.len(),
            note_chunks: self.note_chunks.len(),
        }
    }

    /// File name stem derived from the workout name
    pub fn file_stem(&self) -> String {
        self.header.name.replace(' ', "_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intensity_parse_names_and_codes() {
        assert_eq!(Intensity::parse("WarmUp"), Some(Intensity::Warmup));
        assert_eq!(Intensity::parse("repetition"), Some(Intensity::Interval));
        assert_eq!(Intensity::parse("3"), Some(Intensity::Cooldown));
        assert_eq!(Intensity::parse("4"), None);
        assert_eq!(Intensity::parse("sprint"), None);
    }

    #[test]
    fn test_device_codes() {
        assert_eq!(Sport::Running.code(), 1);
        assert_eq!(ChunkTarget::WorkoutDescription.mesg_num(), 26);
        assert_eq!(ChunkTarget::WorkoutDescription.field_num(), 17);
        assert_eq!(ChunkTarget::StepNotes.mesg_num(), 27);
        assert_eq!(ChunkTarget::StepNotes.field_num(), 8);
        assert_eq!(DurationKind::RepeatUntilStepsComplete.code(), 6);
        assert_eq!(TargetKind::Power.code(), 4);
    }

    #[test]
    fn test_repeat_mode_accepts_expand_alias() {
        assert_eq!(RepeatMode::parse("expand"), Some(RepeatMode::Unroll));
        assert_eq!(RepeatMode::parse("Controller"), Some(RepeatMode::Controller));
        assert_eq!(RepeatMode::parse("loop"), None);
    }

    #[test]
    fn test_controller_encoding_conventions() {
        let total = RepeatControllerRecord::new(2, 0, 3, ControllerCount::Total).encoded();
        assert_eq!(total.duration_kind, DurationKind::RepeatUntilStepsComplete);
        assert_eq!(total.duration_value, 0);
        assert_eq!(total.target.kind, TargetKind::Open);
        assert_eq!(total.target.value, 3);

        let additional =
            RepeatControllerRecord::new(2, 0, 3, ControllerCount::Additional).encoded();
        assert_eq!(additional.target.value, 2);
        assert_eq!(ControllerCount::Additional.repeat_value(0), 0);
    }

    #[test]
    fn test_record_serializes_with_kind_tag() {
        let record = CompiledRecord::RepeatController(RepeatControllerRecord::new(
            4,
            1,
            2,
            ControllerCount::Additional,
        ));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "repeat_controller");
        assert_eq!(json["start_index"], 1);
        assert_eq!(json["total_repeats"], 2);
        assert_eq!(json["repeat_value"], 1);
    }

    #[test]
    fn test_hr_offset_mode_serde_names() {
        let json = serde_json::to_string(&HrOffsetMode::Add100).unwrap();
        assert_eq!(json, "\"add_100\"");
        assert_eq!(HrOffsetMode::parse("RAW"), Some(HrOffsetMode::Raw));
    }
}
