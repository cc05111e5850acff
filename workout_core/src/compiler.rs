//! Step tree compilation.
//!
//! Walks the step tree in order, expands repeat groups and produces the flat
//! record sequence. Groups are emitted once ("first pass"), then either
//! followed by a single repeat controller or physically re-emitted
//! `repeat - 1` more times. Indices are assigned in a final pass over the
//! expanded sequence, so they are always dense and zero-based.

use crate::config::{Capacities, CompileSettings};
use crate::error::{CompileError, ErrorKind, NodePath};
use crate::target::encode_target;
use crate::text::{trim_to_boundary, truncate_inline};
use crate::types::{
    CompiledRecord, ControllerCount, GroupStep, RepeatControllerRecord, RepeatMode, SimpleStep,
    StepNode, StepRecord, WorkoutOptions,
};
use crate::units::convert_duration;

/// Full note text of a step whose inline preview was truncated
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingNote {
    pub record_index: u32,
    pub text: String,
}

/// Output of [`compile`]: records plus the long text still to be chunked
#[derive(Clone, Debug, PartialEq)]
pub struct CompiledSteps {
    pub records: Vec<CompiledRecord>,
    pub pending_notes: Vec<PendingNote>,
}

/// Record under construction, before final indices are known
struct Draft {
    record: CompiledRecord,
    full_note: Option<String>,
}

struct StepCompiler<'a> {
    options: &'a WorkoutOptions,
    capacities: &'a Capacities,
    controller_count: ControllerCount,
    out: Vec<Draft>,
}

/// Compile a step tree into its flat record sequence
///
/// The first failing node aborts compilation; nothing partial is returned.
pub fn compile(
    steps: &[StepNode],
    options: &WorkoutOptions,
    settings: &CompileSettings,
) -> Result<CompiledSteps, CompileError> {
    let mut compiler = StepCompiler {
        options,
        capacities: &settings.capacities,
        controller_count: settings.controller_count,
        out: Vec::new(),
    };

    let steps_path = NodePath::root().key("steps");
    for (i, node) in steps.iter().enumerate() {
        let path = steps_path.index(i);
        match node {
            StepNode::Simple(step) => compiler.simple(step, &path)?,
            StepNode::Group(group) => compiler.group(group, &path)?,
        }
    }

    Ok(compiler.finish())
}

impl StepCompiler<'_> {
    /// Position the next record will take
    fn next_position(&self, path: &NodePath) -> Result<u32, CompileError> {
        u32::try_from(self.out.len()).map_err(|_| {
            ErrorKind::invalid("steps", "too many records to index").at(path.clone())
        })
    }

    fn simple(&mut self, step: &SimpleStep, path: &NodePath) -> Result<(), CompileError> {
        let position = self.next_position(path)?;

        let name = match &step.name {
            Some(name) => name.clone(),
            None => format!("Step {}", position),
        };
        let name = trim_to_boundary(&name, self.capacities.step_name).to_string();

        let (duration_kind, duration_value) =
            convert_duration(&step.duration).map_err(|kind| kind.at(path.key("duration")))?;
        let target = encode_target(&step.target, self.options.hr_offset_mode)
            .map_err(|kind| kind.at(path.key("target")))?;

        let (notes, full_note) = match &step.note {
            Some(note) => {
                let (preview, truncated) = truncate_inline(note, self.capacities.step_note);
                (Some(preview), truncated.then(|| note.clone()))
            }
            None => (None, None),
        };

        self.out.push(Draft {
            record: CompiledRecord::Step(StepRecord {
                index: position,
                name,
                intensity: step.intensity.unwrap_or(self.options.default_intensity),
                duration_kind,
                duration_value,
                target,
                notes,
            }),
            full_note,
        });
        Ok(())
    }

    fn group(&mut self, group: &GroupStep, path: &NodePath) -> Result<(), CompileError> {
        if group.children.is_empty() {
            return Err(ErrorKind::EmptyCollection("children").at(path.key("children")));
        }

        let repeat = group.repeat.unwrap_or(1);
        let mode = group.mode.unwrap_or(self.options.repeat_mode_default);
        self.check_expansion(group, repeat, mode, path)?;

        let start_index = self.next_position(path)?;
        self.emit_block(group, path)?;

        if repeat <= 1 {
            return Ok(());
        }

        match mode {
            RepeatMode::Controller => {
                let index = self.next_position(path)?;
                tracing::debug!(
                    "Group at {} repeats block from record {} {} times via controller",
                    path,
                    start_index,
                    repeat
                );
                self.out.push(Draft {
                    record: CompiledRecord::RepeatController(RepeatControllerRecord::new(
                        index,
                        start_index,
                        repeat,
                        self.controller_count,
                    )),
                    full_note: None,
                });
            }
            RepeatMode::Unroll => {
                tracing::debug!(
                    "Unrolling group at {} into {} passes of {} steps",
                    path,
                    repeat,
                    group.children.len()
                );
                for _ in 1..repeat {
                    self.emit_block(group, path)?;
                }
            }
        }
        Ok(())
    }

    /// Reject a group whose expansion would overflow the record index
    fn check_expansion(
        &self,
        group: &GroupStep,
        repeat: u32,
        mode: RepeatMode,
        path: &NodePath,
    ) -> Result<(), CompileError> {
        let children = group.children.len() as u64;
        let emitted = match mode {
            _ if repeat <= 1 => Some(children),
            RepeatMode::Controller => children.checked_add(1),
            RepeatMode::Unroll => children.checked_mul(u64::from(repeat)),
        };
        let total = emitted.and_then(|n| n.checked_add(self.out.len() as u64));
        match total {
            Some(total) if total <= u64::from(u32::MAX) => Ok(()),
            _ => Err(ErrorKind::invalid(
                "repeat",
                format!("group expands to more than {} records", u32::MAX),
            )
            .at(path.key("repeat"))),
        }
    }

    fn emit_block(&mut self, group: &GroupStep, path: &NodePath) -> Result<(), CompileError> {
        let children_path = path.key("children");
        for (i, child) in group.children.iter().enumerate() {
            self.simple(child, &children_path.index(i))?;
        }
        Ok(())
    }

    /// Assign final indices and collect pending long notes
    fn finish(self) -> CompiledSteps {
        let mut records = Vec::with_capacity(self.out.len());
        let mut pending_notes = Vec::new();

        for (index, draft) in (0u32..).zip(self.out) {
            let mut record = draft.record;
            record.set_index(index);
            if let Some(text) = draft.full_note {
                pending_notes.push(PendingNote {
                    record_index: index,
                    text,
                });
            }
            records.push(record);
        }

        CompiledSteps {
            records,
            pending_notes,
        }
    }
}
