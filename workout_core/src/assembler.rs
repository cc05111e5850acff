//! Workout assembly.
//!
//! Builds the workout header, runs the step compiler and turns every piece of
//! long text into chunk sequences linked to its owning record.

use crate::compiler::compile;
use crate::config::CompileSettings;
use crate::error::CompileError;
use crate::text::{chunk, sanitize_name, trim_to_boundary, truncate_inline};
use crate::types::{ChunkTarget, CompiledWorkout, TextChunk, WorkoutDescription, WorkoutHeader};

/// Name used when the workout has none
pub const FALLBACK_WORKOUT_NAME: &str = "Workout";

/// Compile a workout description into records and text chunks
pub fn assemble(
    workout: &WorkoutDescription,
    settings: &CompileSettings,
) -> Result<CompiledWorkout, CompileError> {
    let capacities = &settings.capacities;
    let compiled = compile(&workout.steps, &workout.options, settings)?;

    let description = workout.metadata.description.as_deref();
    let header = WorkoutHeader {
        name: header_name(workout.metadata.name.as_deref(), capacities.workout_name),
        sport: workout.metadata.sport,
        num_valid_steps: u32::try_from(compiled.records.len()).unwrap_or(u32::MAX),
        description_preview: description
            .map(|text| truncate_inline(text, capacities.description).0),
    };

    // The full description is always chunked, even when the preview holds it
    let description_chunks = description
        .map(|text| {
            chunk_text(
                text,
                ChunkTarget::WorkoutDescription,
                0,
                capacities.chunk_payload,
            )
        })
        .unwrap_or_default();

    let note_chunks: Vec<TextChunk> = compiled
        .pending_notes
        .iter()
        .flat_map(|note| {
            chunk_text(
                &note.text,
                ChunkTarget::StepNotes,
                note.record_index,
                capacities.chunk_payload,
            )
        })
        .collect();

    tracing::info!(
        "Compiled workout '{}': {} records, {} description chunks, {} note chunks",
        header.name,
        compiled.records.len(),
        description_chunks.len(),
        note_chunks.len()
    );

    Ok(CompiledWorkout {
        header,
        records: compiled.records,
        description_chunks,
        note_chunks,
    })
}

/// Split `text` into chunks owned by record `parent_index`
pub fn chunk_text(
    text: &str,
    target: ChunkTarget,
    parent_index: u32,
    capacity: usize,
) -> Vec<TextChunk> {
    (0u32..)
        .zip(chunk(text.as_bytes(), capacity))
        .map(|(part_index, payload)| TextChunk {
            target,
            mesg_num: target.mesg_num(),
            field_num: target.field_num(),
            parent_index,
            part_index,
            payload: payload.to_vec(),
        })
        .collect()
}

/// Device-safe workout name
fn header_name(name: Option<&str>, capacity: usize) -> String {
    let sanitized = sanitize_name(name.unwrap_or(FALLBACK_WORKOUT_NAME));
    let sanitized = if sanitized.trim().is_empty() {
        FALLBACK_WORKOUT_NAME.to_string()
    } else {
        sanitized
    };
    trim_to_boundary(&sanitized, capacity).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        GroupStep, RepeatMode, SimpleStep, StepNode, WorkoutMetadata, WorkoutOptions,
    };

    fn workout(description: Option<&str>, steps: Vec<StepNode>) -> WorkoutDescription {
        WorkoutDescription {
            version: 1,
            metadata: WorkoutMetadata {
                name: Some("Hill Repeats: 6x90s!".into()),
                description: description.map(str::to_string),
                ..WorkoutMetadata::default()
            },
            options: WorkoutOptions::default(),
            steps,
        }
    }

    fn two_step_group(mode: RepeatMode) -> Vec<StepNode> {
        vec![StepNode::Group(GroupStep {
            children: vec![
                SimpleStep {
                    name: Some("Up".into()),
                    ..SimpleStep::open()
                },
                SimpleStep {
                    name: Some("Down".into()),
                    ..SimpleStep::open()
                },
            ],
            repeat: Some(3),
            mode: Some(mode),
        })]
    }

    #[test]
    fn test_end_to_end_controller() {
        let compiled = assemble(
            &workout(None, two_step_group(RepeatMode::Controller)),
            &CompileSettings::default(),
        )
        .unwrap();

        assert_eq!(compiled.records.len(), 3);
        let controller = compiled.records[2].as_controller().unwrap();
        assert_eq!(controller.start_index, 0);
        assert_eq!(controller.total_repeats, 3);
        assert_eq!(compiled.header.num_valid_steps, 3);
        assert!(compiled.description_chunks.is_empty());
        assert!(compiled.note_chunks.is_empty());
    }

    #[test]
    fn test_end_to_end_unroll() {
        let compiled = assemble(
            &workout(None, two_step_group(RepeatMode::Unroll)),
            &CompileSettings::default(),
        )
        .unwrap();

        assert_eq!(compiled.records.len(), 6);
        assert!(compiled.records.iter().all(|r| r.as_step().is_some()));
        let summary = compiled.summary();
        assert_eq!(summary.steps, 6);
        assert_eq!(summary.controllers, 0);
    }

    #[test]
    fn test_header_name_is_sanitized() {
        let compiled = assemble(
            &workout(None, two_step_group(RepeatMode::Controller)),
            &CompileSettings::default(),
        )
        .unwrap();
        assert_eq!(compiled.header.name, "Hill Repeats 6x90s");
        assert_eq!(compiled.file_stem(), "Hill_Repeats_6x90s");
    }

    #[test]
    fn test_header_name_fallback_and_trim() {
        assert_eq!(header_name(None, 30), "Workout");
        assert_eq!(header_name(Some("!!!"), 30), "Workout");
        assert_eq!(
            header_name(Some("Long Sunday Run With Progression Finish"), 30),
            "Long Sunday Run With Progressi"
        );
    }

    #[test]
    fn test_short_description_is_still_chunked() {
        let compiled = assemble(
            &workout(Some("Easy day."), two_step_group(RepeatMode::Controller)),
            &CompileSettings::default(),
        )
        .unwrap();

        assert_eq!(
            compiled.header.description_preview.as_deref(),
            Some("Easy day.")
        );
        assert_eq!(compiled.description_chunks.len(), 1);
        let chunk = &compiled.description_chunks[0];
        assert_eq!(chunk.target, ChunkTarget::WorkoutDescription);
        assert_eq!((chunk.mesg_num, chunk.field_num), (26, 17));
        assert_eq!(chunk.parent_index, 0);
        assert_eq!(chunk.part_index, 0);
        assert_eq!(chunk.payload, b"Easy day.");
    }

    #[test]
    fn test_long_description_preview_and_chunks() {
        let description = "Zügig bergauf, locker bergab. ".repeat(20);
        let compiled = assemble(
            &workout(Some(&description), two_step_group(RepeatMode::Controller)),
            &CompileSettings::default(),
        )
        .unwrap();

        let preview = compiled.header.description_preview.unwrap();
        assert!(preview.len() <= 161);
        assert!(preview.ends_with("..."));

        let parts: Vec<u32> = compiled
            .description_chunks
            .iter()
            .map(|c| c.part_index)
            .collect();
        assert_eq!(parts, (0..parts.len() as u32).collect::<Vec<_>>());
        let joined: Vec<u8> = compiled
            .description_chunks
            .iter()
            .flat_map(|c| c.payload.iter().copied())
            .collect();
        assert_eq!(joined, description.as_bytes());
        assert!(compiled.description_chunks.iter().all(|c| c.payload.len() <= 250));
    }

    #[test]
    fn test_note_chunks_follow_record_indices() {
        let note = "Drive the arms, stay tall through the hips and keep the cadence high. ".repeat(5);
        let steps = vec![
            StepNode::Simple(SimpleStep::open()),
            StepNode::Group(GroupStep {
                children: vec![SimpleStep {
                    note: Some(note.clone()),
                    ..SimpleStep::open()
                }],
                repeat: Some(2),
                mode: Some(RepeatMode::Unroll),
            }),
        ];
        let compiled = assemble(&workout(None, steps), &CompileSettings::default()).unwrap();

        let parents: Vec<u32> = compiled.note_chunks.iter().map(|c| c.parent_index).collect();
        let per_note = note.len().div_ceil(250);
        assert_eq!(parents.len(), per_note * 2);
        assert!(parents[..per_note].iter().all(|&p| p == 1));
        assert!(parents[per_note..].iter().all(|&p| p == 2));
        assert!(compiled
            .note_chunks
            .iter()
            .all(|c| c.target == ChunkTarget::StepNotes && (c.mesg_num, c.field_num) == (27, 8)));
    }

    #[test]
    fn test_chunk_text_parts() {
        let chunks = chunk_text("abcdefghij", ChunkTarget::StepNotes, 7, 4);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.parent_index == 7));
        assert_eq!(
            chunks.iter().map(|c| c.part_index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert!(chunk_text("", ChunkTarget::StepNotes, 0, 4).is_empty());
    }
}
