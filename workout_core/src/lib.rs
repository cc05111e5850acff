#![forbid(unsafe_code)]

//! Workout compiler core.
//!
//! Turns a structured workout description (metadata, options and a tree of
//! steps with repeat groups) into the flat record sequence and chunked text a
//! binary workout-file encoder consumes.
//!
//! This crate provides:
//! - Domain types (step tree, compiled records, text chunks)
//! - Validation of a parsed document tree into the typed model
//! - Unit conversion and target encoding
//! - UTF-8 safe text chunking and inline previews
//! - Step tree compilation and workout assembly
//! - Configuration, the encoder handoff document and a CSV record table

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod document;
pub mod units;
pub mod target;
pub mod text;
pub mod compiler;
pub mod assembler;
pub mod handoff;
pub mod table;

// Re-export commonly used types
pub use error::{CompileError, Error, ErrorKind, NodePath, Result};
pub use types::*;
pub use config::{Capacities, CompileSettings, Config};
pub use document::parse_workout;
pub use units::convert_duration;
pub use target::{encode_target, pace_to_speed};
pub use text::{chunk, truncate_inline};
pub use compiler::{compile, CompiledSteps, PendingNote};
pub use assembler::{assemble, chunk_text};
pub use handoff::{FileIdentity, Handoff};
