//! Error types for the workout_core library.

use std::fmt;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for workout_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workout description failed to compile
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// One step along the path from the document root to a node
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Key(&'static str),
    Index(usize),
}

/// Location of a node inside the workout description tree
///
/// Rendered as `steps[2].children[0].target`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodePath(Vec<Segment>);

impl NodePath {
    /// The document root
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of a map entry below this node
    pub fn key(&self, key: &'static str) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Key(key));
        Self(segments)
    }

    /// Path of a list element below this node
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{}", key)?,
                Segment::Key(key) => write!(f, ".{}", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// Failure kinds detected while compiling a workout description
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    #[error("missing required section '{0}'")]
    MissingSection(&'static str),

    #[error("'{0}' must not be empty")]
    EmptyCollection(&'static str),

    #[error("malformed node, expected {expected}")]
    MalformedNode { expected: &'static str },

    #[error("unsupported step type '{0}'")]
    UnsupportedStepType(String),

    #[error("unsupported duration unit '{0}'")]
    UnsupportedDurationUnit(String),

    #[error("duration {0} required unless open")]
    MissingDurationField(&'static str),

    #[error("unsupported target type '{0}'")]
    UnsupportedTargetType(String),

    #[error("invalid range: high ({high}) must be greater than low ({low})")]
    InvalidRange { low: u32, high: u32 },

    #[error("invalid pace '{0}', expected mm:ss or whole seconds")]
    InvalidPaceFormat(String),

    #[error("missing required field '{0}'")]
    MissingRequiredField(&'static str),

    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ErrorKind {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ErrorKind::InvalidValue {
            field,
            reason: reason.into(),
        }
    }

    /// Attach the location of the offending node
    pub fn at(self, path: NodePath) -> CompileError {
        CompileError { path, kind: self }
    }
}

/// Structured compilation failure: what went wrong and where
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("error at {path}: {kind}")]
pub struct CompileError {
    pub path: NodePath,
    pub kind: ErrorKind,
}
