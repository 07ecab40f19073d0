//! Error types for the hierarchical log.

use thiserror::Error;

/// Errors that can occur in the hierarchical log.
///
/// Contract violations (`AlreadyRegistered`, `NotRegistered`,
/// `StageUnderflow`, `UnknownLevel`, `RecordNotFound`) are not meant to be
/// recovered from; callers propagate them.
#[derive(Debug, Error)]
pub enum HlogError {
    /// A logger was registered twice without being unregistered.
    #[error("logger already registered: {0}")]
    AlreadyRegistered(String),

    /// A stage operation targeted a logger that was never registered.
    #[error("logger not registered: {0}")]
    NotRegistered(String),

    /// A raise was requested while the logger is already at stage 0.
    #[error("hierarchy stage of logger {0} must be greater than 0 to raise it")]
    StageUnderflow(String),

    /// A level name was used that is not in the level table.
    #[error("unknown level: {0}")]
    UnknownLevel(String),

    /// A record index outside the retained range was dereferenced.
    #[error("record not found: {0}")]
    RecordNotFound(u64),

    /// A record is nested deeper than the codec can render.
    #[error("hierarchy stage {stage} exceeds the maximum depth {max}")]
    StageTooDeep {
        /// Stage of the offending record.
        stage: i32,
        /// Configured maximum depth.
        max: usize,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A format template could not be compiled.
    #[error("invalid template: {0}")]
    Template(String),

    /// A log file line matched neither a header nor a continuation.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// One-based line number relative to the read start offset.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for hierarchical log operations.
pub type Result<T> = std::result::Result<T, HlogError>;
