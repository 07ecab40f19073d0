//! Core types for the hierarchical log.
//!
//! This module provides:
//! - [`StandardLevel`] — The built-in severity levels
//! - [`LogRecord`] — An immutable stored record with its nesting depth

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Built-in severity levels, ordered from least to most severe.
///
/// Custom levels are registered at runtime in a
/// [`LevelFilter`](crate::level::LevelFilter); this enum only names the
/// levels every filter starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum StandardLevel {
    /// Debugging information
    Debug,
    /// General information
    Info,
    /// Warning conditions
    Warning,
    /// Error conditions
    Error,
    /// Failures the program may not recover from
    Critical,
}

impl StandardLevel {
    /// All standard levels in ascending severity.
    pub const ALL: [Self; 5] = [
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Critical,
    ];

    /// Returns the numeric severity of this level.
    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            Self::Debug => 10,
            Self::Info => 20,
            Self::Warning => 30,
            Self::Error => 40,
            Self::Critical => 50,
        }
    }

    /// Returns the name written to and read from log files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for StandardLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored log record.
///
/// Records are created by [`RecordStore::insert`](crate::store::RecordStore::insert)
/// and never change afterwards. Parent/child relationships are not stored;
/// they follow from the sequence of hierarchy stages (see
/// [`TreeNavigator`](crate::tree::TreeNavigator)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    index: u64,
    hierarchy_stage: i32,
    level_value: u32,
    level_name: String,
    message: String,
    timestamp: DateTime<Local>,
}

impl LogRecord {
    pub(crate) const fn new(
        index: u64,
        hierarchy_stage: i32,
        level_value: u32,
        level_name: String,
        message: String,
        timestamp: DateTime<Local>,
    ) -> Self {
        Self {
            index,
            hierarchy_stage,
            level_value,
            level_name,
            message,
            timestamp,
        }
    }

    /// Absolute index assigned at insertion. Never reused.
    #[must_use]
    pub const fn index(&self) -> u64 {
        self.index
    }

    /// Hierarchy stage of the emitting logger at creation time.
    ///
    /// `-1` marks a record from a logger outside the hierarchy.
    #[must_use]
    pub const fn hierarchy_stage(&self) -> i32 {
        self.hierarchy_stage
    }

    /// Nesting depth used for tree navigation and rendering.
    ///
    /// Records outside the hierarchy behave like top-level records.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        if self.hierarchy_stage < 0 {
            0
        } else {
            self.hierarchy_stage as u32
        }
    }

    /// Numeric severity.
    #[must_use]
    pub const fn level_value(&self) -> u32 {
        self.level_value
    }

    /// Level name, e.g. `"WARNING"`.
    #[must_use]
    pub fn level_name(&self) -> &str {
        &self.level_name
    }

    /// Message text. May contain embedded newlines.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// First line of the message.
    #[must_use]
    pub fn headline(&self) -> &str {
        self.message.split('\n').next().unwrap_or_default()
    }

    /// Creation time.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}
