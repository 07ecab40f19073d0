//! Emission front binding a named logger to a hierarchy and a store.
//!
//! [`HierarchicalLogger`] stands in for a logging dispatcher that accepted a
//! record: it stamps the logger's current stage onto the record and hands it
//! to the [`RecordStore`].

use chrono::{DateTime, Local};

use crate::error::Result;
use crate::hierarchy::{HierarchyTracker, StageGuard};
use crate::store::RecordStore;
use crate::types::{LogRecord, StandardLevel};

/// A named logger whose records carry its current hierarchy stage.
#[derive(Debug, Clone)]
pub struct HierarchicalLogger<'a> {
    name: String,
    tracker: &'a HierarchyTracker,
    store: &'a RecordStore,
}

impl<'a> HierarchicalLogger<'a> {
    /// Creates a logger. It does not register itself; loggers that were
    /// never registered emit records at stage `-1`.
    #[must_use]
    pub fn new(name: impl Into<String>, tracker: &'a HierarchyTracker, store: &'a RecordStore) -> Self {
        Self {
            name: name.into(),
            tracker,
            store,
        }
    }

    /// Creates a logger and registers it in the tracker at stage 0.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::AlreadyRegistered`](crate::HlogError::AlreadyRegistered)
    /// if the name is already registered.
    pub fn register(
        name: impl Into<String>,
        tracker: &'a HierarchyTracker,
        store: &'a RecordStore,
    ) -> Result<Self> {
        let logger = Self::new(name, tracker, store);
        tracker.register(&logger.name)?;
        Ok(logger)
    }

    /// Logger name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current hierarchy stage of this logger.
    #[must_use]
    pub fn stage(&self) -> i32 {
        self.tracker.current_stage(&self.name)
    }

    /// Moves this logger to `stage`, as when replaying stored records.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::NotRegistered`](crate::HlogError::NotRegistered)
    /// if the logger is not registered.
    pub fn set_stage(&self, stage: u32) -> Result<()> {
        self.tracker.set_stage(&self.name, stage)
    }

    /// Emits a record with an arbitrary level.
    pub fn log(&self, level_name: &str, level_value: u32, message: impl Into<String>) -> LogRecord {
        self.store
            .insert(level_name, level_value, message, self.stage())
    }

    /// Emits a record with an explicit timestamp.
    pub fn log_at(
        &self,
        timestamp: DateTime<Local>,
        level_name: &str,
        level_value: u32,
        message: impl Into<String>,
    ) -> LogRecord {
        self.store
            .insert_at(timestamp, level_name, level_value, message, self.stage())
    }

    /// Emits a record with a standard level.
    pub fn emit(&self, level: StandardLevel, message: impl Into<String>) -> LogRecord {
        self.log(level.as_str(), level.value(), message)
    }

    /// Emits a DEBUG record.
    pub fn debug(&self, message: impl Into<String>) -> LogRecord {
        self.emit(StandardLevel::Debug, message)
    }

    /// Emits an INFO record.
    pub fn info(&self, message: impl Into<String>) -> LogRecord {
        self.emit(StandardLevel::Info, message)
    }

    /// Emits a WARNING record.
    pub fn warning(&self, message: impl Into<String>) -> LogRecord {
        self.emit(StandardLevel::Warning, message)
    }

    /// Emits an ERROR record.
    pub fn error(&self, message: impl Into<String>) -> LogRecord {
        self.emit(StandardLevel::Error, message)
    }

    /// Emits a CRITICAL record.
    pub fn critical(&self, message: impl Into<String>) -> LogRecord {
        self.emit(StandardLevel::Critical, message)
    }

    /// Emits an INFO record at the current stage, then nests everything this
    /// logger emits until the guard is released below that record.
    ///
    /// ```
    /// use hlog::{HierarchicalLogger, HierarchyTracker, RecordStore};
    ///
    /// let tracker = HierarchyTracker::new();
    /// let store = RecordStore::new(100)?;
    /// let logger = HierarchicalLogger::register("app", &tracker, &store)?;
    ///
    /// {
    ///     let _step = logger.enter_lower_stage("loading configuration")?;
    ///     logger.info("reading defaults");
    /// }
    /// logger.info("done");
    ///
    /// let stages: Vec<i32> = store.snapshot().iter().map(|r| r.hierarchy_stage()).collect();
    /// assert_eq!(stages, vec![0, 1, 0]);
    /// # Ok::<(), hlog::HlogError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::NotRegistered`](crate::HlogError::NotRegistered)
    /// if the logger is not registered. The record is emitted regardless.
    pub fn enter_lower_stage(&self, message: impl Into<String>) -> Result<StageGuard<'a>> {
        self.info(message);
        self.tracker.lower_for_scope(&self.name)
    }

    /// Nests everything this logger emits until the guard is released,
    /// without emitting a record.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::NotRegistered`](crate::HlogError::NotRegistered)
    /// if the logger is not registered.
    pub fn lower_for_scope(&self) -> Result<StageGuard<'a>> {
        self.tracker.lower_for_scope(&self.name)
    }
}
