//! Per-logger nesting depth.
//!
//! This module provides:
//! - [`HierarchyTracker`] — Current hierarchy stage of each named logger
//! - [`StageGuard`] — Lowers a stage for a scope and raises it on release
//!
//! A higher stage number means a deeper nesting level. One tracker is
//! constructed and handed to every logger that shares the hierarchy.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::error::{HlogError, Result};

/// Stage reported for loggers outside the hierarchy.
pub const UNREGISTERED_STAGE: i32 = -1;

/// Tracks the hierarchy stage of named loggers.
///
/// Stage changes on the same logger name must be serialized by the caller;
/// the internal lock only keeps the map itself consistent.
#[derive(Debug, Default)]
pub struct HierarchyTracker {
    stages: Mutex<HashMap<String, u32>>,
}

impl HierarchyTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a logger at stage 0.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::AlreadyRegistered`] if the logger is registered.
    pub fn register(&self, name: &str) -> Result<()> {
        let mut stages = self.stages.lock();
        if stages.contains_key(name) {
            return Err(HlogError::AlreadyRegistered(name.to_string()));
        }
        stages.insert(name.to_string(), 0);
        debug!(logger = name, "registered logger in hierarchy");
        Ok(())
    }

    /// Removes a logger from the hierarchy.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::NotRegistered`] if the logger is not registered.
    pub fn unregister(&self, name: &str) -> Result<()> {
        if self.stages.lock().remove(name).is_none() {
            return Err(HlogError::NotRegistered(name.to_string()));
        }
        debug!(logger = name, "unregistered logger from hierarchy");
        Ok(())
    }

    /// Returns true if the logger is registered.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.stages.lock().contains_key(name)
    }

    /// Nests subsequent records of this logger one stage deeper.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::NotRegistered`] if the logger is not registered.
    pub fn lower(&self, name: &str) -> Result<()> {
        let mut stages = self.stages.lock();
        let stage = stages
            .get_mut(name)
            .ok_or_else(|| HlogError::NotRegistered(name.to_string()))?;
        *stage += 1;
        trace!(logger = name, stage = *stage, "lowered hierarchy stage");
        Ok(())
    }

    /// Moves subsequent records of this logger one stage up.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::NotRegistered`] if the logger is not registered,
    /// or [`HlogError::StageUnderflow`] if it is at stage 0.
    pub fn raise(&self, name: &str) -> Result<()> {
        let mut stages = self.stages.lock();
        let stage = stages
            .get_mut(name)
            .ok_or_else(|| HlogError::NotRegistered(name.to_string()))?;
        if *stage == 0 {
            return Err(HlogError::StageUnderflow(name.to_string()));
        }
        *stage -= 1;
        trace!(logger = name, stage = *stage, "raised hierarchy stage");
        Ok(())
    }

    /// Forces the stage of a registered logger.
    ///
    /// Used when replaying records whose stage is already known.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::NotRegistered`] if the logger is not registered.
    pub fn set_stage(&self, name: &str, stage: u32) -> Result<()> {
        let mut stages = self.stages.lock();
        let current = stages
            .get_mut(name)
            .ok_or_else(|| HlogError::NotRegistered(name.to_string()))?;
        *current = stage;
        Ok(())
    }

    /// Current stage of the logger, or [`UNREGISTERED_STAGE`] if it is not
    /// part of the hierarchy.
    #[must_use]
    pub fn current_stage(&self, name: &str) -> i32 {
        self.stages
            .lock()
            .get(name)
            .map_or(UNREGISTERED_STAGE, |stage| *stage as i32)
    }

    /// Lowers the logger's stage until the returned guard is released.
    ///
    /// ```
    /// use hlog::HierarchyTracker;
    ///
    /// let tracker = HierarchyTracker::new();
    /// tracker.register("app")?;
    /// {
    ///     let _scope = tracker.lower_for_scope("app")?;
    ///     assert_eq!(tracker.current_stage("app"), 1);
    /// }
    /// assert_eq!(tracker.current_stage("app"), 0);
    /// # Ok::<(), hlog::HlogError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::NotRegistered`] if the logger is not registered.
    pub fn lower_for_scope(&self, name: &str) -> Result<StageGuard<'_>> {
        self.lower(name)?;
        Ok(StageGuard::new(self, name))
    }
}

/// Raises a logger's stage exactly once when released.
///
/// Release happens through [`close`](Self::close), which reports failures,
/// or on drop, where failures can only be logged.
#[must_use = "dropping the guard immediately raises the stage again"]
#[derive(Debug)]
pub struct StageGuard<'a> {
    tracker: &'a HierarchyTracker,
    name: String,
    released: bool,
}

impl<'a> StageGuard<'a> {
    /// Wraps a stage that has already been lowered.
    pub(crate) fn new(tracker: &'a HierarchyTracker, name: &str) -> Self {
        Self {
            tracker,
            name: name.to_string(),
            released: false,
        }
    }

    /// Name of the logger whose stage is held.
    #[must_use]
    pub fn logger_name(&self) -> &str {
        &self.name
    }

    /// Raises the stage now.
    ///
    /// # Errors
    ///
    /// Returns the tracker's error if the logger was unregistered or its
    /// stage was raised behind the guard's back.
    pub fn close(mut self) -> Result<()> {
        self.released = true;
        self.tracker.raise(&self.name)
    }
}

impl Drop for StageGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.tracker.raise(&self.name) {
            warn!(logger = %self.name, error = %e, "failed to raise hierarchy stage on scope exit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_starts_at_stage_zero() {
        let tracker = HierarchyTracker::new();
        assert!(tracker.register("app").is_ok());
        assert_eq!(tracker.current_stage("app"), 0);
        assert!(tracker.is_registered("app"));
    }

    #[test]
    fn register_twice_fails() {
        let tracker = HierarchyTracker::new();
        assert!(tracker.register("app").is_ok());
        assert!(matches!(
            tracker.register("app"),
            Err(HlogError::AlreadyRegistered(name)) if name == "app"
        ));
    }

    #[test]
    fn register_after_unregister_succeeds() {
        let tracker = HierarchyTracker::new();
        assert!(tracker.register("app").is_ok());
        assert!(tracker.lower("app").is_ok());
        assert!(tracker.unregister("app").is_ok());
        assert!(tracker.register("app").is_ok());
        assert_eq!(tracker.current_stage("app"), 0);
    }

    #[test]
    fn unregister_unknown_fails() {
        let tracker = HierarchyTracker::new();
        assert!(matches!(
            tracker.unregister("ghost"),
            Err(HlogError::NotRegistered(_))
        ));
    }

    #[test]
    fn unregistered_logger_reports_negative_stage() {
        let tracker = HierarchyTracker::new();
        assert_eq!(tracker.current_stage("ghost"), UNREGISTERED_STAGE);
        assert!(matches!(tracker.lower("ghost"), Err(HlogError::NotRegistered(_))));
        assert!(matches!(tracker.raise("ghost"), Err(HlogError::NotRegistered(_))));
    }

    #[test]
    fn lower_and_raise() {
        let tracker = HierarchyTracker::new();
        assert!(tracker.register("app").is_ok());

        assert!(tracker.lower("app").is_ok());
        assert!(tracker.lower("app").is_ok());
        assert_eq!(tracker.current_stage("app"), 2);

        assert!(tracker.raise("app").is_ok());
        assert_eq!(tracker.current_stage("app"), 1);
    }

    #[test]
    fn raise_at_stage_zero_underflows() {
        let tracker = HierarchyTracker::new();
        assert!(tracker.register("app").is_ok());
        assert!(matches!(
            tracker.raise("app"),
            Err(HlogError::StageUnderflow(_))
        ));
        assert_eq!(tracker.current_stage("app"), 0);
    }

    #[test]
    fn loggers_are_independent() {
        let tracker = HierarchyTracker::new();
        assert!(tracker.register("a").is_ok());
        assert!(tracker.register("b").is_ok());
        assert!(tracker.lower("a").is_ok());

        assert_eq!(tracker.current_stage("a"), 1);
        assert_eq!(tracker.current_stage("b"), 0);
    }

    #[test]
    fn set_stage_overrides() {
        let tracker = HierarchyTracker::new();
        assert!(tracker.register("replay").is_ok());
        assert!(tracker.set_stage("replay", 4).is_ok());
        assert_eq!(tracker.current_stage("replay"), 4);
        assert!(matches!(
            tracker.set_stage("ghost", 1),
            Err(HlogError::NotRegistered(_))
        ));
    }

    #[test]
    fn guard_raises_on_drop() {
        let tracker = HierarchyTracker::new();
        assert!(tracker.register("app").is_ok());
        {
            let guard = tracker.lower_for_scope("app");
            assert!(guard.is_ok());
            assert_eq!(tracker.current_stage("app"), 1);
        }
        assert_eq!(tracker.current_stage("app"), 0);
    }

    #[test]
    fn guard_raises_once_on_close() {
        let tracker = HierarchyTracker::new();
        assert!(tracker.register("app").is_ok());
        assert!(tracker.lower("app").is_ok());

        let guard = tracker.lower_for_scope("app");
        assert!(guard.is_ok());
        if let Ok(guard) = guard {
            assert_eq!(guard.logger_name(), "app");
            assert!(guard.close().is_ok());
        }
        assert_eq!(tracker.current_stage("app"), 1);
    }

    #[test]
    fn guard_raises_on_early_return() {
        fn nested(tracker: &HierarchyTracker) -> Result<()> {
            let _scope = tracker.lower_for_scope("app")?;
            Err(HlogError::InvalidConfig("bail out".to_string()))
        }

        let tracker = HierarchyTracker::new();
        assert!(tracker.register("app").is_ok());
        assert!(nested(&tracker).is_err());
        assert_eq!(tracker.current_stage("app"), 0);
    }

    #[test]
    fn guard_raises_when_unwinding() {
        let tracker = HierarchyTracker::new();
        assert!(tracker.register("app").is_ok());

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _outer = tracker.lower_for_scope("app").expect("lower");
            let _inner = tracker.lower_for_scope("app").expect("lower");
            assert_eq!(tracker.current_stage("app"), 2);
            panic!("handler failed mid-scope");
        }));

        assert!(result.is_err());
        assert_eq!(tracker.current_stage("app"), 0);
        assert!(tracker.raise("app").is_err());
    }

    #[test]
    fn guard_close_reports_unregistered_logger() {
        let tracker = HierarchyTracker::new();
        assert!(tracker.register("app").is_ok());
        let guard = tracker.lower_for_scope("app");
        assert!(tracker.unregister("app").is_ok());

        if let Ok(guard) = guard {
            assert!(matches!(guard.close(), Err(HlogError::NotRegistered(_))));
        }
    }

    #[test]
    fn lower_for_scope_unregistered_fails() {
        let tracker = HierarchyTracker::new();
        assert!(tracker.lower_for_scope("ghost").is_err());
    }
}
