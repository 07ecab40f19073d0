//! Level table and per-level visibility switches.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{HlogError, Result};
use crate::types::{LogRecord, StandardLevel};

#[derive(Debug, Clone)]
struct LevelEntry {
    value: u32,
    enabled: bool,
}

/// Enabled/disabled set of level names.
///
/// Starts with the [`StandardLevel`]s, all enabled. Custom levels are added
/// with [`register_level`](Self::register_level).
#[derive(Debug, Clone)]
pub struct LevelFilter {
    levels: HashMap<String, LevelEntry>,
}

impl Default for LevelFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelFilter {
    /// Creates a filter with every standard level enabled.
    #[must_use]
    pub fn new() -> Self {
        let levels = StandardLevel::ALL
            .iter()
            .map(|level| {
                (
                    level.as_str().to_string(),
                    LevelEntry {
                        value: level.value(),
                        enabled: true,
                    },
                )
            })
            .collect();
        Self { levels }
    }

    /// Adds a level to the table, enabled.
    ///
    /// Registering an existing name updates its severity and keeps its
    /// enabled state.
    pub fn register_level(&mut self, value: u32, name: impl Into<String>) {
        let name = name.into();
        debug!(level = %name, value, "registered level");
        self.levels
            .entry(name)
            .and_modify(|entry| entry.value = value)
            .or_insert(LevelEntry {
                value,
                enabled: true,
            });
    }

    /// Enables or disables a level.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::UnknownLevel`] if the name was never registered.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let entry = self
            .levels
            .get_mut(name)
            .ok_or_else(|| HlogError::UnknownLevel(name.to_string()))?;
        entry.enabled = enabled;
        Ok(())
    }

    /// Re-enables every known level.
    pub fn enable_all(&mut self) {
        for entry in self.levels.values_mut() {
            entry.enabled = true;
        }
    }

    /// Returns whether records of this level pass the filter.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::UnknownLevel`] if the name was never registered.
    pub fn is_enabled(&self, name: &str) -> Result<bool> {
        self.levels
            .get(name)
            .map(|entry| entry.enabled)
            .ok_or_else(|| HlogError::UnknownLevel(name.to_string()))
    }

    /// Returns whether the record's level passes the filter.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::UnknownLevel`] if the record carries an
    /// unregistered level name.
    pub fn passes(&self, record: &LogRecord) -> Result<bool> {
        self.is_enabled(record.level_name())
    }

    /// Severity registered for a level name.
    #[must_use]
    pub fn value_of(&self, name: &str) -> Option<u32> {
        self.levels.get(name).map(|entry| entry.value)
    }

    /// Name of a registered level with the given severity.
    ///
    /// If several names share a severity, the alphabetically first wins.
    #[must_use]
    pub fn name_of(&self, value: u32) -> Option<&str> {
        self.levels
            .iter()
            .filter(|(_, entry)| entry.value == value)
            .map(|(name, _)| name.as_str())
            .min()
    }

    /// All known levels as `(value, name, enabled)`, in ascending severity.
    #[must_use]
    pub fn levels(&self) -> Vec<(u32, &str, bool)> {
        let mut levels: Vec<_> = self
            .levels
            .iter()
            .map(|(name, entry)| (entry.value, name.as_str(), entry.enabled))
            .collect();
        levels.sort_unstable();
        levels
    }
}
