//! Tree command implementation.
//!
//! Reads a whole log file and prints every visible record, fully expanded.

use std::io::Write;

use hlog::{
    FormatConfig, HierarchicalLogger, HierarchyTracker, LevelFilter, LineParser, LogFileReader,
    RecordStore, RecordStoreConfig, TreeNavigator,
};
use serde::Serialize;
use tracing::debug;

use super::REPLAY_LOGGER;
use crate::cli::TreeArgs;
use crate::error::CliError;
use crate::output::{OutputFormat, RecordRow, TableDisplay};

/// Handler for the tree command.
pub struct TreeCommand<'a> {
    config: &'a FormatConfig,
    store_config: RecordStoreConfig,
    levels: LevelFilter,
}

impl<'a> TreeCommand<'a> {
    /// Creates a new tree command handler.
    #[must_use]
    pub fn new(config: &'a FormatConfig, store_config: RecordStoreConfig) -> Self {
        Self {
            config,
            store_config,
            levels: LevelFilter::new(),
        }
    }

    /// Replaces the level table used to read the file.
    #[must_use]
    pub fn with_levels(mut self, levels: LevelFilter) -> Self {
        self.levels = levels;
        self
    }

    /// Executes the tree command.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or a hidden level
    /// is unknown.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &TreeArgs,
    ) -> Result<(), CliError> {
        let template = self.config.compile()?;
        let store = RecordStore::with_config(self.store_config.clone())?;
        let tracker = HierarchyTracker::new();

        let mut levels = self.levels.clone();
        for name in &args.hide {
            if levels.set_enabled(name, false).is_err() {
                levels
                    .set_enabled(&name.to_uppercase(), false)
                    .map_err(|_| CliError::InvalidArgument(format!("unknown level: {name}")))?;
            }
        }

        let logger = HierarchicalLogger::register(REPLAY_LOGGER, &tracker, &store)?;
        let reader = LogFileReader::new(LineParser::new(template), logger, &levels);
        reader.read(&args.file, 0)?;

        let tree = TreeNavigator::new(&store, &levels);
        let rows = tree
            .visible_rows(|_| true)?
            .into_iter()
            .map(|row| {
                let record = store.must_get(row.index)?;
                let worst_below = tree
                    .worst_level_below(row.index)?
                    .filter(|worst| *worst > record.level_value())
                    .and_then(|worst| levels.name_of(worst))
                    .map(str::to_string);
                Ok(RecordRow::new(&record, row.depth).with_worst_below(worst_below))
            })
            .collect::<Result<Vec<_>, CliError>>()?;
        debug!(
            file = %args.file.display(),
            records = store.len(),
            shown = rows.len(),
            "built tree"
        );

        let output = TreeOutput {
            file: args.file.display().to_string(),
            total_records: store.total_accepted(),
            retained: store.len(),
            rows,
        };
        format.write(out, &output)?;
        Ok(())
    }
}

// Output types

/// Tree output.
#[derive(Debug, Clone, Serialize)]
pub struct TreeOutput {
    /// File that was read.
    pub file: String,
    /// Records read from the file.
    pub total_records: u64,
    /// Records still held after eviction.
    pub retained: usize,
    /// Visible rows in display order.
    pub rows: Vec<RecordRow>,
}

impl TableDisplay for TreeOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.rows.is_empty() {
            writeln!(writer, "No records.")?;
            return Ok(());
        }
        for row in &self.rows {
            row.write_table(writer)?;
        }
        Ok(())
    }
}
