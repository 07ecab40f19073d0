//! Follow command implementation.
//!
//! Re-reads a growing log file from the last consumed offset and prints each
//! record once it is complete.

use std::io::Write;
use std::thread;
use std::time::Duration;

use hlog::{
    FormatConfig, HierarchicalLogger, HierarchyTracker, LevelFilter, LineParser, LogFileReader,
    ReaderConfig, RecordStore, RecordStoreConfig,
};
use tracing::{debug, warn};

use super::REPLAY_LOGGER;
use crate::cli::FollowArgs;
use crate::error::CliError;
use crate::output::{OutputFormat, RecordRow};

/// Handler for the follow command.
pub struct FollowCommand<'a> {
    config: &'a FormatConfig,
    store_config: RecordStoreConfig,
    levels: LevelFilter,
}

impl<'a> FollowCommand<'a> {
    /// Creates a new follow command handler.
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

    /// Executes the follow command.
    ///
    /// Runs until the poll limit is reached, or forever without one. The last
    /// record of the file is held back while following, since more
    /// continuation lines may still be appended to it; it is printed once
    /// the poll limit is reached.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &FollowArgs,
    ) -> Result<(), CliError> {
        let template = self.config.compile()?;
        let store = RecordStore::with_config(self.store_config.clone())?;
        let tracker = HierarchyTracker::new();
        let logger = HierarchicalLogger::register(REPLAY_LOGGER, &tracker, &store)?;

        let follower = LogFileReader::new(
            LineParser::with_config(template.clone(), ReaderConfig::follow()),
            logger.clone(),
            &self.levels,
        );
        let interval = Duration::from_millis(args.interval_ms);

        let mut offset = 0;
        let mut next_index = 0;
        let mut polls = 0;
        loop {
            let len = std::fs::metadata(&args.file)?.len();
            if len < offset {
                warn!(file = %args.file.display(), len, offset, "log file shrank, reading from start");
                offset = 0;
            }
            offset = follower.read(&args.file, offset)?;
            next_index = print_new(&store, next_index, out, format)?;

            polls += 1;
            if args.polls.is_some_and(|max| polls >= max) {
                break;
            }
            thread::sleep(interval);
        }

        let finisher = LogFileReader::new(LineParser::new(template), logger, &self.levels);
        offset = finisher.read(&args.file, offset)?;
        print_new(&store, next_index, out, format)?;
        debug!(file = %args.file.display(), offset, polls, "stopped following");
        Ok(())
    }
}

/// Prints records from `next_index` on; returns the next unprinted index.
fn print_new<W: Write>(
    store: &RecordStore,
    next_index: u64,
    out: &mut W,
    format: &OutputFormat,
) -> Result<u64, CliError> {
    let start = next_index.max(store.min_index());
    let records: Vec<RecordRow> = store
        .view()
        .iter_from(start)
        .map(|record| RecordRow::new(record, record.depth()))
        .collect();
    for row in &records {
        format.write_line(out, row)?;
    }
    Ok(store.total_accepted())
}
