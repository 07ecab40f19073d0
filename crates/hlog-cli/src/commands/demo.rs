//! Demo command implementation.
//!
//! Emits a small nested log through a [`FileSink`], covering every standard
//! level, three nested stages, a bulk section and a multi-line message.

use std::io::Write;
use std::sync::Arc;

use hlog::{
    FileSink, FormatConfig, HierarchicalLogger, HierarchyTracker, LineCodec, RecordStore,
    RecordStoreConfig,
};
use serde::Serialize;
use tracing::debug;

use crate::cli::DemoArgs;
use crate::error::CliError;
use crate::output::{OutputFormat, TableDisplay};

/// Deepest stage the demo log reaches.
const DEMO_DEPTH: usize = 3;

/// Handler for the demo command.
pub struct DemoCommand<'a> {
    config: &'a FormatConfig,
    store_config: RecordStoreConfig,
}

impl<'a> DemoCommand<'a> {
    /// Creates a new demo command handler.
    #[must_use]
    pub const fn new(config: &'a FormatConfig, store_config: RecordStoreConfig) -> Self {
        Self {
            config,
            store_config,
        }
    }

    /// Executes the demo command.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be written or the format settings
    /// cannot hold the demo's nesting.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &DemoArgs,
    ) -> Result<(), CliError> {
        if self.config.max_depth < DEMO_DEPTH {
            return Err(CliError::InvalidArgument(format!(
                "demo needs a max depth of at least {DEMO_DEPTH}, got {}",
                self.config.max_depth
            )));
        }

        let codec = LineCodec::new(self.config.compile()?);
        let sink = Arc::new(if args.append {
            FileSink::append(&args.file, codec)?
        } else {
            FileSink::create(&args.file, codec)?
        });

        let store = RecordStore::with_config(self.store_config.clone())?;
        store.subscribe(sink.clone());
        let tracker = HierarchyTracker::new();
        let logger = HierarchicalLogger::register("demo", &tracker, &store)?;

        write_demo(&logger, args.repeat)?;
        sink.flush()?;
        debug!(file = %args.file.display(), records = store.total_accepted(), "wrote demo log");

        let output = DemoOutput {
            file: args.file.display().to_string(),
            records: store.total_accepted(),
        };
        format.write(out, &output)?;
        Ok(())
    }
}

fn write_demo(logger: &HierarchicalLogger<'_>, repeat: usize) -> Result<(), CliError> {
    logger.info("info");
    logger.debug("debug");
    logger.warning("warning");
    logger.error("error");
    logger.critical("critical");

    {
        let _stage1 = logger.enter_lower_stage("0-0 Stage 0 -> 1")?;
        {
            let _stage2 = logger.enter_lower_stage("1-0 Stage 1 -> 2")?;
            logger.debug("2-0 something at the lowered stage");
            {
                let _stage3 = logger.enter_lower_stage("2-1 Stage 2 -> 3")?;
                logger.debug("3-0 something at the lowered stage");
            }
            logger.debug("2-2 something at the lowered stage");
        }
        logger.warning("1-1 something at the lowered stage");
    }

    {
        let _bulk = logger.enter_lower_stage("0-1 Stage 0 -> 1")?;
        for i in 0..repeat {
            logger.info(format!("info {i}"));
        }
    }

    logger.info("multi-line message\n  second line\n  third line");
    Ok(())
}

// Output types

/// Demo output.
#[derive(Debug, Clone, Serialize)]
pub struct DemoOutput {
    /// File written.
    pub file: String,
    /// Records written.
    pub records: u64,
}

impl TableDisplay for DemoOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Wrote {} records to {}", self.records, self.file)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use hlog::{LevelFilter, LineParser, LogFileReader, TreeNavigator};
    use tempfile::TempDir;

    fn run(config: &FormatConfig, args: &DemoArgs) -> Result<String, CliError> {
        let cmd = DemoCommand::new(config, RecordStoreConfig::default());
        let mut out = Vec::new();
        cmd.execute(&mut out, &OutputFormat::new(Format::Table), args)?;
        Ok(String::from_utf8(out).expect("utf-8 output"))
    }

    #[test]
    fn demo_log_reads_back_as_tree() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("demo.log");
        let config = FormatConfig::default();
        let args = DemoArgs {
            file: path.clone(),
            append: false,
            repeat: 3,
        };

        let out = run(&config, &args).expect("demo");
        // 5 levels, 7 nested records, 1 bulk header, 3 bulk records, 1 multi-line.
        assert!(out.starts_with("Wrote 17 records"));

        let store = RecordStore::new(100).expect("valid capacity");
        let tracker = HierarchyTracker::new();
        let levels = LevelFilter::new();
        let logger = HierarchicalLogger::register("reader", &tracker, &store).expect("register");
        let reader = LogFileReader::new(
            LineParser::new(config.compile().expect("compiles")),
            logger,
            &levels,
        );
        reader.read(&path, 0).expect("read demo log");
        assert_eq!(store.len(), 17);

        let stages: Vec<i32> = store.snapshot().iter().map(|r| r.hierarchy_stage()).collect();
        assert_eq!(
            stages,
            vec![0, 0, 0, 0, 0, 0, 1, 2, 2, 3, 2, 1, 0, 1, 1, 1, 0]
        );

        let tree = TreeNavigator::new(&store, &levels);
        assert_eq!(tree.filtered_children(Some(5)).expect("children"), vec![6, 11]);
        assert_eq!(tree.worst_level_below(5).expect("roll-up"), Some(30));
        assert_eq!(
            store.get(16).map(|r| r.message().to_string()),
            Some("multi-line message\n  second line\n  third line".to_string())
        );
    }

    #[test]
    fn demo_append_doubles_records() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("demo.log");
        let config = FormatConfig::new("%(message)s");
        let mut args = DemoArgs {
            file: path.clone(),
            append: false,
            repeat: 0,
        };
        run(&config, &args).expect("first demo");
        let first = std::fs::read_to_string(&path).expect("read log");

        args.append = true;
        run(&config, &args).expect("second demo");
        let both = std::fs::read_to_string(&path).expect("read log");
        assert_eq!(both, format!("{first}{first}"));
    }

    #[test]
    fn demo_rejects_shallow_max_depth() {
        let dir = TempDir::new().expect("create temp dir");
        let config = FormatConfig::default().with_max_depth(2);
        let args = DemoArgs {
            file: dir.path().join("demo.log"),
            append: false,
            repeat: 1,
        };
        assert!(matches!(run(&config, &args), Err(CliError::InvalidArgument(_))));
    }
}
