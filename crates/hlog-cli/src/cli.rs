//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use hlog::{FormatConfig, LevelFilter, RecordStoreConfig};

use crate::error::CliError;

/// hlog - hierarchical log files as trees.
#[derive(Parser, Debug, Clone)]
#[command(name = "hlog")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON file with format settings; flags below override its values.
    #[arg(long, global = true, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// Line template.
    #[arg(long, global = true, env = "HLOG_TEMPLATE")]
    pub template: Option<String>,

    /// strftime-style timestamp format.
    #[arg(long, global = true, env = "HLOG_DATE_FORMAT")]
    pub date_format: Option<String>,

    /// Deepest hierarchy stage in the file.
    #[arg(long, global = true, env = "HLOG_MAX_DEPTH")]
    pub max_depth: Option<usize>,

    /// Branch marker literal.
    #[arg(long, global = true, env = "HLOG_MARKER")]
    pub marker: Option<String>,

    /// Extra level as NAME=VALUE, e.g. NOTICE=25 (repeatable).
    #[arg(
        long = "level",
        global = true,
        value_name = "NAME=VALUE",
        value_parser = parse_custom_level
    )]
    pub levels: Vec<CustomLevel>,

    /// Number of records kept in memory.
    #[arg(long, global = true, default_value_t = RecordStoreConfig::default().capacity)]
    pub capacity: usize,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Format settings from the config file, overridden by flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn format_config(&self) -> Result<FormatConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => FormatConfig::load(path).map_err(|e| {
                CliError::Config(format!("failed to load {}: {e}", path.display()))
            })?,
            None => FormatConfig::default(),
        };
        if let Some(template) = &self.template {
            config.template.clone_from(template);
        }
        if let Some(date_format) = &self.date_format {
            config.date_format.clone_from(date_format);
        }
        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(marker) = &self.marker {
            config.branch_marker.clone_from(marker);
        }
        Ok(config)
    }

    /// Standard levels plus every `--level`.
    #[must_use]
    pub fn level_filter(&self) -> LevelFilter {
        let mut levels = LevelFilter::new();
        for level in &self.levels {
            levels.register_level(level.value, level.name.clone());
        }
        levels
    }

    /// Store settings from the flags.
    #[must_use]
    pub const fn store_config(&self) -> RecordStoreConfig {
        RecordStoreConfig::new(self.capacity)
    }
}

/// A level added on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomLevel {
    /// Level name as written in the log file.
    pub name: String,
    /// Numeric severity.
    pub value: u32,
}

fn parse_custom_level(arg: &str) -> Result<CustomLevel, String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got `{arg}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("level name must not be empty".to_string());
    }
    let value = value
        .trim()
        .parse::<u32>()
        .map_err(|e| format!("invalid severity `{value}`: {e}"))?;
    Ok(CustomLevel {
        name: name.to_string(),
        value,
    })
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum Format {
    /// Human-readable indented tree.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print a log file as a tree.
    Tree(TreeArgs),

    /// Print records as they are appended to a log file.
    Follow(FollowArgs),

    /// Write a demonstration log.
    Demo(DemoArgs),
}

/// Arguments for the `tree` command.
#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    /// Log file to read.
    pub file: PathBuf,

    /// Hide records of this level (repeatable).
    #[arg(long = "hide", value_name = "LEVEL")]
    pub hide: Vec<String>,
}

/// Arguments for the `follow` command.
#[derive(Args, Debug, Clone)]
pub struct FollowArgs {
    /// Log file to follow.
    pub file: PathBuf,

    /// Delay between reads in milliseconds.
    #[arg(long, default_value_t = 500)]
    pub interval_ms: u64,

    /// Stop after this many reads and print the held-back last record.
    #[arg(long)]
    pub polls: Option<u64>,
}

/// Arguments for the `demo` command.
#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    /// Log file to write.
    pub file: PathBuf,

    /// Append instead of truncating.
    #[arg(long)]
    pub append: bool,

    /// Number of records in the bulk section.
    #[arg(long, default_value_t = 10)]
    pub repeat: usize,
}
