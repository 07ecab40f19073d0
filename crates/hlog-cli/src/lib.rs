//! # hlog-cli
//!
//! Command-line front end for hierarchical log files.
//!
//! Provides commands for:
//! - Printing a log file as an indented tree, optionally hiding levels
//! - Following a log file while it is being written
//! - Writing a demonstration log
//!
//! Every command reads and writes files with the same [`hlog::FormatConfig`],
//! built from `--config` and the format flags.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, DemoArgs, FollowArgs, Format, TreeArgs};
pub use error::CliError;
pub use output::OutputFormat;
