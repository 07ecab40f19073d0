//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`tree`] - Print a log file as a tree
//! - [`follow`] - Print records as a log file grows
//! - [`demo`] - Write a demonstration log

pub mod demo;
pub mod follow;
pub mod tree;

pub use demo::DemoCommand;
pub use follow::FollowCommand;
pub use tree::TreeCommand;

/// Name of the logger that replays records read from files.
pub const REPLAY_LOGGER: &str = "hlog.reader";
