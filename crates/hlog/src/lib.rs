//! # hlog
//!
//! Hierarchical log records with a text format that reads back losslessly.
//!
//! This crate provides:
//!
//! - [`HierarchyTracker`] — Per-logger nesting stages with scoped lowering
//! - [`HierarchicalLogger`] — Emits records stamped with the logger's stage
//! - [`RecordStore`] — Bounded ring of records with stable absolute indices
//! - [`LevelFilter`] — Level table with per-level visibility
//! - [`TreeNavigator`] — Parent, children and visibility derived from depth
//! - [`FormatConfig`] / [`LineCodec`] — Templates and the line writer
//! - [`LineParser`] / [`LogFileReader`] — Reads log files back into a store
//! - [`FileSink`] — Persists records as they are inserted
//!
//! ## Example
//!
//! ```rust
//! use hlog::{FormatConfig, HierarchicalLogger, HierarchyTracker, LevelFilter, LineCodec,
//!     RecordStore, TreeNavigator};
//!
//! let tracker = HierarchyTracker::new();
//! let store = RecordStore::new(1000)?;
//! let logger = HierarchicalLogger::register("build", &tracker, &store)?;
//!
//! {
//!     let _compile = logger.enter_lower_stage("compiling")?;
//!     logger.warning("unused variable");
//! }
//! logger.info("finished");
//!
//! let levels = LevelFilter::new();
//! let tree = TreeNavigator::new(&store, &levels);
//! assert_eq!(tree.filtered_children(None)?, vec![0, 2]);
//! assert_eq!(tree.filtered_children(Some(0))?, vec![1]);
//!
//! let codec = LineCodec::new(FormatConfig::new("%(levelname)s %(message)s").compile()?);
//! let record = store.must_get(1)?;
//! assert_eq!(codec.format(&record)?, " |-          WARNING unused variable");
//! # Ok::<(), hlog::HlogError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod error;
pub mod file_sink;
pub mod hierarchy;
pub mod level;
pub mod logger;
pub mod parser;
pub mod store;
pub mod template;
pub mod traits;
pub mod tree;
pub mod types;

// Re-export main types
pub use codec::LineCodec;
pub use error::{HlogError, Result};
pub use file_sink::FileSink;
pub use hierarchy::{HierarchyTracker, StageGuard, UNREGISTERED_STAGE};
pub use level::LevelFilter;
pub use logger::HierarchicalLogger;
pub use parser::{LineParser, LineShape, LogFileReader, ParsedLine, ParsedRecord, ReaderConfig};
pub use store::{RecordStore, RecordStoreConfig, RecordsView};
pub use template::{CompiledTemplate, FieldKind, FormatConfig, TemplateField};
pub use traits::RecordObserver;
pub use tree::TreeNavigator;
pub use types::{LogRecord, StandardLevel};
