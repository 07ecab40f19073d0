//! Traits at the seams between the store and its consumers.
//!
//! This module provides the [`RecordObserver`] trait, through which
//! presentation layers and sinks learn about newly inserted records.

use crate::types::LogRecord;

/// Receives every record right after it was inserted into a
/// [`RecordStore`](crate::store::RecordStore).
///
/// Observers run synchronously on the inserting thread, in subscription
/// order. Any presentation state an observer keeps (expanded flags, item
/// handles, colors) belongs in its own side table keyed by
/// [`LogRecord::index`].
pub trait RecordObserver: Send + Sync {
    /// Called once per inserted record.
    fn on_inserted(&self, record: &LogRecord);
}

impl<F> RecordObserver for F
where
    F: Fn(&LogRecord) + Send + Sync,
{
    fn on_inserted(&self, record: &LogRecord) {
        self(record);
    }
}
