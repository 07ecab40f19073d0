//! Bounded, index-addressable record storage.
//!
//! This module provides:
//! - [`RecordStore`] — Ring buffer of [`LogRecord`]s addressed by absolute index
//! - [`RecordStoreConfig`] — Capacity configuration
//! - [`RecordsView`] — Borrowed, lock-holding view for batched scans
//!
//! Absolute indices are assigned from a monotonic counter and never reused.
//! Once `capacity` records are held, every insert evicts the oldest one, so
//! the retrievable range is `min_index()..=max_index()` with
//! `min_index() == total_accepted().saturating_sub(capacity)`.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use tracing::{debug, trace};

use crate::error::{HlogError, Result};
use crate::traits::RecordObserver;
use crate::types::LogRecord;

/// Configuration for the record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStoreConfig {
    /// Maximum number of records retained before the oldest is evicted.
    pub capacity: usize,
}

impl Default for RecordStoreConfig {
    fn default() -> Self {
        Self { capacity: 100_000 }
    }
}

impl RecordStoreConfig {
    /// Creates a config with the given capacity.
    #[must_use]
    pub const fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Sets the capacity.
    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Checks the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::InvalidConfig`] if the capacity is zero.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(HlogError::InvalidConfig(
                "record store capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Ring {
    records: VecDeque<LogRecord>,
    total_accepted: u64,
}

impl Ring {
    fn min_index(&self) -> u64 {
        self.total_accepted - self.records.len() as u64
    }

    fn get(&self, index: u64) -> Option<&LogRecord> {
        let slot = index.checked_sub(self.min_index())?;
        self.records.get(usize::try_from(slot).ok()?)
    }
}

/// Bounded ring buffer of log records.
///
/// [`insert`](Self::insert) is the only way records enter or leave the
/// store; eviction happens implicitly when the capacity is exceeded.
///
/// The store can be shared between threads. Concurrent inserts are
/// serialized, so observers see records in index order.
pub struct RecordStore {
    config: RecordStoreConfig,
    ring: RwLock<Ring>,
    observers: RwLock<Vec<Arc<dyn RecordObserver>>>,
    // Held from index assignment until every observer has returned.
    insert_lock: Mutex<()>,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ring = self.ring.read();
        f.debug_struct("RecordStore")
            .field("capacity", &self.config.capacity)
            .field("len", &ring.records.len())
            .field("total_accepted", &ring.total_accepted)
            .field("observers", &self.observers.read().len())
            .finish()
    }
}

impl RecordStore {
    /// Creates a store retaining at most `capacity` records.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::InvalidConfig`] if the capacity is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_config(RecordStoreConfig::new(capacity))
    }

    /// Creates a store from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::InvalidConfig`] if the configuration is invalid.
    pub fn with_config(config: RecordStoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            ring: RwLock::new(Ring {
                records: VecDeque::with_capacity(config.capacity.min(4096)),
                total_accepted: 0,
            }),
            observers: RwLock::new(Vec::new()),
            insert_lock: Mutex::new(()),
            config,
        })
    }

    /// Registers an observer notified after every insert.
    ///
    /// Observers may read the store and subscribe further observers. An
    /// observer that inserts into the store it observes deadlocks.
    pub fn subscribe(&self, observer: Arc<dyn RecordObserver>) {
        self.observers.write().push(observer);
    }

    /// Inserts a record stamped with the current time.
    ///
    /// See [`insert_at`](Self::insert_at).
    pub fn insert(
        &self,
        level_name: &str,
        level_value: u32,
        message: impl Into<String>,
        hierarchy_stage: i32,
    ) -> LogRecord {
        self.insert_at(Local::now(), level_name, level_value, message, hierarchy_stage)
    }

    /// Inserts a record with an explicit timestamp.
    ///
    /// Assigns the next absolute index, evicts the oldest record if the store
    /// is full, then notifies observers in subscription order before
    /// returning the stored record. Another insert waits until these
    /// notifications are done.
    pub fn insert_at(
        &self,
        timestamp: DateTime<Local>,
        level_name: &str,
        level_value: u32,
        message: impl Into<String>,
        hierarchy_stage: i32,
    ) -> LogRecord {
        let _serialized = self.insert_lock.lock();
        let record = {
            let mut ring = self.ring.write();
            let record = LogRecord::new(
                ring.total_accepted,
                hierarchy_stage,
                level_value,
                level_name.to_string(),
                message.into(),
                timestamp,
            );

            ring.records.push_back(record.clone());
            ring.total_accepted += 1;

            while ring.records.len() > self.config.capacity {
                if let Some(evicted) = ring.records.pop_front() {
                    trace!(index = evicted.index(), "evicted record");
                }
            }
            record
        };

        // Snapshot so observers may subscribe without deadlocking.
        let observers: Vec<_> = self.observers.read().iter().map(Arc::clone).collect();
        for observer in observers {
            observer.on_inserted(&record);
        }

        record
    }

    /// Returns the record at an absolute index, or `None` if it was evicted
    /// or not yet assigned.
    #[must_use]
    pub fn get(&self, index: u64) -> Option<LogRecord> {
        self.ring.read().get(index).cloned()
    }

    /// Returns the record at an absolute index the caller knows is retained.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::RecordNotFound`] if the index is outside the
    /// retained range.
    pub fn must_get(&self, index: u64) -> Result<LogRecord> {
        self.get(index).ok_or(HlogError::RecordNotFound(index))
    }

    /// Smallest retrievable absolute index.
    #[must_use]
    pub fn min_index(&self) -> u64 {
        self.ring.read().min_index()
    }

    /// Largest retrievable absolute index, or `None` if the store is empty.
    #[must_use]
    pub fn max_index(&self) -> Option<u64> {
        self.ring.read().total_accepted.checked_sub(1)
    }

    /// Number of records inserted since creation or the last [`clear`](Self::clear).
    #[must_use]
    pub fn total_accepted(&self) -> u64 {
        self.ring.read().total_accepted
    }

    /// Number of records currently retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.read().records.len()
    }

    /// Returns true if no records are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.read().records.is_empty()
    }

    /// Maximum number of retained records.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Drops every record and restarts indexing at 0.
    ///
    /// Observers stay subscribed. Hierarchy stages are untouched.
    pub fn clear(&self) {
        let mut ring = self.ring.write();
        debug!(
            dropped = ring.records.len(),
            total_accepted = ring.total_accepted,
            "cleared record store"
        );
        ring.records.clear();
        ring.total_accepted = 0;
    }

    /// Clones all retained records in index order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.ring.read().records.iter().cloned().collect()
    }

    /// Borrows the records for a batch of lookups under one read lock.
    ///
    /// Inserting from the same thread while the view is alive deadlocks.
    #[must_use]
    pub fn view(&self) -> RecordsView<'_> {
        RecordsView {
            ring: self.ring.read(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &RecordStoreConfig {
        &self.config
    }
}

/// Read-locked view of a [`RecordStore`].
pub struct RecordsView<'a> {
    ring: RwLockReadGuard<'a, Ring>,
}

impl RecordsView<'_> {
    /// Record at an absolute index, if retained.
    #[must_use]
    pub fn get(&self, index: u64) -> Option<&LogRecord> {
        self.ring.get(index)
    }

    /// Smallest retrievable absolute index.
    #[must_use]
    pub fn min_index(&self) -> u64 {
        self.ring.min_index()
    }

    /// One past the largest retrievable absolute index.
    #[must_use]
    pub fn end_index(&self) -> u64 {
        self.ring.total_accepted
    }

    /// Iterates over retained records in index order.
    pub fn iter(&self) -> impl Iterator<Item = &LogRecord> {
        self.ring.records.iter()
    }

    /// Iterates over retained records from `start` (inclusive) onward.
    pub fn iter_from(&self, start: u64) -> impl Iterator<Item = &LogRecord> {
        let skip = start.saturating_sub(self.min_index());
        self.ring
            .records
            .iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_store(capacity: usize) -> RecordStore {
        RecordStore::new(capacity).expect("valid capacity")
    }

    fn insert_info(store: &RecordStore, message: &str, stage: i32) -> LogRecord {
        store.insert("INFO", 20, message, stage)
    }

    #[test]
    fn store_insert_assigns_sequential_indices() {
        let store = make_store(100);
        let first = insert_info(&store, "a", 0);
        let second = insert_info(&store, "b", 0);

        assert_eq!(first.index(), 0);
        assert_eq!(second.index(), 1);
        assert_eq!(store.total_accepted(), 2);
        assert_eq!(store.min_index(), 0);
        assert_eq!(store.max_index(), Some(1));
    }

    #[test]
    fn store_empty_bounds() {
        let store = make_store(10);
        assert!(store.is_empty());
        assert_eq!(store.min_index(), 0);
        assert_eq!(store.max_index(), None);
        assert!(store.get(0).is_none());
    }

    #[test]
    fn store_rejects_zero_capacity() {
        assert!(matches!(
            RecordStore::new(0),
            Err(HlogError::InvalidConfig(_))
        ));
    }

    #[test]
    fn store_evicts_oldest_at_capacity() {
        let store = make_store(10);
        for i in 0..=10 {
            insert_info(&store, &i.to_string(), 0);
        }

        assert!(store.get(0).is_none());
        assert_eq!(store.get(1).map(|r| r.message().to_string()), Some("1".to_string()));
        assert_eq!(store.get(10).map(|r| r.message().to_string()), Some("10".to_string()));
        assert_eq!(store.len(), 10);
        assert_eq!(store.min_index(), 1);
        assert_eq!(store.max_index(), Some(10));
    }

    #[test]
    fn store_get_beyond_max_is_none() {
        let store = make_store(10);
        insert_info(&store, "only", 0);
        assert!(store.get(1).is_none());
        assert!(store.get(u64::MAX).is_none());
    }

    #[test]
    fn store_must_get_errors_on_evicted_index() {
        let store = make_store(2);
        for i in 0..3 {
            insert_info(&store, &i.to_string(), 0);
        }
        assert!(matches!(store.must_get(0), Err(HlogError::RecordNotFound(0))));
        assert!(store.must_get(2).is_ok());
    }

    #[test]
    fn store_clear_resets_indices() {
        let store = make_store(10);
        insert_info(&store, "a", 0);
        insert_info(&store, "b", 0);
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.total_accepted(), 0);
        assert_eq!(store.max_index(), None);

        let record = insert_info(&store, "c", 0);
        assert_eq!(record.index(), 0);
    }

    #[test]
    fn store_notifies_observers_in_order() {
        let store = make_store(10);
        let calls = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&calls);
        store.subscribe(Arc::new(move |r: &LogRecord| {
            first.lock().push(format!("first:{}", r.index()));
        }));
        let second = Arc::clone(&calls);
        store.subscribe(Arc::new(move |r: &LogRecord| {
            second.lock().push(format!("second:{}", r.index()));
        }));

        insert_info(&store, "a", 0);
        insert_info(&store, "b", 0);

        assert_eq!(
            calls.lock().as_slice(),
            ["first:0", "second:0", "first:1", "second:1"]
        );
    }

    #[test]
    fn store_concurrent_inserts_notify_in_index_order() {
        let store = make_store(1000);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(Arc::new(move |r: &LogRecord| {
            // Widen the gap between index assignment and notification.
            std::thread::yield_now();
            sink.lock().push(r.index());
        }));

        std::thread::scope(|scope| {
            for t in 0..4 {
                let store = &store;
                scope.spawn(move || {
                    for i in 0..100 {
                        store.insert("INFO", 20, format!("{t}-{i}"), 0);
                    }
                });
            }
        });

        let seen = seen.lock();
        assert_eq!(seen.len(), 400);
        assert!(seen.iter().copied().eq(0..400));
    }

    #[test]
    fn store_observer_can_read_store() {
        let store = Arc::new(make_store(10));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&store);
        let sink = Arc::clone(&seen);
        store.subscribe(Arc::new(move |r: &LogRecord| {
            if let Some(store) = weak.upgrade() {
                sink.lock().push(store.get(r.index()).is_some());
            }
        }));

        insert_info(&store, "a", 0);
        assert_eq!(seen.lock().as_slice(), [true]);
    }

    #[test]
    fn store_insert_at_keeps_timestamp() {
        let store = make_store(10);
        let ts = Local::now() - chrono::Duration::hours(3);
        let record = store.insert_at(ts, "ERROR", 40, "late", 2);

        assert_eq!(record.timestamp(), ts);
        assert_eq!(record.level_name(), "ERROR");
        assert_eq!(record.hierarchy_stage(), 2);
    }

    #[test]
    fn view_iter_from_skips_to_index() {
        let store = make_store(3);
        for i in 0..5 {
            insert_info(&store, &i.to_string(), 0);
        }
        let view = store.view();
        assert_eq!(view.min_index(), 2);
        assert_eq!(view.end_index(), 5);

        let from: Vec<u64> = view.iter_from(3).map(LogRecord::index).collect();
        assert_eq!(from, vec![3, 4]);

        let all: Vec<u64> = view.iter_from(0).map(LogRecord::index).collect();
        assert_eq!(all, vec![2, 3, 4]);
    }

    #[test]
    fn store_config_defaults() {
        let config = RecordStoreConfig::default();
        assert_eq!(config.capacity, 100_000);
        assert_eq!(RecordStoreConfig::default().with_capacity(5).capacity, 5);
    }

    proptest! {
        #[test]
        fn retained_indices_are_addressable(capacity in 1usize..50, inserts in 0u64..200) {
            let store = make_store(capacity);
            for i in 0..inserts {
                insert_info(&store, &i.to_string(), 0);
            }

            let expected_min = inserts.saturating_sub(capacity as u64);
            prop_assert_eq!(store.min_index(), expected_min);
            prop_assert_eq!(store.max_index(), inserts.checked_sub(1));

            for j in 0..expected_min {
                prop_assert!(store.get(j).is_none());
            }
            for j in expected_min..inserts {
                let record = store.get(j);
                prop_assert_eq!(record.map(|r| r.index()), Some(j));
            }
        }
    }
}
