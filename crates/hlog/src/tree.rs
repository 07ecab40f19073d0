//! Parent/child navigation derived from hierarchy stages.
//!
//! No links are stored between records. A record's parent is the nearest
//! earlier record with a smaller depth, and a record's direct children are
//! the following records exactly one stage deeper, up to the first record
//! at or above the record's own depth. Records filtered out by level do not
//! end a children scan; only the subtree boundary does.

use crate::error::{HlogError, Result};
use crate::level::LevelFilter;
use crate::store::{RecordStore, RecordsView};
use crate::types::LogRecord;

/// One row of the flattened visible tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRow {
    /// Absolute index of the record.
    pub index: u64,
    /// Number of visible ancestors.
    pub depth: u32,
}

/// Tree queries over a [`RecordStore`] combined with a [`LevelFilter`].
#[derive(Debug, Clone, Copy)]
pub struct TreeNavigator<'a> {
    store: &'a RecordStore,
    filter: &'a LevelFilter,
}

impl<'a> TreeNavigator<'a> {
    /// Creates a navigator over the store, filtering by the given levels.
    #[must_use]
    pub const fn new(store: &'a RecordStore, filter: &'a LevelFilter) -> Self {
        Self { store, filter }
    }

    /// Absolute index of the parent record, or `None` for top-level records
    /// and records whose parent was evicted.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::RecordNotFound`] if `index` is not retained.
    pub fn parent_index(&self, index: u64) -> Result<Option<u64>> {
        parent_in(&self.store.view(), index)
    }

    /// The parent record, if any.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::RecordNotFound`] if `index` is not retained.
    pub fn parent_record(&self, index: u64) -> Result<Option<LogRecord>> {
        let view = self.store.view();
        Ok(parent_in(&view, index)?.and_then(|parent| view.get(parent).cloned()))
    }

    /// Direct children of `parent` (or of the virtual root for `None`) for
    /// which `predicate` holds.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::RecordNotFound`] if `parent` is not retained.
    pub fn children_of<P>(&self, parent: Option<u64>, mut predicate: P) -> Result<Vec<u64>>
    where
        P: FnMut(&LogRecord) -> bool,
    {
        let mut children = Vec::new();
        scan_children(&self.store.view(), parent, |child| {
            if predicate(child) {
                children.push(child.index());
            }
            Ok(())
        })?;
        Ok(children)
    }

    /// Number of direct children for which `predicate` holds.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::RecordNotFound`] if `parent` is not retained.
    pub fn count_children<P>(&self, parent: Option<u64>, mut predicate: P) -> Result<usize>
    where
        P: FnMut(&LogRecord) -> bool,
    {
        let mut count = 0;
        scan_children(&self.store.view(), parent, |child| {
            if predicate(child) {
                count += 1;
            }
            Ok(())
        })?;
        Ok(count)
    }

    /// Direct children whose level passes the filter.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::RecordNotFound`] if `parent` is not retained, or
    /// [`HlogError::UnknownLevel`] if a child carries an unregistered level.
    pub fn filtered_children(&self, parent: Option<u64>) -> Result<Vec<u64>> {
        filtered_children_in(&self.store.view(), self.filter, parent)
    }

    /// Number of direct children whose level passes the filter.
    ///
    /// # Errors
    ///
    /// Same as [`filtered_children`](Self::filtered_children).
    pub fn count_filtered_children(&self, parent: Option<u64>) -> Result<usize> {
        Ok(self.filtered_children(parent)?.len())
    }

    /// Whether the record would be shown: its level passes the filter and
    /// every ancestor is expanded and itself visible.
    ///
    /// `is_expanded` answers for the presentation layer, which owns the
    /// expanded state of each record.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::RecordNotFound`] if `index` is not retained, or
    /// [`HlogError::UnknownLevel`] for unregistered level names.
    pub fn is_visible<E>(&self, index: u64, is_expanded: E) -> Result<bool>
    where
        E: Fn(u64) -> bool,
    {
        let view = self.store.view();
        let mut current = index;
        loop {
            let record = view.get(current).ok_or(HlogError::RecordNotFound(current))?;
            if !self.filter.passes(record)? {
                return Ok(false);
            }
            match parent_in(&view, current)? {
                None => return Ok(true),
                Some(parent) if !is_expanded(parent) => return Ok(false),
                Some(parent) => current = parent,
            }
        }
    }

    /// Flattens the visible tree depth-first, descending only into records
    /// for which `is_expanded` holds.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::UnknownLevel`] for unregistered level names.
    pub fn visible_rows<E>(&self, is_expanded: E) -> Result<Vec<VisibleRow>>
    where
        E: Fn(u64) -> bool,
    {
        let view = self.store.view();
        let mut rows = Vec::new();
        let mut pending: Vec<(u64, u32)> = filtered_children_in(&view, self.filter, None)?
            .into_iter()
            .rev()
            .map(|index| (index, 0))
            .collect();

        while let Some((index, depth)) = pending.pop() {
            rows.push(VisibleRow { index, depth });
            if is_expanded(index) {
                let children = filtered_children_in(&view, self.filter, Some(index))?;
                pending.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
            }
        }
        Ok(rows)
    }

    /// Highest severity among all retained descendants of `index`, filtered
    /// or not. `None` if the record has no descendants.
    ///
    /// # Errors
    ///
    /// Returns [`HlogError::RecordNotFound`] if `index` is not retained.
    pub fn worst_level_below(&self, index: u64) -> Result<Option<u32>> {
        let view = self.store.view();
        let record = view.get(index).ok_or(HlogError::RecordNotFound(index))?;
        let depth = record.depth();
        Ok(view
            .iter_from(index + 1)
            .take_while(|descendant| descendant.depth() > depth)
            .map(LogRecord::level_value)
            .max())
    }
}

fn parent_in(view: &RecordsView<'_>, index: u64) -> Result<Option<u64>> {
    let record = view.get(index).ok_or(HlogError::RecordNotFound(index))?;
    let depth = record.depth();
    if depth == 0 {
        return Ok(None);
    }
    let min = view.min_index();
    let mut candidate = index;
    while candidate > min {
        candidate -= 1;
        if view.get(candidate).is_some_and(|r| r.depth() < depth) {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

fn scan_children<V>(view: &RecordsView<'_>, parent: Option<u64>, mut visit: V) -> Result<()>
where
    V: FnMut(&LogRecord) -> Result<()>,
{
    let (base_depth, start) = match parent {
        Some(index) => {
            let record = view.get(index).ok_or(HlogError::RecordNotFound(index))?;
            (i64::from(record.depth()), index + 1)
        }
        None => (-1, view.min_index()),
    };

    for child in view.iter_from(start) {
        let depth = i64::from(child.depth());
        if depth <= base_depth {
            break;
        }
        if depth == base_depth + 1 {
            visit(child)?;
        }
    }
    Ok(())
}

fn filtered_children_in(
    view: &RecordsView<'_>,
    filter: &LevelFilter,
    parent: Option<u64>,
) -> Result<Vec<u64>> {
    let mut children = Vec::new();
    scan_children(view, parent, |child| {
        if filter.passes(child)? {
            children.push(child.index());
        }
        Ok(())
    })?;
    Ok(children)
}
