//! Bounded linear undo/redo history.

use std::collections::VecDeque;

/// Default number of entries kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 30;
/// Smallest useful capacity: the baseline plus one edit.
pub const MIN_HISTORY_CAPACITY: usize = 2;
/// Largest capacity accepted from configuration.
pub const MAX_HISTORY_CAPACITY: usize = 50;

/// A history entry with its commit index.
#[derive(Debug, Clone)]
pub struct Entry<T> {
    /// Monotonically increasing across the lifetime of the history.
    pub index: u64,
    pub snapshot: T,
}

/// Linear history of snapshots with a read cursor.
///
/// The entry under the cursor is the current state. Committing while the
/// cursor is behind the tail discards the redo tail; exceeding the capacity
/// evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: VecDeque<Entry<T>>,
    cursor: usize,
    capacity: usize,
    next_index: u64,
}

impl<T> History<T> {
    /// Create an empty history. The capacity is clamped to
    /// `[MIN_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY]`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(MIN_HISTORY_CAPACITY, MAX_HISTORY_CAPACITY);
        Self {
            entries: VecDeque::with_capacity(capacity),
            cursor: 0,
            capacity,
            next_index: 0,
        }
    }

    /// Push a snapshot of the current state, discarding any redo tail.
    pub fn commit(&mut self, snapshot: T) -> u64 {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }

        let index = self.next_index;
        self.next_index += 1;
        self.entries.push_back(Entry { index, snapshot });

        if self.entries.len() > self.capacity {
            self.entries.pop_front();
            log::debug!("history full, evicted oldest entry");
        }
        self.cursor = self.entries.len() - 1;
        index
    }

    /// Step back. Returns the entry to restore, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).map(|e| &e.snapshot)
    }

    /// Step forward. Returns the entry to restore, or `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).map(|e| &e.snapshot)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// The entry under the cursor.
    pub fn current(&self) -> Option<&Entry<T>> {
        self.entries.get(self.cursor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Position of the cursor from the oldest kept entry.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_with(values: &[i32], capacity: usize) -> History<i32> {
        let mut history = History::new(capacity);
        for &v in values {
            history.commit(v);
        }
        history
    }

    #[test]
    fn test_empty_history() {
        let mut history: History<i32> = History::new(10);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert!(history.current().is_none());
    }

    #[test]
    fn test_baseline_only_cannot_undo() {
        let history = history_with(&[0], 10);
        assert!(!history.can_undo());
        assert_eq!(history.current().unwrap().snapshot, 0);
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = history_with(&[0, 1, 2, 3], 10);
        assert_eq!(history.undo().copied(), Some(2));
        assert_eq!(history.undo().copied(), Some(1));
        assert_eq!(history.undo().copied(), Some(0));
        assert_eq!(history.undo(), None);

        assert_eq!(history.redo().copied(), Some(1));
        assert_eq!(history.redo().copied(), Some(2));
        assert_eq!(history.redo().copied(), Some(3));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn test_commit_truncates_redo_tail() {
        let mut history = history_with(&[0, 1, 2, 3], 10);
        history.undo();
        history.undo();
        assert!(history.can_redo());

        history.commit(10);
        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        assert_eq!(history.undo().copied(), Some(1));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = history_with(&(0..20).collect::<Vec<_>>(), 5);
        assert_eq!(history.len(), 5);

        let mut undos = 0;
        while history.undo().is_some() {
            undos += 1;
        }
        assert_eq!(undos, 4);
        assert_eq!(history.current().unwrap().snapshot, 15);
        assert!(!history.can_undo());
    }

    #[test]
    fn test_eviction_keeps_relative_cursor() {
        let mut history = history_with(&[0, 1, 2], 3);
        history.commit(3);
        assert_eq!(history.cursor(), 2);
        assert_eq!(history.current().unwrap().snapshot, 3);
        assert_eq!(history.undo().copied(), Some(2));
    }

    #[test]
    fn test_indices_are_monotonic() {
        let mut history = history_with(&[0, 1, 2], 10);
        history.undo();
        let index = history.commit(5);
        assert_eq!(index, 3);
        assert_eq!(history.current().unwrap().index, 3);
    }

    #[test]
    fn test_capacity_is_clamped() {
        assert_eq!(History::<i32>::new(0).capacity(), MIN_HISTORY_CAPACITY);
        assert_eq!(History::<i32>::new(1000).capacity(), MAX_HISTORY_CAPACITY);
    }
}
