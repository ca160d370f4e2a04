//! Per-task attempt accounting.
//!
//! Entries are created lazily on first use and live for the whole process.
//! There is deliberately no removal path: a task that has been admitted keeps
//! counting up on every further query.

use std::collections::HashMap;

use parking_lot::Mutex;

#[derive(Debug, Default)]
struct Counts {
    named: HashMap<String, u64>,
    unnamed: u64,
}

/// In-memory map from task identifier to attempt count.
///
/// The map sits behind a `parking_lot::Mutex` so that concurrent queries for the
/// same task never observe the same previous count. Queries that carry no task
/// name share a separate counter, so no real task name can collide with it.
#[derive(Debug, Default)]
pub struct AttemptCounterStore {
    counts: Mutex<Counts>,
}

impl AttemptCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the count before this call and record one more attempt.
    ///
    /// Unseen identifiers start at 0, so the first call returns 0 and stores 1.
    pub fn get_and_increment(&self, task_id: &str) -> u64 {
        let mut counts = self.counts.lock();
        let entry = counts.named.entry(task_id.to_owned()).or_insert(0);
        let previous = *entry;
        *entry += 1;
        previous
    }

    /// Like [`get_and_increment`](Self::get_and_increment), for the nameless bucket.
    pub fn get_and_increment_unnamed(&self) -> u64 {
        let mut counts = self.counts.lock();
        let previous = counts.unnamed;
        counts.unnamed += 1;
        previous
    }

    /// Current count for a task (0 if never seen).
    pub fn get(&self, task_id: &str) -> u64 {
        self.counts.lock().named.get(task_id).copied().unwrap_or(0)
    }

    /// Current count of the nameless bucket.
    pub fn get_unnamed(&self) -> u64 {
        self.counts.lock().unnamed
    }

    /// Number of distinct named tasks seen so far.
    pub fn len(&self) -> usize {
        self.counts.lock().named.len()
    }

    /// True if nothing has been counted yet.
    pub fn is_empty(&self) -> bool {
        let counts = self.counts.lock();
        counts.named.is_empty() && counts.unnamed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_first_call_returns_zero_and_stores_one() {
        let store = AttemptCounterStore::new();
        assert_eq!(store.get("job"), 0);
        assert_eq!(store.get_and_increment("job"), 0);
        assert_eq!(store.get("job"), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_counts_grow_without_bound() {
        let store = AttemptCounterStore::new();
        for expected in 0..20 {
            assert_eq!(store.get_and_increment("job"), expected);
        }
        assert_eq!(store.get("job"), 20);
    }

    #[test]
    fn test_get_does_not_create_entries() {
        let store = AttemptCounterStore::new();
        assert_eq!(store.get("ghost"), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_unnamed_bucket_is_separate_from_names() {
        let store = AttemptCounterStore::new();
        assert_eq!(store.get_and_increment_unnamed(), 0);
        assert_eq!(store.get_and_increment_unnamed(), 1);
        assert_eq!(store.get_and_increment("<unnamed>"), 0);
        assert_eq!(store.get_unnamed(), 2);
        assert_eq!(store.get("<unnamed>"), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(AttemptCounterStore::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                (0..250)
                    .map(|_| store.get_and_increment("shared"))
                    .collect::<Vec<_>>()
            }));
        }

        let mut seen: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        seen.sort_unstable();

        assert_eq!(store.get("shared"), 2000);
        assert_eq!(seen, (0..2000).collect::<Vec<_>>());
    }
}
