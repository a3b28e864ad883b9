//! Thread-safe index wrapper
//!
//! Uniform locking around every index operation: reads (queries, getters,
//! serialization) hold the read lock for their full duration, mutations
//! hold the write lock. Getters return owned snapshots, never live aliases
//! of the locked structures, so results are safe to consume outside the
//! lock.

use super::{InvertedIndex, SearchResult};
use crate::sync::rwlock::ReadWriteLock;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::Path;

#[derive(Default)]
pub struct SharedIndex {
    inner: ReadWriteLock<InvertedIndex>,
}

impl SharedIndex {
    pub fn new() -> Self {
        Self {
            inner: ReadWriteLock::new(InvertedIndex::new()),
        }
    }

    pub fn add(&self, term: &str, location: &str, position: usize) {
        self.inner.write().add(term, location, position);
    }

    /// Merge a fully built local index in one write-lock critical section.
    pub fn add_all(&self, other: InvertedIndex) {
        self.inner.write().add_all(other);
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.inner.read().has_term(term)
    }

    pub fn has_location(&self, term: &str, location: &str) -> bool {
        self.inner.read().has_location(term, location)
    }

    pub fn has_position(&self, term: &str, location: &str, position: usize) -> bool {
        self.inner.read().has_position(term, location, position)
    }

    pub fn num_terms(&self) -> usize {
        self.inner.read().num_terms()
    }

    pub fn num_locations(&self, term: &str) -> usize {
        self.inner.read().num_locations(term)
    }

    pub fn num_positions(&self, term: &str, location: &str) -> usize {
        self.inner.read().num_positions(term, location)
    }

    pub fn terms(&self) -> Vec<String> {
        self.inner.read().terms().map(str::to_string).collect()
    }

    pub fn locations(&self, term: &str) -> Vec<String> {
        self.inner.read().locations(term).map(str::to_string).collect()
    }

    /// Snapshot of the position set; empty when the pair is absent.
    pub fn positions(&self, term: &str, location: &str) -> BTreeSet<usize> {
        self.inner
            .read()
            .positions(term, location)
            .cloned()
            .unwrap_or_default()
    }

    pub fn location_counts(&self) -> BTreeMap<String, usize> {
        self.inner.read().location_counts().clone()
    }

    pub fn word_count(&self, location: &str) -> usize {
        self.inner.read().word_count(location)
    }

    pub fn search(&self, query: &BTreeSet<String>, exact: bool) -> Vec<SearchResult> {
        self.inner.read().search(query, exact)
    }

    pub fn exact_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult> {
        self.inner.read().exact_search(query)
    }

    pub fn partial_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult> {
        self.inner.read().partial_search(query)
    }

    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        self.inner.read().write_json(path)
    }

    pub fn write_counts_json(&self, path: &Path) -> io::Result<()> {
        self.inner.read().write_counts_json(path)
    }

    pub fn to_json_string(&self) -> String {
        self.inner.read().to_json_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_concurrent_merges_union() {
        let shared = Arc::new(SharedIndex::new());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    let mut local = InvertedIndex::new();
                    let location = format!("/doc{worker}.txt");
                    local.add("common", &location, 1);
                    local.add(&format!("term{worker}"), &location, 2);
                    shared.add_all(local);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.num_locations("common"), 8);
        // 8 worker terms plus "common"
        assert_eq!(shared.num_terms(), 9);
        for worker in 0..8 {
            assert_eq!(shared.word_count(&format!("/doc{worker}.txt")), 2);
        }
    }

    #[test]
    fn test_snapshots_outlive_later_writes() {
        let shared = SharedIndex::new();
        shared.add("apple", "x", 1);

        let positions = shared.positions("apple", "x");
        let counts = shared.location_counts();

        shared.add("apple", "x", 2);

        // Earlier snapshots are unaffected by the later write.
        assert_eq!(positions.len(), 1);
        assert_eq!(counts.get("x"), Some(&1));
        assert_eq!(shared.num_positions("apple", "x"), 2);
    }

    #[test]
    fn test_readers_run_while_index_grows() {
        let shared = Arc::new(SharedIndex::new());
        shared.add("seed", "loc", 1);

        let writer = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for position in 2..200 {
                    shared.add("seed", "loc", position);
                }
            })
        };
        let reader = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..200 {
                    let query = BTreeSet::from(["seed".to_string()]);
                    let results = shared.search(&query, true);
                    assert_eq!(results.len(), 1);
                    // Count and word count always agree within one read.
                    assert!(results[0].count <= shared.word_count("loc"));
                }
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(shared.num_positions("seed", "loc"), 199);
    }
}
