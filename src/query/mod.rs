//! Query processing
//!
//! A query line is parsed and stemmed into a sorted set of unique terms;
//! the canonical form (the terms joined by single spaces) keys a cache of
//! computed result lists, so a repeated query searches the index once. An
//! empty canonical query is a no-op.

use crate::index::{InvertedIndex, SearchResult, SharedIndex};
use crate::json;
use crate::sync::queue::WorkQueue;
use crate::text;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

/// The canonical form of a stemmed query set.
pub fn canonical(query: &BTreeSet<String>) -> String {
    query
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Serial query processor over an unsynchronized index.
pub struct Queries<'a> {
    index: &'a InvertedIndex,
    results: BTreeMap<String, Vec<SearchResult>>,
}

impl<'a> Queries<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self {
        Self {
            index,
            results: BTreeMap::new(),
        }
    }

    /// Search for one query line, caching per canonical query.
    pub fn process_query(&mut self, line: &str, exact: bool) {
        let query = text::unique_stems(line);
        if query.is_empty() {
            return;
        }
        let joined = canonical(&query);
        if self.results.contains_key(&joined) {
            return;
        }
        let found = self.index.search(&query, exact);
        self.results.insert(joined, found);
    }

    /// Process a file of queries, one per line.
    pub fn process_queries(&mut self, file: &Path, exact: bool) -> io::Result<()> {
        let reader = BufReader::new(File::open(file)?);
        for line in reader.lines() {
            self.process_query(&line?, exact);
        }
        Ok(())
    }

    pub fn results(&self) -> &BTreeMap<String, Vec<SearchResult>> {
        &self.results
    }

    pub fn write_results_json(&self, path: &Path) -> io::Result<()> {
        json::write_results_to_path(&self.results, path)
    }
}

/// Multithreaded query processor: every line becomes a task on the work
/// queue.
pub struct ThreadedQueries {
    index: Arc<SharedIndex>,
    queue: Arc<WorkQueue>,
    results: Arc<Mutex<BTreeMap<String, Vec<SearchResult>>>>,
}

impl ThreadedQueries {
    pub fn new(index: Arc<SharedIndex>, queue: Arc<WorkQueue>) -> Self {
        Self {
            index,
            queue,
            results: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Submit one query line to the pool. The contains-check and the insert
    /// are separate critical sections; two tasks racing on the same
    /// canonical query recompute identical results and the last write wins.
    pub fn process_query(&self, line: &str, exact: bool) {
        let line = line.to_string();
        let index = Arc::clone(&self.index);
        let results = Arc::clone(&self.results);
        self.queue.execute(move || {
            let query = text::unique_stems(&line);
            if query.is_empty() {
                return;
            }
            let joined = canonical(&query);
            if results.lock().contains_key(&joined) {
                return;
            }
            let found = index.search(&query, exact);
            results.lock().insert(joined, found);
        });
    }

    /// Process a file of queries and block until every search completes.
    pub fn process_queries(&self, file: &Path, exact: bool) -> io::Result<()> {
        let reader = BufReader::new(File::open(file)?);
        for line in reader.lines() {
            self.process_query(&line?, exact);
        }
        self.queue.finish();
        Ok(())
    }

    pub fn results_snapshot(&self) -> BTreeMap<String, Vec<SearchResult>> {
        self.results.lock().clone()
    }

    pub fn write_results_json(&self, path: &Path) -> io::Result<()> {
        json::write_results_to_path(&self.results.lock(), path)
    }
}
