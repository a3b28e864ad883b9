//! The inverted index
//!
//! A three-level sorted mapping from stemmed term to location to the set of
//! 1-based positions where the term occurs there, alongside a per-location
//! word count (the highest position ever recorded, used as the document
//! length in scoring). Empty inner structures never appear: a term exists
//! only while at least one location under it holds at least one position.

pub mod shared;

pub use shared::SharedIndex;

use crate::json;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::io;
use std::path::Path;

/// Location -> ascending position set, the inner two levels of the index.
pub type Postings = BTreeMap<String, BTreeSet<usize>>;

#[derive(Debug, Default)]
pub struct InvertedIndex {
    index: BTreeMap<String, Postings>,
    counts: BTreeMap<String, usize>,
}

/// A single ranked match: the location, the total number of query-term
/// occurrences there, and that count divided by the location's word count.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    #[serde(rename = "where")]
    pub location: String,
    pub count: usize,
    pub score: f64,
}

impl SearchResult {
    fn new(location: &str) -> Self {
        Self {
            location: location.to_string(),
            count: 0,
            score: 0.0,
        }
    }
}

impl PartialEq for SearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchResult {}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchResult {
    /// Score descending, then count descending, then location ascending
    /// ignoring ASCII case.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.count.cmp(&self.count))
            .then_with(|| cmp_ignore_ascii_case(&self.location, &other.location))
    }
}

fn cmp_ignore_ascii_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.chars().map(|c| c.to_ascii_lowercase()))
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `term` at `location`. `position` is 1-based
    /// and monotonically increasing within a location, so the location's
    /// word count is the maximum position seen.
    pub fn add(&mut self, term: &str, location: &str, position: usize) {
        debug_assert!(position >= 1, "positions are 1-based");

        match self.index.get_mut(term) {
            Some(locations) => match locations.get_mut(location) {
                Some(positions) => {
                    positions.insert(position);
                }
                None => {
                    locations.insert(location.to_string(), BTreeSet::from([position]));
                }
            },
            None => {
                let mut locations = Postings::new();
                locations.insert(location.to_string(), BTreeSet::from([position]));
                self.index.insert(term.to_string(), locations);
            }
        }

        match self.counts.get_mut(location) {
            Some(count) => {
                if *count < position {
                    *count = position;
                }
            }
            None => {
                self.counts.insert(location.to_string(), position);
            }
        }
    }

    /// Merge another index into this one: position sets union per
    /// (term, location), location counts take the per-location maximum.
    /// Merging is commutative and associative with respect to the final
    /// state.
    pub fn add_all(&mut self, other: InvertedIndex) {
        for (term, locations) in other.index {
            match self.index.entry(term) {
                Entry::Vacant(slot) => {
                    slot.insert(locations);
                }
                Entry::Occupied(mut slot) => {
                    for (location, positions) in locations {
                        slot.get_mut().entry(location).or_default().extend(positions);
                    }
                }
            }
        }

        for (location, count) in other.counts {
            match self.counts.entry(location) {
                Entry::Vacant(slot) => {
                    slot.insert(count);
                }
                Entry::Occupied(mut slot) => {
                    if *slot.get() < count {
                        slot.insert(count);
                    }
                }
            }
        }
    }

    pub fn has_term(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    pub fn has_location(&self, term: &str, location: &str) -> bool {
        self.index
            .get(term)
            .is_some_and(|locations| locations.contains_key(location))
    }

    pub fn has_position(&self, term: &str, location: &str, position: usize) -> bool {
        self.positions(term, location)
            .is_some_and(|positions| positions.contains(&position))
    }

    pub fn num_terms(&self) -> usize {
        self.index.len()
    }

    pub fn num_locations(&self, term: &str) -> usize {
        self.index.get(term).map_or(0, BTreeMap::len)
    }

    pub fn num_positions(&self, term: &str, location: &str) -> usize {
        self.positions(term, location).map_or(0, BTreeSet::len)
    }

    /// Terms in sorted order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    /// Locations holding `term`, in sorted order; empty if the term is absent.
    pub fn locations<'a>(&'a self, term: &str) -> impl Iterator<Item = &'a str> {
        self.index
            .get(term)
            .into_iter()
            .flat_map(|locations| locations.keys().map(String::as_str))
    }

    /// The ascending position set for `(term, location)`, if present.
    pub fn positions(&self, term: &str, location: &str) -> Option<&BTreeSet<usize>> {
        self.index.get(term)?.get(location)
    }

    /// Location -> word count for every location that has been indexed.
    pub fn location_counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    /// The word count of one location; 0 if never indexed.
    pub fn word_count(&self, location: &str) -> usize {
        self.counts.get(location).copied().unwrap_or(0)
    }

    /// Dispatch to exact or prefix search.
    pub fn search(&self, query: &BTreeSet<String>, exact: bool) -> Vec<SearchResult> {
        if exact {
            self.exact_search(query)
        } else {
            self.partial_search(query)
        }
    }

    /// Match only index terms equal to a query term.
    pub fn exact_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut results = Vec::new();
        let mut slots = HashMap::new();
        for term in query {
            if self.index.contains_key(term.as_str()) {
                self.accumulate(term, &mut slots, &mut results);
            }
        }
        results.sort();
        results
    }

    /// Match every index term that has a query term as a prefix. Walks the
    /// sorted term map from each query term and stops as soon as a key no
    /// longer starts with it.
    pub fn partial_search(&self, query: &BTreeSet<String>) -> Vec<SearchResult> {
        let mut results = Vec::new();
        let mut slots = HashMap::new();
        for term in query {
            for key in self.index.range::<String, _>(term.clone()..).map(|(k, _)| k) {
                if !key.starts_with(term.as_str()) {
                    break;
                }
                self.accumulate(key, &mut slots, &mut results);
            }
        }
        results.sort();
        results
    }

    /// Fold one matched index term into the running result list: the first
    /// sighting of a location appends a result, later sightings update it.
    fn accumulate(
        &self,
        term: &str,
        slots: &mut HashMap<String, usize>,
        results: &mut Vec<SearchResult>,
    ) {
        let Some(locations) = self.index.get(term) else {
            return;
        };
        for (location, positions) in locations {
            let slot = match slots.get(location) {
                Some(&slot) => slot,
                None => {
                    slots.insert(location.clone(), results.len());
                    results.push(SearchResult::new(location));
                    results.len() - 1
                }
            };
            let result = &mut results[slot];
            result.count += positions.len();
            result.score = result.count as f64 / self.word_count(location).max(1) as f64;
        }
    }

    /// Write the index as pretty JSON.
    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        json::write_index_to_path(&self.index, path)
    }

    /// Write location word counts as pretty JSON.
    pub fn write_counts_json(&self, path: &Path) -> io::Result<()> {
        json::write_counts_to_path(&self.counts, path)
    }

    pub fn to_json_string(&self) -> String {
        json::index_to_string(&self.index)
    }
}

impl fmt::Display for InvertedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_string())
    }
}
