//! webdex: contextual web search
//!
//! A bounded web crawler builds an inverted index over the linked
//! neighborhood of a seed URL (or over a directory of text files), and
//! query processors answer exact or prefix searches against it, ranked by
//! term frequency normalized by document length. The pieces:
//!
//! - `text`: tokenizer + Snowball English stemming (fixes the vocabulary)
//! - `html`: regex-level HTML cleaning and link extraction
//! - `fetch`: socket-level HTTP/1.1 HTML fetcher with bounded redirects
//! - `sync`: reader/writer lock and the fixed-size work queue
//! - `index`: the inverted index core, search, and the thread-safe wrapper
//! - `build`: filesystem index builders
//! - `crawl`: the bounded breadth-first crawler
//! - `query`: query processors with a canonical-query result cache
//! - `json`: deterministic pretty-JSON output
//! - `web`: the search front-end served on `-port`

pub mod args;
pub mod build;
pub mod crawl;
pub mod fetch;
pub mod html;
pub mod index;
pub mod json;
pub mod query;
pub mod sync;
pub mod text;
pub mod web;

pub use index::{InvertedIndex, SearchResult, SharedIndex};
pub use sync::queue::WorkQueue;
pub use sync::rwlock::ReadWriteLock;
