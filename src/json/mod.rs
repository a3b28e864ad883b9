//! Deterministic pretty JSON
//!
//! Emits the engine's three output shapes with a fixed layout: tab
//! indentation, a newline before each element, keys in the index's own
//! (lexicographic) iteration order, strings JSON-escaped, and scores
//! printed with exactly eight fractional digits. Not thread-safe: callers
//! hold the read lock for the duration or pass snapshots.

use crate::index::{Postings, SearchResult};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// `{ "term": { "location": [ positions... ], ... }, ... }`
pub fn write_index<W: Write>(w: &mut W, index: &BTreeMap<String, Postings>) -> io::Result<()> {
    w.write_all(b"{")?;
    let mut first = true;
    for (term, locations) in index {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        write_key(w, term, 0)?;
        write_postings(w, locations, 1)?;
    }
    w.write_all(b"\n}")
}

/// `{ "location": count, ... }`
pub fn write_counts<W: Write>(w: &mut W, counts: &BTreeMap<String, usize>) -> io::Result<()> {
    w.write_all(b"{")?;
    let mut first = true;
    for (location, count) in counts {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        write_key(w, location, 1)?;
        write!(w, "{count}")?;
    }
    w.write_all(b"\n}")
}

/// `{ "query": [ { "where": ..., "count": ..., "score": ... }, ... ], ... }`
pub fn write_results<W: Write>(
    w: &mut W,
    results: &BTreeMap<String, Vec<SearchResult>>,
) -> io::Result<()> {
    w.write_all(b"{")?;
    let mut first = true;
    for (query, list) in results {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        write_key(w, query, 1)?;
        write_result_list(w, list, 2)?;
    }
    w.write_all(b"\n}")
}

pub fn write_index_to_path(index: &BTreeMap<String, Postings>, path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_index(&mut writer, index)?;
    writer.flush()
}

pub fn write_counts_to_path(counts: &BTreeMap<String, usize>, path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_counts(&mut writer, counts)?;
    writer.flush()
}

pub fn write_results_to_path(
    results: &BTreeMap<String, Vec<SearchResult>>,
    path: &Path,
) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_results(&mut writer, results)?;
    writer.flush()
}

pub fn index_to_string(index: &BTreeMap<String, Postings>) -> String {
    let mut out = Vec::new();
    match write_index(&mut out, index) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(_) => String::new(),
    }
}

pub fn results_to_string(results: &BTreeMap<String, Vec<SearchResult>>) -> String {
    let mut out = Vec::new();
    match write_results(&mut out, results) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(_) => String::new(),
    }
}

/// One location -> positions object of the index.
fn write_postings<W: Write>(w: &mut W, locations: &Postings, level: usize) -> io::Result<()> {
    w.write_all(b"{")?;
    let mut first = true;
    for (location, positions) in locations {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        write_key(w, location, level)?;
        write_position_array(w, positions, level + 1)?;
    }
    w.write_all(b"\n")?;
    indent(w, level.saturating_sub(1))?;
    w.write_all(b"}")
}

fn write_position_array<W: Write>(
    w: &mut W,
    positions: &std::collections::BTreeSet<usize>,
    level: usize,
) -> io::Result<()> {
    w.write_all(b"[")?;
    let mut first = true;
    for position in positions {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        w.write_all(b"\n")?;
        indent(w, level + 1)?;
        write!(w, "{position}")?;
    }
    w.write_all(b"\n")?;
    indent(w, level.saturating_sub(1))?;
    w.write_all(b"]")
}

fn write_result_list<W: Write>(w: &mut W, list: &[SearchResult], level: usize) -> io::Result<()> {
    w.write_all(b"[")?;
    let mut first = true;
    for result in list {
        if !first {
            w.write_all(b",")?;
        }
        first = false;
        write_result(w, result, level)?;
    }
    w.write_all(b"\n")?;
    indent(w, level.saturating_sub(1))?;
    w.write_all(b"]")
}

fn write_result<W: Write>(w: &mut W, result: &SearchResult, level: usize) -> io::Result<()> {
    w.write_all(b"\n")?;
    indent(w, level)?;
    w.write_all(b"{")?;
    write_key(w, "where", level + 1)?;
    write_quoted(w, &result.location)?;
    w.write_all(b",")?;
    write_key(w, "count", level + 1)?;
    write!(w, "{}", result.count)?;
    w.write_all(b",")?;
    write_key(w, "score", level + 1)?;
    write!(w, "{:.8}", result.score)?;
    w.write_all(b"\n")?;
    indent(w, level)?;
    w.write_all(b"}")
}

/// Newline, indent, `"key": `.
fn write_key<W: Write>(w: &mut W, key: &str, level: usize) -> io::Result<()> {
    w.write_all(b"\n")?;
    indent(w, level)?;
    write_quoted(w, key)?;
    w.write_all(b": ")
}

fn indent<W: Write>(w: &mut W, times: usize) -> io::Result<()> {
    for _ in 0..times {
        w.write_all(b"\t")?;
    }
    Ok(())
}

fn write_quoted<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    w.write_all(b"\"")?;
    for c in s.chars() {
        match c {
            '"' => w.write_all(b"\\\"")?,
            '\\' => w.write_all(b"\\\\")?,
            '\n' => w.write_all(b"\\n")?,
            '\r' => w.write_all(b"\\r")?,
            '\t' => w.write_all(b"\\t")?,
            c if (c as u32) < 0x20 => write!(w, "\\u{:04x}", c as u32)?,
            c => write!(w, "{c}")?,
        }
    }
    w.write_all(b"\"")
}
