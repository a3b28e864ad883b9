//! Filesystem index builders
//!
//! Recursively discovers text files (`.txt`/`.text`, case-insensitive)
//! under a path and indexes them. The serial builder mutates the index
//! directly; the threaded builder gives every file its own worker, each
//! populating a private index that is merged into the shared index in a
//! single write.

use crate::index::{InvertedIndex, SharedIndex};
use crate::sync::queue::WorkQueue;
use crate::text::{self, WordStemmer};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use walkdir::WalkDir;

/// True for files ending `.txt` or `.text`, case-insensitive.
pub fn is_text_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
        .to_lowercase();
    name.ends_with(".txt") || name.ends_with(".text")
}

/// Every text file under `path`, or `path` itself if it is one.
pub fn text_files(path: &Path) -> Vec<PathBuf> {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!("skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_text_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

/// Parse one text file into `index`. Positions are numbered from 1 and
/// continue across lines; the location key is the file's path as given.
pub fn parse_file(file: &Path, index: &mut InvertedIndex) -> io::Result<()> {
    let stemmer = WordStemmer::new();
    let location = file.display().to_string();
    let reader = BufReader::new(File::open(file)?);

    let mut position = 0;
    for line in reader.lines() {
        for word in text::parse(&line?) {
            position += 1;
            index.add(&stemmer.stem(&word), &location, position);
        }
    }
    Ok(())
}

/// Build `index` from every text file under `path`, serially.
pub fn build(path: &Path, index: &mut InvertedIndex) -> io::Result<()> {
    for file in text_files(path) {
        parse_file(&file, index)?;
    }
    Ok(())
}

/// Multithreaded filesystem builder.
pub struct ThreadedBuilder {
    index: Arc<SharedIndex>,
    queue: Arc<WorkQueue>,
}

impl ThreadedBuilder {
    pub fn new(index: Arc<SharedIndex>, queue: Arc<WorkQueue>) -> Self {
        Self { index, queue }
    }

    /// Index every text file under `path`, one worker per file, and block
    /// until all of them have merged.
    pub fn build(&self, path: &Path) {
        for file in text_files(path) {
            let index = Arc::clone(&self.index);
            self.queue.execute(move || {
                let mut local = InvertedIndex::new();
                match parse_file(&file, &mut local) {
                    Ok(()) => index.add_all(local),
                    Err(err) => debug!("error parsing {}: {err}", file.display()),
                }
            });
        }
        self.queue.finish();
    }
}
