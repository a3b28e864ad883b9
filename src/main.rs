//! Command-line driver
//!
//! Wires the engine together from the flag set: build the index from a
//! directory of text files and/or a web crawl, write the index, counts,
//! and query results as pretty JSON, and optionally serve the search UI.
//! Per-stage errors go to stderr and processing continues; only startup
//! failures (worker pool, server bind) abort.

use anyhow::Result;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;
use webdex::args::ArgumentMap;
use webdex::build::{self, ThreadedBuilder};
use webdex::crawl::Crawler;
use webdex::index::{InvertedIndex, SharedIndex};
use webdex::query::{Queries, ThreadedQueries};
use webdex::sync::queue::WorkQueue;
use webdex::web::SearchServer;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("webdex=info")),
        )
        .init();

    let parser = ArgumentMap::parse(std::env::args().skip(1));
    if parser.num_flags() == 0 {
        eprintln!("Error: no valid arguments provided.");
        return Ok(());
    }

    let multithreaded =
        parser.has_flag("-threads") || parser.has_flag("-url") || parser.has_flag("-port");
    if multithreaded {
        run_threaded(&parser)
    } else {
        run_serial(&parser);
        Ok(())
    }
}

fn run_serial(parser: &ArgumentMap) {
    let mut index = InvertedIndex::new();

    if let Some(path) = parser.path("-path") {
        if let Err(err) = build::build(&path, &mut index) {
            eprintln!("Error building index from {}: {err}", path.display());
        }
    }

    if parser.has_flag("-index") {
        let out = parser.path_or("-index", "index.json");
        if let Err(err) = index.write_json(&out) {
            eprintln!("Error writing index to {}: {err}", out.display());
        }
    }

    if parser.has_flag("-counts") {
        let out = parser.path_or("-counts", "counts.json");
        if let Err(err) = index.write_counts_json(&out) {
            eprintln!("Error writing counts to {}: {err}", out.display());
        }
    }

    let mut queries = Queries::new(&index);
    if let Some(file) = parser.path("-query") {
        let exact = parser.has_flag("-exact");
        if let Err(err) = queries.process_queries(&file, exact) {
            eprintln!("Error reading queries from {}: {err}", file.display());
        }
    }

    if parser.has_flag("-results") {
        let out = parser.path_or("-results", "results.json");
        if let Err(err) = queries.write_results_json(&out) {
            eprintln!("Error writing results to {}: {err}", out.display());
        }
    }
}

fn run_threaded(parser: &ArgumentMap) -> Result<()> {
    let requested = parser
        .string("-threads")
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|&n| n > 0);
    if parser.has_flag("-threads") && requested.is_none() {
        eprintln!("Defaulted to 5 threads.");
    }
    let threads = requested.unwrap_or(5);

    let queue = Arc::new(WorkQueue::new(threads)?);
    let index = Arc::new(SharedIndex::new());

    if let Some(raw) = parser.string("-url") {
        let limit = parser.positive_or("-limit", 50);
        match Url::parse(raw) {
            Ok(seed) => {
                let crawler = Crawler::new(Arc::clone(&index), Arc::clone(&queue), limit);
                crawler.crawl(&seed);
            }
            Err(err) => {
                eprintln!("Invalid URL {raw}: {err}");
                debug!("seed url rejected: {raw}");
            }
        }
    }

    if let Some(path) = parser.path("-path") {
        let builder = ThreadedBuilder::new(Arc::clone(&index), Arc::clone(&queue));
        builder.build(&path);
    }

    if parser.has_flag("-index") {
        let out = parser.path_or("-index", "index.json");
        if let Err(err) = index.write_json(&out) {
            eprintln!("Error writing index to {}: {err}", out.display());
        }
    }

    if parser.has_flag("-counts") {
        let out = parser.path_or("-counts", "counts.json");
        if let Err(err) = index.write_counts_json(&out) {
            eprintln!("Error writing counts to {}: {err}", out.display());
        }
    }

    let queries = ThreadedQueries::new(Arc::clone(&index), Arc::clone(&queue));
    if let Some(file) = parser.path("-query") {
        let exact = parser.has_flag("-exact");
        if let Err(err) = queries.process_queries(&file, exact) {
            eprintln!("Error reading queries from {}: {err}", file.display());
        }
    }

    if parser.has_flag("-results") {
        let out = parser.path_or("-results", "results.json");
        if let Err(err) = queries.write_results_json(&out) {
            eprintln!("Error writing results to {}: {err}", out.display());
        }
    }

    if parser.has_flag("-port") {
        let port = u16::try_from(parser.positive_or("-port", 8080)).unwrap_or(8080);
        let server = SearchServer::new(Arc::clone(&index), port);
        server.run()?;
    }

    queue.shutdown();
    Ok(())
}
