//! Bounded web crawling
//!
//! Breadth-first expansion from a seed URL over the work queue. Every
//! worker fetches one page, enqueues its undiscovered links while the
//! visited set is below the limit, builds a private index for the page
//! text, and merges it into the shared index in one write. Workers enqueue
//! further workers, so the queue's `finish` barrier is the only correct
//! termination signal.

use crate::fetch::{FetchConfig, HtmlFetcher};
use crate::html::{links, HtmlCleaner};
use crate::index::{InvertedIndex, SharedIndex};
use crate::sync::queue::WorkQueue;
use crate::text::{self, WordStemmer};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

pub struct Crawler {
    ctx: Arc<CrawlContext>,
}

/// Shared handles held by every crawl worker.
struct CrawlContext {
    index: Arc<SharedIndex>,
    queue: Arc<WorkQueue>,
    /// Maximum number of locations admitted to the visited set, the seed
    /// included. Bounds enqueued workers, not links examined per page.
    limit: usize,
    visited: Mutex<HashSet<String>>,
    fetcher: HtmlFetcher,
    cleaner: HtmlCleaner,
}

impl Crawler {
    pub fn new(index: Arc<SharedIndex>, queue: Arc<WorkQueue>, limit: usize) -> Self {
        Self {
            ctx: Arc::new(CrawlContext {
                index,
                queue,
                limit,
                visited: Mutex::new(HashSet::new()),
                fetcher: HtmlFetcher::new(FetchConfig::default()),
                cleaner: HtmlCleaner::new(),
            }),
        }
    }

    /// Crawl from `seed`, blocking until every admitted page has been
    /// fetched and merged.
    pub fn crawl(&self, seed: &Url) {
        let seed = links::canonicalize(seed);
        info!("crawling from {seed}");
        self.ctx.visited.lock().insert(seed.to_string());
        CrawlContext::submit(Arc::clone(&self.ctx), seed);
        self.ctx.queue.finish();
        info!(
            "crawl finished: {} locations discovered",
            self.ctx.visited.lock().len()
        );
    }

    /// Canonical URLs discovered so far (admitted to the crawl).
    pub fn visited(&self) -> usize {
        self.ctx.visited.lock().len()
    }
}

impl CrawlContext {
    fn submit(ctx: Arc<Self>, url: Url) {
        let queue = Arc::clone(&ctx.queue);
        queue.execute(move || Self::process(ctx, url));
    }

    fn process(ctx: Arc<Self>, url: Url) {
        let Some(html) = ctx.fetcher.fetch_default(&url) else {
            debug!("no html at {url}");
            return;
        };

        // Links come from the block-stripped page so script and style
        // bodies never contribute anchors.
        let stripped = ctx.cleaner.strip_block_elements(&html);
        for link in links::extract_links(&url, &stripped) {
            let fresh = {
                let mut visited = ctx.visited.lock();
                if visited.len() >= ctx.limit {
                    break;
                }
                visited.insert(link.to_string())
            };
            if fresh {
                Self::submit(Arc::clone(&ctx), link);
            }
        }

        let plain = ctx.cleaner.decode_entities(&ctx.cleaner.strip_tags(&stripped));
        let stemmer = WordStemmer::new();
        let location = url.to_string();

        let mut local = InvertedIndex::new();
        let mut position = 0;
        for word in text::parse(&plain) {
            position += 1;
            local.add(&stemmer.stem(&word), &location, position);
        }
        ctx.index.add_all(local);
    }
}
