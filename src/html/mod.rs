//! HTML cleaning
//!
//! Turns raw HTML into plain text suitable for tokenization. The passes run
//! in order: block elements (script/style/head/noscript) are removed with
//! their content, remaining tags are removed, and entities are decoded.
//! Matching is regex-level and tolerant of whitespace and attributes inside
//! tags, not a full parser.

pub mod links;

use regex_lite::Regex;
use std::sync::OnceLock;

static RE_BLOCKS: OnceLock<Vec<Regex>> = OnceLock::new();
static RE_TAG: OnceLock<Regex> = OnceLock::new();

/// Elements whose content never reaches the tokenizer.
const BLOCK_ELEMENTS: &[&str] = &["script", "style", "head", "noscript"];

fn block_patterns() -> &'static [Regex] {
    RE_BLOCKS.get_or_init(|| {
        BLOCK_ELEMENTS
            .iter()
            .map(|name| {
                Regex::new(&format!(r"(?is)<\s*{name}\b[^>]*>.*?<\s*/\s*{name}\s*>")).unwrap()
            })
            .collect()
    })
}

fn tag_pattern() -> &'static Regex {
    RE_TAG.get_or_init(|| Regex::new(r"(?s)<[^>]*>").unwrap())
}

/// Regex-level HTML cleaner.
pub struct HtmlCleaner;

impl HtmlCleaner {
    pub fn new() -> Self {
        Self
    }

    /// Remove block elements together with their content, case-insensitively.
    pub fn strip_block_elements(&self, html: &str) -> String {
        let mut text = html.to_string();
        for pattern in block_patterns() {
            text = pattern.replace_all(&text, "").into_owned();
        }
        text
    }

    /// Remove every remaining `<...>` tag.
    pub fn strip_tags(&self, html: &str) -> String {
        tag_pattern().replace_all(html, "").into_owned()
    }

    /// Decode named and numeric HTML entities.
    pub fn decode_entities(&self, html: &str) -> String {
        html_escape::decode_html_entities(html).into_owned()
    }

    /// Full pipeline: block strip, tag strip, entity decode.
    pub fn clean(&self, html: &str) -> String {
        self.decode_entities(&self.strip_tags(&self.strip_block_elements(html)))
    }
}

impl Default for HtmlCleaner {
    fn default() -> Self {
        Self::new()
    }
}
