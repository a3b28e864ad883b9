//! Link extraction and URL canonicalization

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

/// Canonicalize a URL: drop the fragment, keep scheme, user info, host,
/// port, path, and query exactly as parsed. Canonicalization is idempotent.
pub fn canonicalize(url: &Url) -> Url {
    let mut cleaned = url.clone();
    cleaned.set_fragment(None);
    cleaned
}

/// Extract every http(s) link from the anchor `href` attributes in `html`,
/// resolved against `base` and canonicalized, in document order. Malformed
/// or non-web references are skipped, and duplicates are preserved (the
/// crawler's visited set deduplicates).
pub fn extract_links(base: &Url, html: &str) -> Vec<Url> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();
    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        match base.join(href) {
            Ok(absolute) if matches!(absolute.scheme(), "http" | "https") => {
                links.push(canonicalize(&absolute));
            }
            Ok(other) => debug!("skipping non-web link {other}"),
            Err(err) => debug!("skipping malformed href {href:?}: {err}"),
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/a/page.html").unwrap()
    }

    #[test]
    fn test_relative_links_resolve_against_base() {
        let html = r#"<a href="other.html">x</a><a href="/root.html">y</a>"#;
        let links = extract_links(&base(), html);
        assert_eq!(
            links.iter().map(Url::as_str).collect::<Vec<_>>(),
            vec![
                "https://example.com/a/other.html",
                "https://example.com/root.html"
            ]
        );
    }

    #[test]
    fn test_fragments_are_stripped_queries_kept() {
        let html = r#"<a href="doc.html?lang=en#section">x</a>"#;
        let links = extract_links(&base(), html);
        assert_eq!(links[0].as_str(), "https://example.com/a/doc.html?lang=en");
    }

    #[test]
    fn test_document_order_and_duplicates() {
        let html = r#"<a href="b">1</a><a href="a">2</a><a href="b">3</a>"#;
        let links = extract_links(&base(), html);
        let paths: Vec<_> = links.iter().map(|u| u.path()).collect();
        assert_eq!(paths, vec!["/a/b", "/a/a", "/a/b"]);
    }

    #[test]
    fn test_non_web_schemes_skipped() {
        let html = r#"<a href="javascript:alert('hi')">x</a><a href="mailto:a@b.c">y</a><a href="ok.html">z</a>"#;
        let links = extract_links(&base(), html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].path(), "/a/ok.html");
    }

    #[test]
    fn test_canonicalize_is_idempotent() {
        let url = Url::parse("https://docs.example.org/3/lib.html?hl=str#format").unwrap();
        let once = canonicalize(&url);
        let twice = canonicalize(&once);
        assert_eq!(once, twice);
        assert_eq!(once.as_str(), "https://docs.example.org/3/lib.html?hl=str");
    }

    #[test]
    fn test_case_and_trailing_slash_preserved() {
        let url = Url::parse("https://example.com/Path/Dir/").unwrap();
        assert_eq!(canonicalize(&url).as_str(), "https://example.com/Path/Dir/");
    }
}
