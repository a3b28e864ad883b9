//! Crawler and fetcher tests against a loopback HTTP server
//!
//! A minimal threaded server answers canned responses per path, which keeps
//! the socket-level fetcher, redirect handling, and the bounded crawl fully
//! exercised without touching the network.

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use url::Url;
use webdex::crawl::Crawler;
use webdex::fetch::{FetchConfig, HtmlFetcher};
use webdex::index::SharedIndex;
use webdex::query::ThreadedQueries;
use webdex::sync::queue::WorkQueue;

type Responder = dyn Fn(&str) -> String + Send + Sync;

/// Start a loopback server answering each request with `respond(path)`.
/// Returns the base URL. The listener thread lives for the rest of the
/// test process.
fn spawn_server(respond: impl Fn(&str) -> String + Send + Sync + 'static) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let respond: Arc<Responder> = Arc::new(respond);

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let respond = Arc::clone(&respond);
            thread::spawn(move || handle(stream, respond.as_ref()));
        }
    });

    format!("http://{addr}")
}

fn handle(stream: TcpStream, respond: &Responder) {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) if line.trim_end().is_empty() => break,
            Ok(_) => {}
            Err(_) => return,
        }
    }

    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();
    let response = respond(&path);
    let mut stream = reader.into_inner();
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn html(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=UTF-8\r\n\r\n<html><body>{body}</body></html>"
    )
}

fn redirect(location: &str) -> String {
    format!("HTTP/1.1 301 Moved Permanently\r\nLocation: {location}\r\n\r\n")
}

fn not_found() -> String {
    "HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\n\r\nmissing".to_string()
}

fn plain(body: &str) -> String {
    format!("HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\r\n{body}")
}

#[test]
fn test_fetch_returns_html_body() {
    let base = spawn_server(|path| match path {
        "/" => html("<p>hello fetcher</p>"),
        _ => not_found(),
    });
    let fetcher = HtmlFetcher::new(FetchConfig::default());
    let url = Url::parse(&format!("{base}/")).unwrap();

    let body = fetcher.fetch(&url, 0).unwrap();
    assert!(body.contains("hello fetcher"));
}

#[test]
fn test_fetch_rejects_non_html_and_error_statuses() {
    let base = spawn_server(|path| match path {
        "/plain" => plain("just text"),
        "/missing" => not_found(),
        _ => html("ok"),
    });
    let fetcher = HtmlFetcher::new(FetchConfig::default());

    let plain_url = Url::parse(&format!("{base}/plain")).unwrap();
    assert!(fetcher.fetch(&plain_url, 0).is_none());

    let missing_url = Url::parse(&format!("{base}/missing")).unwrap();
    assert!(fetcher.fetch(&missing_url, 0).is_none());
}

#[test]
fn test_fetch_connection_refused_is_absent() {
    // Bind-and-drop to find a port with nothing listening.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let fetcher = HtmlFetcher::new(FetchConfig::default());
    let url = Url::parse(&format!("http://127.0.0.1:{port}/")).unwrap();
    assert!(fetcher.fetch(&url, 3).is_none());
}

#[test]
fn test_redirect_chain_respects_budget() {
    // Four 301s before the final 200 page.
    let base = spawn_server(|path| match path {
        "/start" => redirect("/hop1"),
        "/hop1" => redirect("/hop2"),
        "/hop2" => redirect("/hop3"),
        "/hop3" => redirect("/end"),
        "/end" => html("made it"),
        _ => not_found(),
    });
    let fetcher = HtmlFetcher::new(FetchConfig::default());
    let url = Url::parse(&format!("{base}/start")).unwrap();

    assert!(fetcher.fetch(&url, 3).is_none());
    let body = fetcher.fetch(&url, 4).unwrap();
    assert!(body.contains("made it"));
}

#[test]
fn test_crawl_indexes_page_text_with_positions() {
    let base = spawn_server(|path| match path {
        "/" => html("<script>var spider = 1;</script><p>Hello, hello! Worlds world.</p>"),
        _ => not_found(),
    });
    let seed = Url::parse(&format!("{base}/")).unwrap();

    let index = Arc::new(SharedIndex::new());
    let queue = Arc::new(WorkQueue::new(3).unwrap());
    Crawler::new(Arc::clone(&index), Arc::clone(&queue), 50).crawl(&seed);

    let location = seed.to_string();
    assert_eq!(
        index.positions("hello", &location).into_iter().collect::<Vec<_>>(),
        vec![1, 2]
    );
    assert_eq!(
        index.positions("world", &location).into_iter().collect::<Vec<_>>(),
        vec![3, 4]
    );
    assert_eq!(index.word_count(&location), 4);
    // Script content never reaches the tokenizer.
    assert!(!index.has_term("spider"));
    assert!(!index.has_term("var"));
}

#[test]
fn test_crawl_decodes_entities() {
    let base = spawn_server(|path| match path {
        "/" => html("<p>fish &amp; chips &#67;ake</p>"),
        _ => not_found(),
    });
    let seed = Url::parse(&format!("{base}/")).unwrap();

    let index = Arc::new(SharedIndex::new());
    let queue = Arc::new(WorkQueue::new(2).unwrap());
    Crawler::new(Arc::clone(&index), Arc::clone(&queue), 50).crawl(&seed);

    assert!(index.has_term("fish"));
    assert!(index.has_term("chip"));
    assert!(index.has_term("cake"));
}

#[test]
fn test_crawl_follows_links_and_deduplicates() {
    let base = spawn_server(|path| match path {
        "/" => html(
            "<a href=\"/page1\">one</a>\
             <a href=\"/page1#section\">same</a>\
             <a href=\"/page2\">two</a>\
             <a href=\"/page1\">again</a>\
             seed words",
        ),
        "/page1" => html("first page words"),
        "/page2" => html("second page words"),
        _ => not_found(),
    });
    let seed = Url::parse(&format!("{base}/")).unwrap();

    let index = Arc::new(SharedIndex::new());
    let queue = Arc::new(WorkQueue::new(3).unwrap());
    let crawler = Crawler::new(Arc::clone(&index), Arc::clone(&queue), 50);
    crawler.crawl(&seed);

    // Seed plus two distinct pages; the fragment and repeat collapse.
    assert_eq!(crawler.visited(), 3);
    assert_eq!(index.location_counts().len(), 3);
    assert_eq!(index.num_locations("word"), 3);
    assert!(index.has_location("first", &format!("{base}/page1")));
}

#[test]
fn test_crawl_limit_bounds_locations() {
    let links: String = (0..100)
        .map(|i| format!("<a href=\"/page{i}\">{i}</a>"))
        .collect();
    let base = spawn_server(move |path| {
        if path == "/" {
            html(&format!("{links} seed text"))
        } else {
            html("leaf page text")
        }
    });
    let seed = Url::parse(&format!("{base}/")).unwrap();

    let index = Arc::new(SharedIndex::new());
    let queue = Arc::new(WorkQueue::new(4).unwrap());
    let crawler = Crawler::new(Arc::clone(&index), Arc::clone(&queue), 10);
    crawler.crawl(&seed);

    // The seed counts toward the limit.
    assert_eq!(crawler.visited(), 10);
    assert_eq!(index.location_counts().len(), 10);
}

#[test]
fn test_crawl_then_query_pipeline() {
    let base = spawn_server(|path| match path {
        "/" => html("<a href=\"/deep\">deep</a> surface mention of engines"),
        "/deep" => html("engines engines everywhere"),
        _ => not_found(),
    });
    let seed = Url::parse(&format!("{base}/")).unwrap();

    let index = Arc::new(SharedIndex::new());
    let queue = Arc::new(WorkQueue::new(3).unwrap());
    Crawler::new(Arc::clone(&index), Arc::clone(&queue), 50).crawl(&seed);

    let queries = ThreadedQueries::new(Arc::clone(&index), Arc::clone(&queue));
    queries.process_query("engines", true);
    queue.finish();

    let results = queries.results_snapshot();
    let ranked = results.get("engin").unwrap();
    assert_eq!(ranked.len(), 2);
    // Two of three words match on /deep; one of five matches on the seed.
    assert_eq!(ranked[0].location, format!("{base}/deep"));
    assert_eq!(ranked[0].count, 2);
    assert_eq!(ranked[1].count, 1);
}

#[test]
fn test_partial_search_over_crawled_pages() {
    let base = spawn_server(|path| match path {
        "/" => html("<a href=\"/b\">b</a> cap capped"),
        "/b" => html("capital letters"),
        _ => not_found(),
    });
    let seed = Url::parse(&format!("{base}/")).unwrap();

    let index = Arc::new(SharedIndex::new());
    let queue = Arc::new(WorkQueue::new(2).unwrap());
    Crawler::new(Arc::clone(&index), Arc::clone(&queue), 50).crawl(&seed);

    let query = BTreeSet::from(["cap".to_string()]);
    let results = index.partial_search(&query);
    let locations: BTreeSet<_> = results.iter().map(|r| r.location.clone()).collect();
    assert!(locations.contains(&seed.to_string()));
    assert!(locations.contains(&format!("{base}/b")));
}
