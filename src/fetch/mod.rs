//! Socket-level HTML fetching
//!
//! One HTTP/1.1 GET per connection with `Connection: close`, TLS for
//! `https`. A fetch yields the body only when the final status is 200 and
//! the content type begins with `text/html`; redirects are followed up to
//! the caller's budget, and every failure (I/O, TLS, malformed URL, wrong
//! content type) maps to "absent" rather than an error.

use native_tls::TlsConnector;
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Internal failure modes; the public contract collapses all of them to `None`.
#[derive(Debug, Error)]
enum FetchError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("tls error: {0}")]
    Tls(#[from] native_tls::Error),
    #[error("tls handshake failed: {0}")]
    Handshake(String),
    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),
    #[error("url has no host")]
    NoHost,
}

/// Outcome of a single request/response round trip.
enum RoundTrip {
    /// 3xx with a `Location` header.
    Redirect(String),
    /// 200 with an HTML content type.
    Html(String),
    /// Anything else.
    Other,
}

/// Parsed status line and headers of an HTTP response.
///
/// Header names are lowercased on parse so lookups are case-insensitive;
/// values are everything after the first `": "`. The status line is kept
/// verbatim alongside the header map.
pub struct ResponseHead {
    pub status_line: String,
    headers: HashMap<String, Vec<String>>,
}

impl ResponseHead {
    /// Read the status line and headers up to the blank separator line.
    pub fn parse<R: BufRead>(reader: &mut R) -> io::Result<Self> {
        let mut status_line = String::new();
        if reader.read_line(&mut status_line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before status line",
            ));
        }
        let status_line = status_line.trim_end().to_string();

        let mut headers: HashMap<String, Vec<String>> = HashMap::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(": ") {
                headers
                    .entry(name.to_lowercase())
                    .or_default()
                    .push(value.to_string());
            }
        }

        Ok(Self {
            status_line,
            headers,
        })
    }

    /// The numeric status code, if the status line is well-formed.
    pub fn status_code(&self) -> Option<u16> {
        self.status_line.split_whitespace().nth(1)?.parse().ok()
    }

    /// First value of a header, looked up case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())?
            .first()
            .map(String::as_str)
    }

    /// True when the content type begins with `text/html`.
    pub fn is_html(&self) -> bool {
        self.header("content-type")
            .is_some_and(|value| value.to_lowercase().starts_with("text/html"))
    }

    /// The redirect target when the status is in [300, 399] and a
    /// `Location` header is present.
    pub fn redirect_location(&self) -> Option<&str> {
        match self.status_code() {
            Some(300..=399) => self.header("location"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Redirects followed per fetch when the caller does not say otherwise.
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { max_redirects: 3 }
    }
}

/// Fetches HTML over a raw socket.
pub struct HtmlFetcher {
    config: FetchConfig,
}

impl HtmlFetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    /// Fetch `url`, following up to `redirects` redirects. Returns the body
    /// when the final response is `200` HTML; `None` in every other case.
    pub fn fetch(&self, url: &Url, redirects: usize) -> Option<String> {
        match self.request(url, redirects) {
            Ok(body) => body,
            Err(err) => {
                debug!("fetch of {url} failed: {err}");
                None
            }
        }
    }

    /// Fetch with the configured default redirect budget.
    pub fn fetch_default(&self, url: &Url) -> Option<String> {
        self.fetch(url, self.config.max_redirects)
    }

    fn request(&self, url: &Url, redirects: usize) -> Result<Option<String>, FetchError> {
        match self.round_trip(url)? {
            RoundTrip::Html(body) => Ok(Some(body)),
            RoundTrip::Redirect(location) if redirects > 0 => match url.join(&location) {
                Ok(next) => self.request(&next, redirects - 1),
                Err(err) => {
                    debug!("unresolvable redirect target {location:?}: {err}");
                    Ok(None)
                }
            },
            _ => Ok(None),
        }
    }

    fn round_trip(&self, url: &Url) -> Result<RoundTrip, FetchError> {
        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(FetchError::UnsupportedScheme(scheme.to_string()));
        }
        let host = url.host_str().ok_or(FetchError::NoHost)?;
        let port = url.port_or_known_default().unwrap_or(80);
        let stream = TcpStream::connect((host, port))?;

        if scheme == "https" {
            let connector = TlsConnector::new()?;
            let tls = connector
                .connect(host, stream)
                .map_err(|err| FetchError::Handshake(err.to_string()))?;
            self.talk(tls, url, host)
        } else {
            self.talk(stream, url, host)
        }
    }

    fn talk<S: Read + Write>(
        &self,
        mut stream: S,
        url: &Url,
        host: &str,
    ) -> Result<RoundTrip, FetchError> {
        let target = request_target(url);
        write!(
            stream,
            "GET {target} HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n"
        )?;
        stream.flush()?;

        let mut reader = BufReader::new(stream);
        let head = ResponseHead::parse(&mut reader)?;

        if let Some(location) = head.redirect_location() {
            return Ok(RoundTrip::Redirect(location.to_string()));
        }
        if head.status_code() == Some(200) && head.is_html() {
            let mut body = Vec::new();
            reader.read_to_end(&mut body)?;
            return Ok(RoundTrip::Html(
                String::from_utf8_lossy(&body).into_owned(),
            ));
        }
        Ok(RoundTrip::Other)
    }
}

impl Default for HtmlFetcher {
    fn default() -> Self {
        Self::new(FetchConfig::default())
    }
}

/// Request target: path plus query, as sent on the request line.
fn request_target(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
