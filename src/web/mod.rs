//! Search front-end
//!
//! A small axum application over the shared index: an HTML search page and
//! a JSON API. The async runtime lives entirely inside this module; the
//! engine stays thread-based, so searches run on the blocking pool while
//! the read lock is held.

use crate::index::{SearchResult, SharedIndex};
use crate::text;
use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Clone)]
struct AppState {
    index: Arc<SharedIndex>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
    #[serde(default)]
    exact: bool,
}

pub struct SearchServer {
    index: Arc<SharedIndex>,
    port: u16,
}

impl SearchServer {
    pub fn new(index: Arc<SharedIndex>, port: u16) -> Self {
        Self { index, port }
    }

    /// Serve until the process exits. A bind failure is a startup error
    /// and aborts the caller.
    pub fn run(&self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?;
        runtime.block_on(self.serve())
    }

    async fn serve(&self) -> Result<()> {
        let state = AppState {
            index: Arc::clone(&self.index),
        };
        let app = Router::new()
            .route("/", get(search_page))
            .route("/api/search", get(api_search))
            .route("/api/counts", get(api_counts))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind port {}", self.port))?;
        info!("search UI listening on http://{addr}");
        axum::serve(listener, app).await.context("server error")?;
        Ok(())
    }
}

async fn search_page(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Html<String> {
    let results = run_search(&state, &params).await;
    Html(render_page(&params, results.as_deref()))
}

async fn api_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<SearchResult>> {
    Json(run_search(&state, &params).await.unwrap_or_default())
}

async fn api_counts(State(state): State<AppState>) -> Json<BTreeMap<String, usize>> {
    let index = Arc::clone(&state.index);
    let counts = tokio::task::spawn_blocking(move || index.location_counts())
        .await
        .unwrap_or_default();
    Json(counts)
}

/// Run one search off the async executor; `None` when no query was given.
async fn run_search(state: &AppState, params: &SearchParams) -> Option<Vec<SearchResult>> {
    let line = params.query.trim().to_string();
    if line.is_empty() {
        return None;
    }
    let exact = params.exact;
    let index = Arc::clone(&state.index);
    let found = tokio::task::spawn_blocking(move || {
        let query = text::unique_stems(&line);
        if query.is_empty() {
            Vec::new()
        } else {
            index.search(&query, exact)
        }
    })
    .await
    .unwrap_or_default();
    Some(found)
}

fn render_page(params: &SearchParams, results: Option<&[SearchResult]>) -> String {
    let query = html_escape::encode_double_quoted_attribute(&params.query);
    let checked = if params.exact { " checked" } else { "" };

    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head><title>webdex</title></head>\n<body>\n<h1>webdex</h1>\n",
    );
    let _ = write!(
        page,
        "<form method=\"get\" action=\"/\">\
         <input type=\"text\" name=\"query\" value=\"{query}\" size=\"40\">\
         <label><input type=\"checkbox\" name=\"exact\" value=\"true\"{checked}> exact</label>\
         <input type=\"submit\" value=\"Search\"></form>\n"
    );

    match results {
        None => {}
        Some([]) => page.push_str("<p>No results.</p>\n"),
        Some(list) => {
            page.push_str("<ol>\n");
            for result in list {
                let href = html_escape::encode_double_quoted_attribute(&result.location);
                let label = html_escape::encode_text(&result.location);
                let _ = write!(
                    page,
                    "<li><a href=\"{href}\">{label}</a> (matches: {}, score: {:.8})</li>\n",
                    result.count, result.score
                );
            }
            page.push_str("</ol>\n");
        }
    }

    page.push_str("</body>\n</html>\n");
    page
}
