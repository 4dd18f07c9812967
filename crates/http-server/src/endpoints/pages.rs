//! Documentation pages, reached by traversing the documentation tree
//! along the request path.

use crate::AppState;
use crate::html::{render_not_found, render_page};
use apidoc::Page;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use tracing::{debug, error};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// `json` for the page record instead of HTML.
    pub format: Option<String>,
}

pub async fn root_handler(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Response {
    page_response(state, String::new(), query).await
}

pub async fn page_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response {
    page_response(state, path, query).await
}

async fn page_response(state: AppState, path: String, query: PageQuery) -> Response {
    if !state.apidoc.devmode() {
        return StatusCode::NOT_FOUND.into_response();
    }

    // Expanding nodes reads and parses source files.
    let apidoc = state.apidoc.clone();
    let lookup = path.clone();
    let page = tokio::task::spawn_blocking(move || {
        let located = apidoc.traverse(&lookup)?;
        Some(Page::new(apidoc.introspector(), &located))
    })
    .await;

    match page {
        Ok(Some(page)) if query.format.as_deref() == Some("json") => Json(page).into_response(),
        Ok(Some(page)) => Html(render_page(&page)).into_response(),
        Ok(None) => {
            debug!("Nothing documented at `{path}`");
            (StatusCode::NOT_FOUND, Html(render_not_found(&path))).into_response()
        }
        Err(e) => {
            error!("Failed to build the page for `{path}`: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
