//! Where exported pages come from: the documentation router running in
//! process, or a live web server.

use crate::errors::{ExportError, Result};
use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use http::{Request, header};
use tower::ServiceExt;
use tracing::debug;

/// A fetched resource.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Fetched {
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|content_type| content_type.starts_with("text/html"))
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch the resource at an absolute path, e.g. `/++apidoc++/Code`.
    async fn fetch(&self, path: &str) -> Result<Fetched>;
}

/// Serves requests with the application router, without a network.
pub struct PublisherBackend {
    router: Router,
}

impl PublisherBackend {
    pub fn new(router: Router) -> Self {
        Self { router }
    }
}

#[async_trait]
impl Backend for PublisherBackend {
    async fn fetch(&self, path: &str) -> Result<Fetched> {
        let request = Request::get(path)
            .body(Body::empty())
            .map_err(|_| ExportError::InvalidUrl(path.to_string()))?;
        let response = match self.router.clone().oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| ExportError::Request {
                url: path.to_string(),
                reason: e.to_string(),
            })?;
        debug!("Published {path}: {status}");
        Ok(Fetched {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

/// Fetches pages from a running server, optionally with basic
/// authentication.
pub struct WebserverBackend {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl WebserverBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.username = Some(username.into());
        self.password = password;
        self
    }
}

#[async_trait]
impl Backend for WebserverBackend {
    async fn fetch(&self, path: &str) -> Result<Fetched> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_ref());
        }
        let response = request.send().await.map_err(|e| ExportError::Request {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(|e| ExportError::Request {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        debug!("Fetched {url}: {status}");
        Ok(Fetched {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}
