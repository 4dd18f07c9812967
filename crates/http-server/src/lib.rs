//! The documentation browser over HTTP.
//!
//! Pages live below the configured base URL (`/++apidoc++` by default)
//! and are rendered as HTML, or as JSON with `?format=json`. Style sheets
//! and scripts are embedded in the binary.

pub mod endpoints;
pub mod html;
pub mod metrics;

use crate::endpoints::health::health_handler;
use crate::endpoints::metrics::metrics_handler;
use crate::endpoints::pages::{page_handler, root_handler};
use crate::html::STATIC_PREFIX;
use crate::metrics::{Metrics, request_metrics_middleware};
use anyhow::Result;
use apidoc::Apidoc;
use axum::http::HeaderValue;
use axum::response::Redirect;
use axum::routing::get;
use axum::{Router, middleware};
use axum_embed::ServeEmbed;
use rust_embed::Embed;
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub apidoc: Arc<Apidoc>,
    pub metrics: Arc<Metrics>,
}

#[derive(Embed, Clone)]
#[folder = "static/"]
struct StaticAssets;

/// The application router: documentation pages, static assets, health and
/// metrics.
pub fn router(apidoc: Arc<Apidoc>) -> Result<Router> {
    let base = apidoc.base_url().trim_end_matches('/').to_string();
    let metrics = Arc::new(Metrics::new()?);
    let state = AppState {
        apidoc,
        metrics: metrics.clone(),
    };

    let cors_layer = CorsLayer::new().allow_origin(tower_http::cors::AllowOrigin::predicate(
        |origin: &HeaderValue, _| {
            origin
                .to_str()
                .ok()
                .and_then(|origin| origin.parse::<http::Uri>().ok())
                .is_some_and(|uri| uri.host() == Some("localhost"))
        },
    ));

    let root_url = format!("{base}/");
    let mut router = Router::new()
        .route(&root_url, get(root_handler))
        .route(&format!("{base}/{{*path}}"), get(page_handler));
    if !base.is_empty() {
        router = router.route(
            &base,
            get(move || {
                let target = root_url.clone();
                async move { Redirect::permanent(&target) }
            }),
        );
    }
    let router = router
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest_service(STATIC_PREFIX, ServeEmbed::<StaticAssets>::new())
        .route_layer(middleware::from_fn_with_state(metrics, request_metrics_middleware))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(cors_layer));
    Ok(router)
}

pub async fn run(apidoc: Arc<Apidoc>, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let base = apidoc.base_url().trim_end_matches('/').to_string();
    let app = router(apidoc)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {addr}, documentation at http://{addr}{base}/");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install the SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

// 'a' -> 0x61, 'd' -> 0x64 => 0x6164 => 24932
pub const PREFERRED_PORT: u16 = 24932;

/// The preferred port when it is free, else any unused port.
pub fn find_unused_port() -> Result<u16> {
    match TcpListener::bind(("127.0.0.1", PREFERRED_PORT)) {
        Ok(listener) => Ok(listener.local_addr()?.port()),
        Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
            info!("Preferred port {PREFERRED_PORT} is busy, finding a random unused port");
            let listener = TcpListener::bind("127.0.0.1:0")?;
            Ok(listener.local_addr()?.port())
        }
        Err(e) => {
            error!("Error finding unused port: {e}");
            Err(e.into())
        }
    }
}
