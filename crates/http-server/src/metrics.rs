use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Instant;

/// Request metrics of one server instance.
pub struct Metrics {
    registry: Registry,
    requests_total: IntCounter,
    request_duration_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let requests_total = IntCounter::new("apidoc_http_requests_total", "Total number of HTTP requests")?;
        let request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "apidoc_http_request_duration_seconds",
                "HTTP request latencies in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["method", "path"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;
        Ok(Self {
            registry,
            requests_total,
            request_duration_seconds,
        })
    }

    /// Metrics in the Prometheus text exposition format.
    pub fn encode(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

/// Count requests and time them by route.
///
/// Requests are labelled with the matched route rather than the raw path,
/// which would create a series per documentation page.
pub async fn request_metrics_middleware(State(metrics): State<Arc<Metrics>>, req: Request, next: Next) -> Response {
    metrics.requests_total.inc();

    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let start = Instant::now();
    let response = next.run(req).await;
    let duration = start.elapsed().as_secs_f64();

    metrics
        .request_duration_seconds
        .with_label_values(&[method.as_str(), path.as_str()])
        .observe(duration);
    response
}
