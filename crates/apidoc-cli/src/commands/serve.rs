use anyhow::Result;
use apidoc::ApidocConfig;
use std::sync::Arc;
use tracing::warn;

pub async fn run(config: &ApidocConfig, port: Option<u16>) -> Result<()> {
    if !config.devmode {
        warn!("devmode is off: documentation pages will answer 404");
    }
    let apidoc = Arc::new(config.build()?);
    let port = match port {
        Some(port) => port,
        None => http_server::find_unused_port()?,
    };
    http_server::run(apidoc, port).await
}
