use crate::cli::{BackendKind, ExportArgs};
use anyhow::Result;
use apidoc::ApidocConfig;
use static_export::{Crawler, ExportOptions, ExportReport, PublisherBackend, WebserverBackend};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Options of the crawl, from the command line and the configuration.
pub fn export_options(config: &ApidocConfig, args: &ExportArgs) -> ExportOptions {
    let doc_root = config.base_url.trim_end_matches('/').to_string();
    let mut options = ExportOptions::new(&args.target_dir);
    options.start_page = args.start_page.clone().unwrap_or_else(|| format!("{doc_root}/"));
    options.doc_root = doc_root;
    options.extra_urls = args.extra_urls.clone();
    options.max_runtime = args.max_runtime.map(Duration::from_secs);
    options
}

pub async fn run(mut config: ApidocConfig, args: ExportArgs) -> Result<ExportReport> {
    let options = export_options(&config, &args);
    let report = match args.backend {
        BackendKind::Publisher => {
            // Exporting is an explicit request for the pages.
            config.devmode = true;
            config.modules.retain(|module| !args.ignore_modules.contains(module));
            config.import_unknown_modules |= args.import_unknown_modules;
            let apidoc = Arc::new(config.build()?);
            let backend = PublisherBackend::new(http_server::router(apidoc)?);
            Crawler::new(backend, options).run().await
        }
        BackendKind::Webserver => {
            info!("Fetching pages from {}", args.url);
            let mut backend = WebserverBackend::new(args.url);
            if let Some(username) = args.username {
                backend = backend.with_credentials(username, args.password);
            }
            Crawler::new(backend, options).run().await
        }
    };
    Ok(report)
}
