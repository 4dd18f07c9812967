mod cli;
mod commands;

use crate::cli::{ApidocCli, Commands};
use anyhow::{Context, Result};
use apidoc::ApidocConfig;
use logging::LogMode;
use std::path::Path;
use tracing::{error, warn};

fn load_config(path: &Path) -> Result<ApidocConfig> {
    ApidocConfig::load(path).with_context(|| format!("Could not load {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ApidocCli::parse_args();
    let mode = match cli.command {
        Commands::Serve { .. } => LogMode::Server,
        _ => LogMode::Cli,
    };
    let _guards = logging::init(mode, cli.verbose)?;

    match cli.command {
        Commands::Serve { port } => commands::serve::run(&load_config(&cli.config)?, port).await,
        Commands::List { path } => {
            let config = load_config(&cli.config)?;
            commands::list::run(&config, &path, &mut std::io::stdout().lock())
        }
        Commands::Export(args) => {
            // Failures are reported, never turned into an exit status.
            let config = if cli.config.is_file() {
                match load_config(&cli.config) {
                    Ok(config) => config,
                    Err(e) => {
                        error!("{e:#}");
                        return Ok(());
                    }
                }
            } else {
                warn!("{} not found, using the default configuration", cli.config.display());
                ApidocConfig::default()
            };
            match commands::export::run(config, args).await {
                Ok(report) => {
                    println!(
                        "Exported {} pages and {} files, {} errors",
                        report.pages, report.files, report.errors
                    );
                    for (url, reason) in &report.failures {
                        println!("  {url}: {reason}");
                    }
                    if report.timed_out {
                        println!("Stopped at the maximum runtime");
                    }
                }
                Err(e) => error!("Export failed: {e:#}"),
            }
            Ok(())
        }
    }
}
