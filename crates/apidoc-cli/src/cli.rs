use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "apidoc",
    version,
    about = "Introspective API documentation browser",
    long_about = "Browses the modules, classes, interfaces, utilities and configuration \
                  directives of a component-based application."
)]
pub struct ApidocCli {
    /// Path to the apidoc.toml configuration file
    #[arg(short, long, global = true, default_value = apidoc::CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl ApidocCli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the documentation over HTTP
    Serve {
        /// Port to bind (default: a preferred port, else any free one)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Export the documentation as a static site
    Export(ExportArgs),
    /// List the entries of a documentation container
    List {
        /// Path below the documentation root, e.g. `Code/myapp`
        #[arg(default_value = "")]
        path: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Render pages in process
    Publisher,
    /// Fetch pages from a running server
    Webserver,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Directory the site is written to
    pub target_dir: PathBuf,

    /// Where pages are fetched from
    #[arg(long, value_enum, default_value_t = BackendKind::Publisher)]
    pub backend: BackendKind,

    /// Base URL of the server for the webserver backend
    #[arg(long, default_value = "http://localhost:8080")]
    pub url: String,

    /// Page the crawl starts from (default: the documentation root)
    #[arg(long)]
    pub start_page: Option<String>,

    /// User name for basic authentication
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password for basic authentication
    #[arg(short, long)]
    pub password: Option<String>,

    /// Additional URL to export; may be repeated
    #[arg(long = "add", value_name = "URL")]
    pub extra_urls: Vec<String>,

    /// Documentation module left out of the export; may be repeated
    #[arg(long = "ignore-module", value_name = "MODULE")]
    pub ignore_modules: Vec<String>,

    /// Let the code browser import modules outside the configured roots
    #[arg(long)]
    pub import_unknown_modules: bool,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub max_runtime: Option<u64>,
}
