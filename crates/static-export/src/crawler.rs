//! The crawler: fetches every page reachable from the start page and
//! writes it below the target directory.

use crate::backend::Backend;
use crate::errors::ExportError;
use crate::links::{ResourceKind, extract_links, output_path, resolve_link, rewrite_links};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub target_dir: PathBuf,
    /// First page fetched, e.g. `/++apidoc++/`.
    pub start_page: String,
    /// More pages to start from, for pages no link leads to.
    pub extra_urls: Vec<String>,
    /// Prefix of the documentation pages; links below it are followed.
    pub doc_root: String,
    /// Prefix of the static assets; links below it are copied as files.
    pub static_root: String,
    /// Stop fetching new pages once exceeded.
    pub max_runtime: Option<Duration>,
}

impl ExportOptions {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            start_page: "/++apidoc++/".to_string(),
            extra_urls: Vec::new(),
            doc_root: "/++apidoc++".to_string(),
            static_root: "/@@/".to_string(),
            max_runtime: None,
        }
    }

    /// How a link below one of the roots is exported; `None` for links
    /// the crawler does not follow.
    pub fn classify(&self, url: &str) -> Option<ResourceKind> {
        let doc_root = self.doc_root.trim_end_matches('/');
        if url.starts_with(&self.static_root) {
            Some(ResourceKind::File)
        } else if url == doc_root || url.starts_with(&format!("{doc_root}/")) {
            Some(ResourceKind::Page)
        } else {
            None
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub pages: usize,
    pub files: usize,
    pub errors: usize,
    /// URLs that could not be exported, with the reason.
    pub failures: Vec<(String, String)>,
    /// Whether the run stopped at the maximum runtime.
    pub timed_out: bool,
}

pub struct Crawler<B: Backend> {
    backend: B,
    options: ExportOptions,
}

impl<B: Backend> Crawler<B> {
    pub fn new(backend: B, options: ExportOptions) -> Self {
        Self { backend, options }
    }

    pub async fn run(&self) -> ExportReport {
        let started = Instant::now();
        let mut report = ExportReport::default();
        let mut queue = VecDeque::new();
        let mut seen = HashSet::new();

        for url in std::iter::once(&self.options.start_page).chain(&self.options.extra_urls) {
            let Some(url) = resolve_link("/", url) else {
                report.fail(url, ExportError::InvalidUrl(url.clone()));
                continue;
            };
            if seen.insert(page_key(&url)) {
                queue.push_back(url);
            }
        }

        info!("Exporting documentation to {}", self.options.target_dir.display());
        while let Some(url) = queue.pop_front() {
            if let Some(max_runtime) = self.options.max_runtime {
                if started.elapsed() >= max_runtime {
                    warn!("Maximum runtime exceeded, {} URLs left unexported", queue.len() + 1);
                    report.timed_out = true;
                    break;
                }
            }
            let kind = self.options.classify(&url).unwrap_or(ResourceKind::Page);
            match self.export(&url, kind).await {
                Ok(links) => {
                    match kind {
                        ResourceKind::Page => report.pages += 1,
                        ResourceKind::File => report.files += 1,
                    }
                    for link in links {
                        if seen.insert(page_key(&link)) {
                            queue.push_back(link);
                        }
                    }
                }
                Err(e) => report.fail(&url, e),
            }
        }

        info!(
            "Exported {} pages and {} files with {} errors in {:.1}s",
            report.pages,
            report.files,
            report.errors,
            started.elapsed().as_secs_f64()
        );
        report
    }

    /// Fetch and write one resource; returns the links it leads to.
    async fn export(&self, url: &str, kind: ResourceKind) -> Result<Vec<String>, ExportError> {
        let path = output_path(url, kind)
            .map(|relative| self.options.target_dir.join(relative))
            .filter(|path| path.starts_with(&self.options.target_dir))
            .ok_or_else(|| ExportError::OutsideTarget(url.to_string()))?;

        let fetched = self.backend.fetch(url).await?;
        if fetched.status != 200 {
            return Err(ExportError::Status {
                url: url.to_string(),
                status: fetched.status,
            });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if kind == ResourceKind::File || !fetched.is_html() {
            fs::write(&path, &fetched.body).await?;
            debug!("Wrote {}", path.display());
            return Ok(Vec::new());
        }

        let html = String::from_utf8_lossy(&fetched.body);
        let links = extract_links(&html)
            .iter()
            .filter_map(|link| resolve_link(url, link))
            .filter(|link| self.options.classify(link).is_some())
            .collect();
        let html = rewrite_links(&html, url, |link| self.options.classify(link));
        fs::write(&path, html).await?;
        debug!("Wrote {}", path.display());
        Ok(links)
    }
}

impl ExportReport {
    fn fail(&mut self, url: &str, error: ExportError) {
        warn!("Failed to export {url}: {error}");
        self.errors += 1;
        self.failures.push((url.to_string(), error.to_string()));
    }
}

/// Pages are the same with or without a trailing slash.
fn page_key(url: &str) -> String {
    match url.trim_end_matches('/') {
        "" => "/".to_string(),
        trimmed => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Fetched;
    use crate::errors::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FakeBackend {
        pages: HashMap<&'static str, (&'static str, &'static str)>,
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn fetch(&self, path: &str) -> Result<Fetched> {
            Ok(match self.pages.get(path) {
                Some((content_type, body)) => Fetched {
                    status: 200,
                    content_type: Some(content_type.to_string()),
                    body: body.as_bytes().to_vec(),
                },
                None => Fetched {
                    status: 404,
                    content_type: None,
                    body: Vec::new(),
                },
            })
        }
    }

    fn backend() -> FakeBackend {
        let pages = HashMap::from([
            (
                "/++apidoc++/",
                (
                    "text/html; charset=utf-8",
                    r#"<link href="/@@/apidoc.static/apidoc.css"><a href="/++apidoc++/Code">Code</a> <a href="/++apidoc++/Gone">Gone</a> <a href="http://example.com/">out</a>"#,
                ),
            ),
            (
                "/++apidoc++/Code",
                ("text/html", r#"<a href="/++apidoc++/">up</a> <a href="Code/pkg">pkg</a>"#),
            ),
            ("/++apidoc++/Code/pkg", ("text/html", r#"<a href="../Code">back</a>"#)),
            ("/@@/apidoc.static/apidoc.css", ("text/css", "body {}")),
            ("/++apidoc++/Hidden", ("text/html", "hidden")),
        ]);
        FakeBackend { pages }
    }

    #[tokio::test]
    async fn test_crawl_writes_reachable_pages() {
        let dir = tempfile::tempdir().unwrap();
        let crawler = Crawler::new(backend(), ExportOptions::new(dir.path()));

        let report = crawler.run().await;

        assert_eq!(report.pages, 3);
        assert_eq!(report.files, 1);
        assert_eq!(report.errors, 1);
        assert_eq!(report.failures[0].0, "/++apidoc++/Gone");
        assert!(!report.timed_out);

        let root = std::fs::read_to_string(dir.path().join("++apidoc++/index.html")).unwrap();
        assert!(root.contains(r#"href="../@@/apidoc.static/apidoc.css""#));
        assert!(root.contains(r#"href="Code/index.html""#));
        assert!(root.contains(r#"href="http://example.com/""#));

        let pkg = std::fs::read_to_string(dir.path().join("++apidoc++/Code/pkg/index.html")).unwrap();
        assert_eq!(pkg, r#"<a href="../index.html">back</a>"#);
        assert!(dir.path().join("@@/apidoc.static/apidoc.css").is_file());
        assert!(!dir.path().join("++apidoc++/Hidden").exists());
    }

    #[tokio::test]
    async fn test_extra_urls_are_exported() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = ExportOptions::new(dir.path());
        options.extra_urls = vec!["/++apidoc++/Hidden".to_string()];

        let report = Crawler::new(backend(), options).run().await;

        assert_eq!(report.pages, 4);
        assert!(dir.path().join("++apidoc++/Hidden/index.html").is_file());
    }

    #[tokio::test]
    async fn test_max_runtime_stops_the_crawl() {
        let dir = tempfile::tempdir().unwrap();
        let mut options = ExportOptions::new(dir.path());
        options.max_runtime = Some(Duration::ZERO);

        let report = Crawler::new(backend(), options).run().await;

        assert!(report.timed_out);
        assert_eq!(report.pages, 0);
    }

    #[tokio::test]
    async fn test_encoded_traversal_is_an_export_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        let mut pages = backend().pages;
        pages.insert(
            "/++apidoc++/",
            ("text/html", r#"<a href="/++apidoc++/%2e%2e/%2e%2e/escaped">up</a> <a href="/++apidoc++/%2Fabs">abs</a>"#),
        );
        pages.insert("/++apidoc++/%2e%2e/%2e%2e/escaped", ("text/html", "escaped"));
        pages.insert("/++apidoc++/%2Fabs", ("text/html", "absolute"));

        let report = Crawler::new(FakeBackend { pages }, ExportOptions::new(&target)).run().await;

        assert_eq!(report.pages, 1);
        assert_eq!(report.errors, 2);
        assert!(report.failures.iter().all(|(_, error)| error.contains("outside the target directory")));
        assert!(!dir.path().join("escaped").exists());
        assert!(!target.join("escaped").exists());
    }

    #[test]
    fn test_classify() {
        let options = ExportOptions::new("/tmp/out");
        assert_eq!(options.classify("/++apidoc++"), Some(ResourceKind::Page));
        assert_eq!(options.classify("/++apidoc++/Code/pkg"), Some(ResourceKind::Page));
        assert_eq!(options.classify("/@@/apidoc.static/apidoc.js"), Some(ResourceKind::File));
        assert_eq!(options.classify("/++apidoc++x"), None);
        assert_eq!(options.classify("/other"), None);
    }
}
