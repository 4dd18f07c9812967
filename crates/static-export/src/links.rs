//! Link extraction and rewriting for exported pages.
//!
//! Every page is written to `index.html` in a directory named after its
//! URL; any other resource keeps its URL as file name. Links between
//! exported resources are rewritten to relative ones, so the export can
//! be browsed from disk.

use regex::{Captures, Regex};
use std::path::PathBuf;
use std::sync::LazyLock;

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(href|src)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("link pattern is valid")
});

/// The targets of all `href` and `src` attributes, in document order.
pub fn extract_links(html: &str) -> Vec<String> {
    LINK.captures_iter(html)
        .filter_map(|caps| caps.get(2).or_else(|| caps.get(3)))
        .map(|target| target.as_str().to_string())
        .collect()
}

/// Split off the query and fragment of a link.
pub fn split_link(link: &str) -> (&str, &str) {
    match link.find(['?', '#']) {
        Some(index) => (&link[..index], &link[index..]),
        None => (link, ""),
    }
}

/// Resolve a link found on the page at `page_url` to an absolute path
/// without query or fragment. External links resolve to `None`.
pub fn resolve_link(page_url: &str, link: &str) -> Option<String> {
    let (path, _) = split_link(link);
    if path.is_empty() || link.contains("://") || link.starts_with("//") || path.contains(':') {
        return None;
    }
    if path.starts_with('/') {
        return Some(normalize(path));
    }
    let base = match page_url.rfind('/') {
        Some(index) => &page_url[..=index],
        None => "/",
    };
    Some(normalize(&format!("{base}{path}")))
}

/// Collapse `.` and `..` segments and duplicate slashes, keeping a
/// trailing slash.
fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    let mut normalized = format!("/{}", segments.join("/"));
    if path.ends_with('/') && normalized.len() > 1 {
        normalized.push('/');
    }
    normalized
}

/// Whether a resource is a documentation page, exported as a directory,
/// rather than a plain file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Page,
    File,
}

fn segments(url: &str) -> Vec<&str> {
    url.split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect()
}

/// File an exported resource is written to, relative to the target
/// directory. `None` when a decoded segment could leave that directory.
pub fn output_path(url: &str, kind: ResourceKind) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for segment in segments(url) {
        let decoded = urlencoding::decode(segment).map_or_else(|_| segment.to_string(), |s| s.into_owned());
        if !is_plain_segment(&decoded) {
            return None;
        }
        path.push(decoded);
    }
    if kind == ResourceKind::Page {
        path.push("index.html");
    }
    Some(path)
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', ':', '\0'])
}

/// Link from the page at `from` to the resource at `to`, relative to the
/// directory the page is written to.
pub fn relative_link(from: &str, to: &str, kind: ResourceKind) -> String {
    let from = segments(from);
    let mut to = segments(to);
    if kind == ResourceKind::Page {
        to.push("index.html");
    }
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    let mut parts = vec![".."; from.len() - common];
    parts.extend_from_slice(&to[common..]);
    parts.join("/")
}

/// Rewrite the links of the page at `page_url` for which `classify`
/// returns a kind; other links are left alone.
pub fn rewrite_links(html: &str, page_url: &str, classify: impl Fn(&str) -> Option<ResourceKind>) -> String {
    LINK.replace_all(html, |caps: &Captures<'_>| {
        let Some(target) = caps.get(2).or_else(|| caps.get(3)) else {
            return caps[0].to_string();
        };
        let link = target.as_str();
        let rewritten = resolve_link(page_url, link).and_then(|absolute| {
            let kind = classify(&absolute)?;
            let (_, rest) = split_link(link);
            let fragment = rest.find('#').map_or("", |index| &rest[index..]);
            Some(format!("{}{fragment}", relative_link(page_url, &absolute, kind)))
        });
        match rewritten {
            Some(rewritten) => format!("{}=\"{rewritten}\"", &caps[1]),
            None => caps[0].to_string(),
        }
    })
    .into_owned()
}
