//! Docstring rendering.
//!
//! The real structured-text renderers are provided by the embedding
//! application through [`TextRenderer`]. [`BasicRenderer`] understands the
//! handful of constructs docstrings use most: paragraphs, literal blocks,
//! doctests, bullet lists, section titles and inline literals.

use quick_xml::escape::escape;
use std::path::Path;
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
pub enum DocFormat {
    #[strum(serialize = "plaintext", serialize = "plain", serialize = "zope.source.plaintext")]
    Plain,
    #[strum(serialize = "structuredtext", serialize = "zope.source.stx")]
    Structured,
    #[default]
    #[strum(serialize = "restructuredtext", serialize = "zope.source.rest")]
    Restructured,
}

impl DocFormat {
    /// Format named by a module's `__docformat__`, e.g. `restructuredtext en`.
    pub fn from_docformat(docformat: Option<&str>) -> Self {
        docformat
            .and_then(|value| value.split_whitespace().next())
            .and_then(|name| name.to_lowercase().parse().ok())
            .unwrap_or_default()
    }

    /// Format of a documentation text file, by extension.
    pub fn for_file(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("txt") => DocFormat::Structured,
            _ => DocFormat::Restructured,
        }
    }
}

#[derive(Error, Debug)]
#[error("Cannot render text: {0}")]
pub struct RenderError(pub String);

pub trait TextRenderer: Send + Sync {
    fn render(&self, text: &str, format: DocFormat) -> Result<String, RenderError>;
}

/// Render a docstring to HTML.
///
/// The text is dedented first. Renderer failures produce a placeholder
/// block instead of an error.
pub fn render_text(renderer: &dyn TextRenderer, text: &str, format: DocFormat) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let text = dedent_string(text);
    match renderer.render(&text, format) {
        Ok(html) => html,
        Err(e) => {
            debug!("{e}");
            format!(
                "<p><i>Failed to render non-text ({})</i></p>",
                escape(format!("{text:?}").as_str())
            )
        }
    }
}

/// Remove the indentation docstrings carry after their first line.
pub fn dedent_string(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default().trim_start();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut result = vec![first.to_string()];
    for line in rest {
        result.push(line.get(indent..).unwrap_or(line.trim_start()).to_string());
    }
    while result.first().is_some_and(|line| line.trim().is_empty()) {
        result.remove(0);
    }
    result.join("\n").trim_end().to_string()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BasicRenderer;

impl TextRenderer for BasicRenderer {
    fn render(&self, text: &str, format: DocFormat) -> Result<String, RenderError> {
        if text.contains('\0') {
            return Err(RenderError("binary content".to_string()));
        }
        Ok(match format {
            DocFormat::Plain => format!("<pre>{}</pre>", escape(text)),
            DocFormat::Structured | DocFormat::Restructured => render_blocks(text, format),
        })
    }
}

fn render_blocks(text: &str, format: DocFormat) -> String {
    let mut html = Vec::new();
    let mut literal_next = false;
    for block in blocks(text) {
        let first = block.first().map(|line| line.trim_start()).unwrap_or_default();
        if literal_next && block.iter().all(|line| line.starts_with(' ')) {
            html.push(format!("<pre>{}</pre>", escape(dedent_block(&block).as_str())));
            continue;
        }
        literal_next = false;

        if first.starts_with(">>> ") {
            html.push(format!("<pre>{}</pre>", escape(dedent_block(&block).as_str())));
        } else if let Some(title) = section_title(&block, format) {
            html.push(format!("<h3>{}</h3>", inline(title)));
        } else if block.iter().all(|line| is_bullet(line.trim_start())) {
            let items: Vec<String> = block
                .iter()
                .map(|line| format!("<li>{}</li>", inline(&line.trim_start()[2..])))
                .collect();
            html.push(format!("<ul>\n{}\n</ul>", items.join("\n")));
        } else {
            let mut paragraph = block
                .iter()
                .map(|line| line.trim())
                .collect::<Vec<_>>()
                .join(" ");
            if let Some(stripped) = paragraph.strip_suffix("::") {
                literal_next = true;
                paragraph = if stripped.ends_with(' ') || stripped.is_empty() {
                    stripped.trim_end().to_string()
                } else {
                    format!("{stripped}:")
                };
                if paragraph.is_empty() {
                    continue;
                }
            }
            html.push(format!("<p>{}</p>", inline(&paragraph)));
        }
    }
    html.join("\n")
}

fn blocks(text: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

fn dedent_block(block: &[&str]) -> String {
    let indent = block
        .iter()
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    block
        .iter()
        .map(|line| line.get(indent..).unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn section_title<'a>(block: &[&'a str], format: DocFormat) -> Option<&'a str> {
    if format != DocFormat::Restructured || block.len() != 2 {
        return None;
    }
    let (title, underline) = (block[0].trim(), block[1].trim());
    let mut chars = underline.chars();
    let marker = chars.next()?;
    let is_underline = matches!(marker, '=' | '-' | '~' | '^' | '*')
        && chars.all(|c| c == marker)
        && underline.chars().count() >= title.chars().count();
    is_underline.then_some(title)
}

fn is_bullet(line: &str) -> bool {
    line.starts_with("* ") || line.starts_with("- ")
}

/// Escape a line and turn ``literal`` spans into code elements.
fn inline(text: &str) -> String {
    let mut html = String::new();
    for (index, part) in text.split("``").enumerate() {
        if index % 2 == 1 {
            html.push_str(&format!("<code>{}</code>", escape(part)));
        } else {
            html.push_str(&escape(part));
        }
    }
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingRenderer;

    impl TextRenderer for FailingRenderer {
        fn render(&self, _text: &str, _format: DocFormat) -> Result<String, RenderError> {
            Err(RenderError("unsupported".to_string()))
        }
    }

    #[test]
    fn test_docformat_selection() {
        assert_eq!(DocFormat::from_docformat(None), DocFormat::Restructured);
        assert_eq!(DocFormat::from_docformat(Some("restructuredtext en")), DocFormat::Restructured);
        assert_eq!(DocFormat::from_docformat(Some("plaintext")), DocFormat::Plain);
        assert_eq!(DocFormat::from_docformat(Some("StructuredText")), DocFormat::Structured);
        assert_eq!(DocFormat::from_docformat(Some("epytext")), DocFormat::Restructured);
        assert_eq!(DocFormat::for_file(Path::new("README.txt")), DocFormat::Structured);
        assert_eq!(DocFormat::for_file(Path::new("README.rst")), DocFormat::Restructured);
    }

    #[test]
    fn test_dedent_string() {
        let text = "Summary line.\n\n    Details,\n      indented.\n    ";
        assert_eq!(dedent_string(text), "Summary line.\n\nDetails,\n  indented.");
        assert_eq!(dedent_string("  single"), "single");
    }

    #[test]
    fn test_render_paragraphs_and_literals() {
        let html = render_text(
            &BasicRenderer,
            "Do the thing.\n\n    Example::\n\n      x = 1 < 2\n\n    Done with ``x``.",
            DocFormat::Restructured,
        );
        assert_eq!(
            html,
            "<p>Do the thing.</p>\n<p>Example:</p>\n<pre>x = 1 &lt; 2</pre>\n<p>Done with <code>x</code>.</p>"
        );
    }

    #[test]
    fn test_render_titles_lists_and_plain() {
        let html = render_text(
            &BasicRenderer,
            "Usage\n=====\n\n* one\n* two",
            DocFormat::Restructured,
        );
        assert_eq!(html, "<h3>Usage</h3>\n<ul>\n<li>one</li>\n<li>two</li>\n</ul>");
        assert_eq!(render_text(&BasicRenderer, "a < b", DocFormat::Plain), "<pre>a &lt; b</pre>");
        assert_eq!(render_text(&BasicRenderer, "   ", DocFormat::Plain), "");
    }

    #[test]
    fn test_render_failure_yields_placeholder() {
        let html = render_text(&FailingRenderer, "text", DocFormat::Structured);
        assert_eq!(html, "<p><i>Failed to render non-text (&quot;text&quot;)</i></p>");
    }
}
