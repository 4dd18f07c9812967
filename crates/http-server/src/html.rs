//! HTML rendering of documentation pages.
//!
//! Details are rendered generically from their serialized form: objects
//! become definition lists, arrays become lists and `{path, url}` pairs
//! become links. Text fields holding rendered documentation are inserted
//! as they are; raw file sources are escaped into a `<pre>` block.

use apidoc::Page;
use quick_xml::escape::escape;
use serde_json::{Map, Value};
use std::fmt::Write;

/// Prefix under which the embedded assets are served.
pub const STATIC_PREFIX: &str = "/@@/apidoc.static";

/// Fields holding HTML produced by the documentation renderer.
const HTML_FIELDS: [&str; 3] = ["doc", "description", "content"];

/// Fields holding raw file text, shown verbatim.
const SOURCE_FIELDS: [&str; 1] = ["source"];

/// Fields only used to route the page, never shown.
const HIDDEN_FIELDS: [&str; 3] = ["type", "url_name", "iface_id"];

pub fn render_page(page: &Page) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{} - API Documentation</title>", escape(page.title.as_str()));
    let _ = writeln!(html, "<link rel=\"stylesheet\" href=\"{STATIC_PREFIX}/apidoc.css\">");
    html.push_str("</head>\n<body>\n");

    html.push_str("<nav class=\"breadcrumbs\">");
    let crumbs: Vec<String> = page
        .breadcrumbs
        .iter()
        .map(|crumb| link(&crumb.url, &crumb.name))
        .collect();
    html.push_str(&crumbs.join(" / "));
    html.push_str("</nav>\n");

    let _ = writeln!(
        html,
        "<h1>{} <span class=\"kind\">{}</span></h1>",
        escape(page.title.as_str()),
        page.kind
    );

    match serde_json::to_value(&page.details) {
        Ok(Value::Object(details)) => {
            let mut body = String::new();
            render_fields(&details, &mut body);
            if !body.is_empty() {
                let _ = writeln!(html, "<section class=\"details\">{body}</section>");
            }
        }
        Ok(_) => {}
        Err(e) => {
            let _ = writeln!(html, "<p><i>Failed to render details: {}</i></p>", escape(e.to_string().as_str()));
        }
    }

    if !page.children.is_empty() {
        html.push_str("<section>\n<h2>Contents</h2>\n<ul class=\"children\">\n");
        for child in &page.children {
            let _ = writeln!(
                html,
                "<li>{} <span class=\"kind\">{}</span></li>",
                link(&child.url, &child.name),
                child.kind
            );
        }
        html.push_str("</ul>\n</section>\n");
    }

    let _ = writeln!(html, "<script src=\"{STATIC_PREFIX}/apidoc.js\"></script>");
    html.push_str("</body>\n</html>\n");
    html
}

/// A minimal page for lookups that found nothing.
pub fn render_not_found(path: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Not Found</title></head>\n\
         <body><h1>Not Found</h1><p>Nothing is documented at <code>{}</code>.</p></body>\n</html>\n",
        escape(path)
    )
}

fn link(url: &str, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape(url), escape(text))
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.values().all(is_blank),
        _ => false,
    }
}

fn render_fields(fields: &Map<String, Value>, html: &mut String) {
    let shown: Vec<_> = fields
        .iter()
        .filter(|(key, value)| !HIDDEN_FIELDS.contains(&key.as_str()) && !is_blank(value))
        .collect();
    if shown.is_empty() {
        return;
    }
    html.push_str("<dl class=\"details\">");
    for (key, value) in shown {
        let _ = write!(html, "<dt>{}</dt><dd>", escape(key.replace('_', " ").as_str()));
        render_value(key, value, html);
        html.push_str("</dd>");
    }
    html.push_str("</dl>");
}

fn render_value(key: &str, value: &Value, html: &mut String) {
    match value {
        Value::Null => {}
        Value::String(text) if HTML_FIELDS.contains(&key) => html.push_str(text),
        Value::String(text) if SOURCE_FIELDS.contains(&key) => {
            let _ = write!(html, "<pre class=\"source\">{}</pre>", escape(text.as_str()));
        }
        Value::String(text) if key == "url" => html.push_str(&link(text, text)),
        Value::String(text) => html.push_str(&escape(text.as_str())),
        Value::Bool(flag) => html.push_str(if *flag { "yes" } else { "no" }),
        Value::Number(number) => html.push_str(&number.to_string()),
        Value::Array(items) => {
            html.push_str("<ul>");
            for item in items.iter().filter(|item| !is_blank(item)) {
                html.push_str("<li>");
                render_value(key, item, html);
                html.push_str("</li>");
            }
            html.push_str("</ul>");
        }
        Value::Object(fields) => match as_link(fields) {
            Some((text, Some(url))) => html.push_str(&link(url, text)),
            Some((text, None)) => {
                let _ = write!(html, "<code>{}</code>", escape(text));
            }
            None => render_fields(fields, html),
        },
    }
}

/// The text and target of a link record: a path, or a name, next to an
/// optional URL and nothing else.
fn as_link(fields: &Map<String, Value>) -> Option<(&str, Option<&str>)> {
    if fields.len() != 2 {
        return None;
    }
    let url = match fields.get("url")? {
        Value::String(url) => Some(url.as_str()),
        Value::Null => None,
        _ => return None,
    };
    let text = fields
        .get("path")
        .or_else(|| fields.get("name"))
        .or_else(|| fields.get("token"))?
        .as_str()?;
    Some((text, url))
}
