use super::{Directive, QualifiedName, ZCML_NS, ZcmlChild};
use crate::errors::ParseError;
use object_model::context::absolute_name;
use object_model::{ConfigurationContext, ParserInfo};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Parse a configuration file into its root directive.
pub fn parse_file(
    path: &Path,
    context: &ConfigurationContext,
    package: Option<&str>,
) -> Result<Directive, ParseError> {
    let source = std::fs::read_to_string(path).map_err(|e| ParseError {
        file: path.display().to_string(),
        line: 0,
        column: 0,
        message: e.to_string(),
    })?;
    parse(&source, path, context, package)
}

/// Parse configuration source.
///
/// `package` is the package the file belongs to; a `configure` directive
/// with a `package` attribute overrides it for its sub-tree.
pub fn parse(
    source: &str,
    file: &Path,
    context: &ConfigurationContext,
    package: Option<&str>,
) -> Result<Directive, ParseError> {
    Parser::new(source, file, context, package).run()
}

/// Bindings of prefixes to namespace URIs; the default namespace uses the
/// empty prefix.
type Scope = BTreeMap<String, String>;

struct Parser<'a> {
    source: &'a str,
    file: &'a Path,
    context: &'a ConfigurationContext,
    package: Option<String>,
    line_starts: Vec<usize>,
    stack: Vec<(Directive, Scope)>,
    root: Option<Directive>,
    /// Depth inside an element whose condition does not hold.
    skipped: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, file: &'a Path, context: &'a ConfigurationContext, package: Option<&str>) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(index, _)| index + 1))
            .collect();
        Self {
            source,
            file,
            context,
            package: package.map(str::to_string),
            line_starts,
            stack: Vec::new(),
            root: None,
            skipped: 0,
        }
    }

    fn run(mut self) -> Result<Directive, ParseError> {
        let mut reader = Reader::from_str(self.source);
        reader.config_mut().trim_text(false);

        loop {
            let position = self.tag_start(reader.buffer_position() as usize);
            let event = reader
                .read_event()
                .map_err(|e| self.error(reader.buffer_position() as usize, e.to_string()))?;
            match event {
                Event::Start(start) => self.start(&start, position, false)?,
                Event::Empty(start) => self.start(&start, position, true)?,
                Event::End(_) => self.end(position)?,
                Event::Comment(text) => {
                    if self.skipped == 0 {
                        if let Some((parent, _)) = self.stack.last_mut() {
                            let comment = String::from_utf8_lossy(&text).trim().to_string();
                            parent.children.push(ZcmlChild::Comment(comment));
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !self.stack.is_empty() {
            return Err(self.error(self.source.len(), "unexpected end of file".to_string()));
        }
        self.root
            .take()
            .ok_or_else(|| self.error(0, "no root element".to_string()))
    }

    fn start(&mut self, start: &BytesStart<'_>, position: usize, empty: bool) -> Result<(), ParseError> {
        if self.skipped > 0 {
            if !empty {
                self.skipped += 1;
            }
            return Ok(());
        }

        let tag = self.utf8(start.name().as_ref(), position)?.to_string();
        let mut scope = self.stack.last().map(|(_, scope)| scope.clone()).unwrap_or_default();
        let mut bindings = Vec::new();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| self.error(position, e.to_string()))?;
            let key = self.utf8(attr.key.as_ref(), position)?.to_string();
            let raw = self.utf8(attr.value.as_ref(), position)?;
            let value = unescape(raw)
                .map_err(|e| self.error(position, e.to_string()))?
                .into_owned();
            if key == "xmlns" {
                bindings.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                bindings.push((prefix.to_string(), value));
            } else {
                attrs.push((key, value));
            }
        }
        for (prefix, uri) in &bindings {
            scope.insert(prefix.clone(), uri.clone());
        }

        let name = self.qualify(&tag, &scope, position)?;
        let condition = attrs.iter().find_map(|(key, value)| {
            let (prefix, local) = key.split_once(':')?;
            (local == "condition" && scope.get(prefix).map(String::as_str) == Some(ZCML_NS)).then_some(value)
        });
        if let Some(condition) = condition {
            if !self.condition_holds(condition) {
                debug!("Skipping <{tag}> in {}: condition `{condition}` does not hold", self.file.display());
                if !empty {
                    self.skipped = 1;
                }
                return Ok(());
            }
        }

        let parent = self.stack.last().map(|(directive, _)| directive);
        let entry = parent
            .and_then(|parent| {
                self.context.lookup_subdirective(
                    &parent.name.namespace,
                    &parent.name.name,
                    &name.namespace,
                    &name.name,
                )
            })
            .or_else(|| self.context.lookup_directive(&name.namespace, &name.name))
            .cloned();
        if entry.is_none() {
            debug!("No directive registered for {{{}}}{}", name.namespace, name.name);
        }

        let mut prefixes = parent.map(|parent| parent.prefixes.clone()).unwrap_or_default();
        for (prefix, uri) in bindings {
            prefixes.insert(uri, prefix);
        }

        let inherited = parent
            .and_then(|parent| parent.package.clone())
            .or_else(|| self.package.clone());
        let package = match attrs.iter().find(|(key, _)| key == "package") {
            Some((_, value)) if name.name == "configure" => {
                absolute_name(inherited.as_deref(), value.trim()).or(inherited)
            }
            _ => inherited,
        };

        let (line, column) = self.location(position);
        let directive = Directive {
            name,
            prefixes,
            entry,
            attrs,
            children: Vec::new(),
            info: ParserInfo {
                file: self.file.to_path_buf(),
                line,
                column,
                eline: line,
                ecolumn: column,
            },
            package,
        };

        if empty {
            self.attach(directive, position)
        } else {
            self.stack.push((directive, scope));
            Ok(())
        }
    }

    fn end(&mut self, position: usize) -> Result<(), ParseError> {
        if self.skipped > 0 {
            self.skipped -= 1;
            return Ok(());
        }
        let Some((mut directive, _)) = self.stack.pop() else {
            return Err(self.error(position, "unexpected end tag".to_string()));
        };
        let (eline, ecolumn) = self.location(position);
        directive.info.eline = eline;
        directive.info.ecolumn = ecolumn;
        self.attach(directive, position)
    }

    fn attach(&mut self, directive: Directive, position: usize) -> Result<(), ParseError> {
        match self.stack.last_mut() {
            Some((parent, _)) => {
                parent.children.push(ZcmlChild::Directive(directive));
                Ok(())
            }
            None if self.root.is_none() => {
                self.root = Some(directive);
                Ok(())
            }
            None => Err(self.error(position, "more than one root element".to_string())),
        }
    }

    fn qualify(&self, tag: &str, scope: &Scope, position: usize) -> Result<QualifiedName, ParseError> {
        let (prefix, name) = tag.split_once(':').unwrap_or(("", tag));
        let namespace = match scope.get(prefix) {
            Some(uri) => uri.clone(),
            None if prefix.is_empty() => String::new(),
            None => return Err(self.error(position, format!("unbound prefix `{prefix}`"))),
        };
        Ok(QualifiedName {
            namespace,
            name: name.to_string(),
        })
    }

    /// Only package installation is checked; other conditions hold so that
    /// every directive is documented.
    fn condition_holds(&self, condition: &str) -> bool {
        let mut words = condition.split_whitespace();
        match (words.next(), words.next()) {
            (Some("installed"), Some(package)) => self.context.installed(package),
            (Some("not-installed"), Some(package)) => !self.context.installed(package),
            _ => true,
        }
    }

    /// Offset of the `<` opening the markup read next. The reader has
    /// already consumed it when a text event came before.
    fn tag_start(&self, position: usize) -> usize {
        let end = (position + 1).min(self.source.len());
        self.source.as_bytes()[..end]
            .iter()
            .rposition(|byte| *byte == b'<')
            .unwrap_or(position)
    }

    /// 1-based line and 0-based column of a byte offset.
    fn location(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        (line + 1, offset - self.line_starts[line])
    }

    fn utf8<'b>(&self, bytes: &'b [u8], position: usize) -> Result<&'b str, ParseError> {
        std::str::from_utf8(bytes).map_err(|e| self.error(position, e.to_string()))
    }

    fn error(&self, offset: usize, message: String) -> ParseError {
        let (line, column) = self.location(offset.min(self.source.len()));
        ParseError {
            file: self.file.display().to_string(),
            line,
            column,
            message,
        }
    }
}
