//! Builds a [`Module`] record from the logical lines of one source file.

use super::lexer::{
    LogicalLine, find_assignment, is_dotted_name, is_identifier, literal_repr, literal_type,
    logical_lines, matching_bracket, parse_strings, split_call, split_header, split_top_level,
    string_sequence,
};
use crate::class::{Class, ClassBuilder};
use crate::context::absolute_name;
use crate::function::{Function, Param};
use crate::importer::{Importer, resolve};
use crate::interface::{Interface, InterfaceBuilder};
use crate::module::Module;
use crate::object::{Instance, Object};
use crate::schema::{Field, FieldKind};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

fn last_segment(dotted: &str) -> &str {
    dotted.rsplit('.').next().unwrap_or(dotted)
}

/// The statements of a block, each with the lines of its nested body.
fn statements(lines: &[LogicalLine]) -> Vec<&[LogicalLine]> {
    let Some(first) = lines.first() else {
        return Vec::new();
    };
    let indent = first.indent;
    let mut result = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let mut end = i + 1;
        while end < lines.len() && lines[end].indent > indent.max(lines[i].indent) {
            end += 1;
        }
        result.push(&lines[i..end]);
        i = end;
    }
    result
}

/// Body of a compound statement, including an inline body after the colon.
fn body_lines(lines: &[LogicalLine]) -> Vec<LogicalLine> {
    let (_, inline) = split_header(&lines[0].text);
    let mut body = Vec::with_capacity(lines.len());
    if let Some(inline) = inline {
        body.push(LogicalLine {
            indent: lines[0].indent + 1,
            text: inline,
            line: lines[0].line,
        });
    }
    body.extend(lines[1..].iter().cloned());
    body
}

/// The docstring of a block: a leading statement made only of string literals.
fn block_doc(body: &[LogicalLine]) -> String {
    statements(body)
        .first()
        .filter(|stmt| stmt.len() == 1)
        .and_then(|stmt| parse_strings(&stmt[0].text))
        .unwrap_or_default()
}

fn parse_params(text: &str) -> Vec<Param> {
    let mut params = Vec::new();
    let mut keyword_only = false;
    for item in split_top_level(text, ',') {
        let item = item.trim();
        if item == "/" {
            continue;
        }
        if item == "*" {
            keyword_only = true;
            continue;
        }
        if let Some(name) = item.strip_prefix("**") {
            params.push(Param::KwArgs(strip_annotation(name)));
            continue;
        }
        if let Some(name) = item.strip_prefix('*') {
            params.push(Param::VarArgs(strip_annotation(name)));
            keyword_only = true;
            continue;
        }
        if item.starts_with('(') {
            if let Some(close) = matching_bracket(item, 0) {
                params.push(Param::Unpack(parse_params(&item[1..close])));
                continue;
            }
        }
        let (name, default) = match find_assignment(item) {
            Some(eq) => (
                strip_annotation(&item[..eq]),
                Some(literal_repr(&item[eq + 1..])),
            ),
            None => (strip_annotation(item), None),
        };
        params.push(if keyword_only {
            Param::KeywordOnly { name, default }
        } else {
            Param::Positional { name, default }
        });
    }
    params
}

fn strip_annotation(text: &str) -> String {
    text.split(':').next().unwrap_or(text).trim().to_string()
}

fn keyword_args(args: &str) -> Vec<(String, String)> {
    split_top_level(args, ',')
        .into_iter()
        .filter_map(|arg| {
            let eq = find_assignment(&arg)?;
            Some((arg[..eq].trim().to_string(), arg[eq + 1..].trim().to_string()))
        })
        .collect()
}

fn positional_args(args: &str) -> Vec<String> {
    split_top_level(args, ',')
        .into_iter()
        .filter(|arg| find_assignment(arg).is_none())
        .collect()
}

/// A class that is referenced but not documented.
fn external_class(expr: &str) -> Arc<Class> {
    match expr.rsplit_once('.') {
        Some((module, name)) => Class::builder(module, name).build(),
        None => Class::builder("builtins", expr).build(),
    }
}

pub(crate) struct ModuleScanner<'a> {
    importer: &'a dyn Importer,
    path: String,
    package: String,
    namespace: FxHashMap<String, Object>,
    members: Vec<(String, Object)>,
    doc: String,
    docformat: Option<String>,
    all: Option<Vec<String>>,
    provides: Vec<Arc<Interface>>,
    /// `directlyProvides(name, ...)` declarations, by target name.
    direct_provides: FxHashMap<String, Vec<String>>,
    /// `classImplements(name, ...)` declarations, by target name.
    class_implements: FxHashMap<String, Vec<String>>,
}

impl<'a> ModuleScanner<'a> {
    pub(crate) fn new(importer: &'a dyn Importer, path: &str, is_package: bool) -> Self {
        let package = if is_package {
            path.to_string()
        } else {
            path.rsplit_once('.')
                .map(|(parent, _)| parent.to_string())
                .unwrap_or_default()
        };
        Self {
            importer,
            path: path.to_string(),
            package,
            namespace: FxHashMap::default(),
            members: Vec::new(),
            doc: String::new(),
            docformat: None,
            all: None,
            provides: Vec::new(),
            direct_provides: FxHashMap::default(),
            class_implements: FxHashMap::default(),
        }
    }

    pub(crate) fn scan(mut self, source: &str, file: &Path) -> Arc<Module> {
        let lines = logical_lines(source);
        let top_level = statements(&lines);
        self.doc = block_doc(&lines);
        self.collect_declarations(&top_level);

        let mut decorators = Vec::new();
        for stmt in &top_level {
            let text = stmt[0].text.trim();
            if let Some(decorator) = text.strip_prefix('@') {
                decorators.push(decorator.trim().to_string());
                continue;
            }
            let keyword = text.split_whitespace().next().unwrap_or_default();
            match keyword {
                "class" => {
                    if let Some((name, object)) = self.scan_class(None, stmt, &decorators) {
                        self.bind(&name, object);
                    }
                }
                "def" | "async" => {
                    if let Some(function) = self.scan_function(None, stmt) {
                        let name = function.name().to_string();
                        self.bind(&name, Object::Function(Arc::new(function)));
                    }
                }
                "import" => self.import_statement(text),
                "from" => self.from_import(text),
                "if" | "elif" | "else" | "try" | "except" | "finally" | "for" | "while" | "with" => {}
                _ => self.statement(text),
            }
            decorators.clear();
        }

        let mut builder = Module::builder(self.path.clone()).file(file).doc(self.doc);
        if let Some(docformat) = self.docformat {
            builder = builder.docformat(docformat);
        }
        if let Some(all) = self.all {
            builder = builder.all(all);
        }
        for iface in self.provides {
            builder = builder.provides(iface);
        }
        for (name, value) in self.members {
            builder = builder.member(name, value);
        }
        builder.build()
    }

    fn bind(&mut self, name: &str, value: Object) {
        self.namespace.insert(name.to_string(), value.clone());
        match self.members.iter_mut().find(|(key, _)| key == name) {
            Some(slot) => slot.1 = value,
            None => self.members.push((name.to_string(), value)),
        }
    }

    fn collect_declarations(&mut self, top_level: &[&[LogicalLine]]) {
        for stmt in top_level {
            let Some((callee, args)) = split_call(&stmt[0].text) else {
                continue;
            };
            let target = match last_segment(&callee) {
                "directlyProvides" => &mut self.direct_provides,
                "classImplements" => &mut self.class_implements,
                _ => continue,
            };
            let mut args = positional_args(&args).into_iter();
            if let Some(name) = args.next() {
                target.entry(name).or_default().extend(args);
            }
        }
    }

    /// Resolve a dotted expression in the module namespace, falling back to
    /// an absolute import.
    fn lookup(&self, expr: &str) -> Option<Object> {
        let expr = expr.trim();
        if !is_dotted_name(expr) {
            return None;
        }
        let mut segments = expr.split('.');
        let first = segments.next()?;
        let Some(mut current) = self.namespace.get(first).cloned() else {
            return resolve(self.importer, expr);
        };
        for segment in segments {
            current = match current.attribute(segment) {
                Some(next) => next,
                None => match &current {
                    Object::Module(module) => Object::Module(
                        self.importer
                            .import_module(&format!("{}.{segment}", module.path()))?,
                    ),
                    _ => return None,
                },
            };
        }
        Some(current)
    }

    fn lookup_interfaces(&self, exprs: &[String]) -> Vec<Arc<Interface>> {
        exprs
            .iter()
            .filter_map(|expr| match self.lookup(expr) {
                Some(Object::Interface(iface)) => Some(iface),
                _ => {
                    debug!("{}: `{expr}` is not an interface", self.path);
                    None
                }
            })
            .collect()
    }

    fn import_statement(&mut self, text: &str) {
        let Some(rest) = text.strip_prefix("import ") else {
            return;
        };
        for item in split_top_level(rest, ',') {
            if let Some((module, alias)) = item.split_once(" as ") {
                match self.importer.import_module(module.trim()) {
                    Some(imported) => self.bind(alias.trim(), Object::Module(imported)),
                    None => debug!("{}: cannot import `{}`", self.path, module.trim()),
                }
                continue;
            }
            let module = item.trim();
            if self.importer.import_module(module).is_none() {
                debug!("{}: cannot import `{module}`", self.path);
            }
            let top = module.split('.').next().unwrap_or(module);
            if let Some(imported) = self.importer.import_module(top) {
                self.bind(top, Object::Module(imported));
            }
        }
    }

    fn from_import(&mut self, text: &str) {
        let Some((module_expr, names)) = text
            .strip_prefix("from ")
            .and_then(|rest| rest.split_once(" import "))
        else {
            return;
        };
        let Some(module_path) = absolute_name(Some(&self.package), module_expr.trim()) else {
            debug!("{}: cannot resolve relative import `{module_expr}`", self.path);
            return;
        };
        let module = self.importer.import_module(&module_path);
        let names = names.trim();
        let names = names
            .strip_prefix('(')
            .and_then(|n| n.strip_suffix(')'))
            .unwrap_or(names);

        if names.trim() == "*" {
            let Some(module) = module else {
                return;
            };
            let exported: Vec<String> = match module.all() {
                Some(all) => all.to_vec(),
                None => module
                    .names()
                    .into_iter()
                    .filter(|name| !name.starts_with('_'))
                    .collect(),
            };
            for name in exported {
                if let Some(value) = module.member(&name) {
                    self.bind(&name, value.clone());
                }
            }
            return;
        }

        for item in split_top_level(names, ',') {
            let (name, alias) = match item.split_once(" as ") {
                Some((name, alias)) => (name.trim(), alias.trim()),
                None => (item.trim(), item.trim()),
            };
            let value = module
                .as_ref()
                .and_then(|m| m.member(name).cloned())
                .or_else(|| {
                    self.importer
                        .import_module(&format!("{module_path}.{name}"))
                        .map(Object::Module)
                });
            match value {
                Some(value) => self.bind(alias, value),
                None => debug!("{}: cannot import `{name}` from `{module_path}`", self.path),
            }
        }
    }

    /// A simple statement at module level: assignments and declarations.
    fn statement(&mut self, text: &str) {
        if let Some((callee, args)) = split_call(text) {
            if last_segment(&callee) == "moduleProvides" {
                let provided = self.lookup_interfaces(&positional_args(&args));
                self.provides.extend(provided);
            }
            return;
        }
        let Some(eq) = find_assignment(text) else {
            return;
        };
        let mut targets = vec![text[..eq].trim().to_string()];
        let mut value = text[eq + 1..].trim();
        while let Some(eq) = find_assignment(value) {
            targets.push(value[..eq].trim().to_string());
            value = value[eq + 1..].trim();
        }

        for target in targets {
            let target = strip_annotation(&target);
            match target.as_str() {
                "__all__" => self.all = string_sequence(value),
                "__docformat__" => self.docformat = parse_strings(value),
                _ if is_identifier(&target) => {
                    let object = match self.value_object(value) {
                        Object::Instance(instance) => {
                            let provides = self
                                .direct_provides
                                .get(&target)
                                .cloned()
                                .unwrap_or_default();
                            let mut bound =
                                Instance::new(instance.class.clone()).bound_to(&self.path, &target);
                            for iface in self.lookup_interfaces(&provides) {
                                bound = bound.providing(iface);
                            }
                            Object::Instance(Arc::new(bound))
                        }
                        other => other,
                    };
                    self.bind(&target, object);
                }
                _ => self.function_attribute(&target, value),
            }
        }
    }

    /// `function.attribute = value`
    fn function_attribute(&mut self, target: &str, value: &str) {
        let Some((name, attribute)) = target.split_once('.') else {
            return;
        };
        if !is_identifier(attribute) {
            return;
        }
        let Some(Object::Function(function)) = self.namespace.get(name) else {
            return;
        };
        if function.module != self.path {
            return;
        }
        let updated = function.as_ref().clone().with_attribute(attribute, literal_repr(value));
        self.bind(name, Object::Function(Arc::new(updated)));
    }

    fn value_object(&self, expr: &str) -> Object {
        if is_dotted_name(expr) {
            if let Some(object) = self.lookup(expr) {
                return object;
            }
        }
        if let Some((callee, _)) = split_call(expr) {
            if let Some(Object::Class(class)) = self.lookup(&callee) {
                return Object::Instance(Arc::new(Instance::new(class)));
            }
        }
        Object::value(literal_repr(expr), literal_type(expr).unwrap_or("object"))
    }

    fn scan_function(&self, owner: Option<&str>, lines: &[LogicalLine]) -> Option<Function> {
        let (header, _) = split_header(&lines[0].text);
        let header = header.strip_prefix("async ").unwrap_or(&header).trim();
        let rest = header.strip_prefix("def ")?;
        let open = rest.find('(')?;
        let close = matching_bracket(rest, open)?;
        let name = rest[..open].trim();
        if !is_identifier(name) {
            return None;
        }
        let qualname = match owner {
            Some(owner) => format!("{owner}.{name}"),
            None => name.to_string(),
        };
        let body = body_lines(lines);
        Some(
            Function::new(self.path.clone(), qualname)
                .with_doc(block_doc(&body))
                .with_params(parse_params(&rest[open + 1..close])),
        )
    }

    fn scan_class(
        &self,
        owner: Option<&str>,
        lines: &[LogicalLine],
        decorators: &[String],
    ) -> Option<(String, Object)> {
        let (header, _) = split_header(&lines[0].text);
        let rest = header.strip_prefix("class ")?.trim();
        let (name, bases_text) = match rest.find('(') {
            Some(open) => {
                let close = matching_bracket(rest, open)?;
                (rest[..open].trim(), &rest[open + 1..close])
            }
            None => (rest, ""),
        };
        if !is_identifier(name) {
            return None;
        }
        let qualname = match owner {
            Some(owner) => format!("{owner}.{name}"),
            None => name.to_string(),
        };
        let bases: Vec<(String, Option<Object>)> = split_top_level(bases_text, ',')
            .into_iter()
            .filter(|base| find_assignment(base).is_none())
            .map(|base| {
                let resolved = self.lookup(&base);
                (base, resolved)
            })
            .collect();
        let body = body_lines(lines);

        let is_interface = bases
            .iter()
            .any(|(_, base)| matches!(base, Some(Object::Interface(_))));
        let object = if is_interface {
            let builder = Interface::builder(self.path.clone(), qualname.clone());
            Object::Interface(self.interface_body(name, builder, &bases, &body).build())
        } else {
            let builder = Class::builder(self.path.clone(), qualname.clone());
            Object::Class(self.class_body(name, &qualname, builder, &bases, decorators, &body).build())
        };
        Some((name.to_string(), object))
    }

    fn interface_body(
        &self,
        name: &str,
        mut builder: InterfaceBuilder,
        bases: &[(String, Option<Object>)],
        body: &[LogicalLine],
    ) -> InterfaceBuilder {
        builder = builder.doc(block_doc(body));
        for (expr, base) in bases {
            match base {
                Some(Object::Interface(iface)) => builder = builder.base(iface.clone()),
                _ => debug!("{}: interface base `{expr}` is not an interface", self.path),
            }
        }
        if let Some(provided) = self.direct_provides.get(name) {
            for meta in self.lookup_interfaces(provided) {
                builder = builder.provides(meta);
            }
        }

        for stmt in statements(body) {
            let text = stmt[0].text.trim();
            if text.starts_with("def ") {
                if let Some(method) = self.scan_function(None, stmt) {
                    builder = builder.method(method.name().to_string(), method.params, method.doc);
                }
                continue;
            }
            let Some(eq) = find_assignment(text) else {
                continue;
            };
            let member = strip_annotation(&text[..eq]);
            if !is_identifier(&member) {
                continue;
            }
            let Some((callee, args)) = split_call(&text[eq + 1..]) else {
                continue;
            };
            if last_segment(&callee) == "Attribute" {
                let doc = positional_args(&args)
                    .first()
                    .and_then(|arg| parse_strings(arg))
                    .or_else(|| {
                        keyword_args(&args)
                            .into_iter()
                            .find(|(key, _)| key == "__doc__")
                            .and_then(|(_, value)| parse_strings(&value))
                    })
                    .unwrap_or_default();
                builder = builder.attribute(member, doc);
            } else {
                builder = builder.field(self.field(&member, &callee, &args));
            }
        }
        builder
    }

    fn field(&self, name: &str, callee: &str, args: &str) -> Field {
        let kwargs = keyword_args(args);
        let mut field = Field::new(name, self.field_kind(callee, &kwargs));
        for (key, value) in kwargs {
            match key.as_str() {
                "title" => field.title = parse_strings(&value).unwrap_or_default(),
                "description" => field.description = parse_strings(&value).unwrap_or_default(),
                "required" => field.required = value != "False",
                "default" => field.default = Some(literal_repr(&value)),
                _ => {}
            }
        }
        field
    }

    fn field_kind(&self, callee: &str, kwargs: &[(String, String)]) -> FieldKind {
        match FieldKind::from_class_name(last_segment(callee)) {
            FieldKind::Other(_) => match self.lookup(callee) {
                Some(Object::Class(class)) => {
                    FieldKind::Other(format!("{}.{}", class.module(), class.qualname()))
                }
                _ => FieldKind::Other(callee.to_string()),
            },
            FieldKind::Tokens(default_type) => {
                let value_type = kwargs
                    .iter()
                    .find(|(key, _)| key == "value_type")
                    .and_then(|(_, value)| split_call(value))
                    .map(|(inner, inner_args)| self.field_kind(&inner, &keyword_args(&inner_args)));
                FieldKind::Tokens(Box::new(value_type.unwrap_or(*default_type)))
            }
            kind => kind,
        }
    }

    fn class_body(
        &self,
        name: &str,
        qualname: &str,
        mut builder: ClassBuilder,
        bases: &[(String, Option<Object>)],
        decorators: &[String],
        body: &[LogicalLine],
    ) -> ClassBuilder {
        builder = builder.doc(block_doc(body));
        for (expr, base) in bases {
            match base {
                Some(Object::Class(class)) => builder = builder.base(class.clone()),
                _ if expr == "object" => {}
                _ => builder = builder.base(external_class(expr)),
            }
        }
        for decorator in decorators {
            let Some((callee, args)) = split_call(decorator) else {
                continue;
            };
            let ifaces = self.lookup_interfaces(&positional_args(&args));
            match last_segment(&callee) {
                "implementer" | "implementer_only" => {
                    for iface in ifaces {
                        builder = builder.implements(iface);
                    }
                }
                "provider" => {
                    for iface in ifaces {
                        builder = builder.class_provides(iface);
                    }
                }
                _ => {}
            }
        }
        if owner_is_module(qualname) {
            if let Some(declared) = self.class_implements.get(name) {
                for iface in self.lookup_interfaces(declared) {
                    builder = builder.implements(iface);
                }
            }
        }

        let mut method_decorators: Vec<String> = Vec::new();
        for stmt in statements(body) {
            let text = stmt[0].text.trim();
            if let Some(decorator) = text.strip_prefix('@') {
                method_decorators.push(decorator.trim().to_string());
                continue;
            }
            let keyword = text.split_whitespace().next().unwrap_or_default();
            match keyword {
                "def" | "async" => {
                    if let Some(function) = self.scan_function(Some(qualname), stmt) {
                        if method_decorators.iter().any(|d| d == "property") {
                            builder = builder.attribute(
                                function.name().to_string(),
                                Object::value("<property object>", "property"),
                            );
                        } else {
                            builder = builder.method(function);
                        }
                    }
                }
                "class" => {
                    if let Some((nested, object)) = self.scan_class(Some(qualname), stmt, &method_decorators) {
                        builder = builder.attribute(nested, object);
                    }
                }
                _ => builder = self.class_statement(builder, text),
            }
            method_decorators.clear();
        }
        builder
    }

    fn class_statement(&self, mut builder: ClassBuilder, text: &str) -> ClassBuilder {
        if let Some((callee, args)) = split_call(text) {
            let ifaces = self.lookup_interfaces(&positional_args(&args));
            match last_segment(&callee) {
                "implements" | "implementsOnly" => {
                    for iface in ifaces {
                        builder = builder.implements(iface);
                    }
                }
                "classProvides" => {
                    for iface in ifaces {
                        builder = builder.class_provides(iface);
                    }
                }
                _ => {}
            }
            return builder;
        }
        let Some(eq) = find_assignment(text) else {
            return builder;
        };
        let target = strip_annotation(&text[..eq]);
        let value = text[eq + 1..].trim();
        if is_identifier(&target) {
            builder = builder.attribute(target, self.value_object(value));
        }
        builder
    }
}

fn owner_is_module(qualname: &str) -> bool {
    !qualname.contains('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        let params = parse_params("self, a, (b, c), d=u'x', *args, e=1, **kw");
        assert_eq!(
            params,
            vec![
                Param::positional("self"),
                Param::positional("a"),
                Param::Unpack(vec![Param::positional("b"), Param::positional("c")]),
                Param::with_default("d", "'x'"),
                Param::VarArgs("args".into()),
                Param::KeywordOnly {
                    name: "e".into(),
                    default: Some("1".into())
                },
                Param::KwArgs("kw".into()),
            ]
        );
    }

    #[test]
    fn test_parse_params_with_annotations() {
        let params = parse_params("x: int = 5, *, flag: bool");
        assert_eq!(
            params,
            vec![
                Param::with_default("x", "5"),
                Param::KeywordOnly {
                    name: "flag".into(),
                    default: None
                },
            ]
        );
    }

    #[test]
    fn test_block_doc() {
        let lines = logical_lines("'''Module doc.'''\nx = 1\n");
        assert_eq!(block_doc(&lines), "Module doc.");
        let lines = logical_lines("x = 1\n'''Not a docstring.'''\n");
        assert_eq!(block_doc(&lines), "");
    }
}
