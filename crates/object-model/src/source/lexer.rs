//! Line-level lexing of Python source.
//!
//! Source is split into logical lines: physical lines joined while
//! brackets are open, a triple-quoted string continues or a line ends with
//! a backslash. Comments are dropped; string contents are kept verbatim.

/// One logical line of source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub indent: usize,
    pub text: String,
    /// 1-based line of the first physical line.
    pub line: usize,
}

pub fn logical_lines(source: &str) -> Vec<LogicalLine> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut indent = 0;
    let mut start_line = 1;
    let mut line_no = 1;
    let mut depth: i32 = 0;
    let mut quote: Option<(char, bool)> = None;
    let mut at_line_start = true;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if at_line_start && current.is_empty() {
            if c == ' ' || c == '\t' {
                indent += if c == '\t' { 8 } else { 1 };
                continue;
            }
            start_line = line_no;
            at_line_start = false;
        }

        if let Some((q, triple)) = quote {
            current.push(c);
            match c {
                '\\' => {
                    if let Some(next) = chars.next() {
                        if next == '\n' {
                            line_no += 1;
                        }
                        current.push(next);
                    }
                }
                '\n' => {
                    line_no += 1;
                    if !triple {
                        quote = None;
                    }
                }
                _ if c == q => {
                    if !triple {
                        quote = None;
                    } else if chars.peek() == Some(&q) {
                        current.push(q);
                        chars.next();
                        if chars.peek() == Some(&q) {
                            current.push(q);
                            chars.next();
                            quote = None;
                        }
                    }
                }
                _ => {}
            }
            continue;
        }

        match c {
            '#' => {
                while chars.peek().is_some_and(|&next| next != '\n') {
                    chars.next();
                }
            }
            '\'' | '"' => {
                current.push(c);
                let mut triple = false;
                if chars.peek() == Some(&c) {
                    current.push(c);
                    chars.next();
                    if chars.peek() == Some(&c) {
                        current.push(c);
                        chars.next();
                        triple = true;
                    } else {
                        // An empty string literal.
                        continue;
                    }
                }
                quote = Some((c, triple));
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                current.push(c);
            }
            '\\' if chars.peek() == Some(&'\n') => {
                chars.next();
                line_no += 1;
                current.push(' ');
            }
            '\n' => {
                line_no += 1;
                if depth > 0 {
                    current.push('\n');
                    continue;
                }
                flush(&mut lines, &mut current, indent, start_line);
                indent = 0;
                at_line_start = true;
            }
            '\r' => {}
            _ => current.push(c),
        }
    }
    flush(&mut lines, &mut current, indent, start_line);
    lines
}

fn flush(lines: &mut Vec<LogicalLine>, current: &mut String, indent: usize, line: usize) {
    let text = current.trim_end().to_string();
    current.clear();
    if !text.is_empty() {
        lines.push(LogicalLine { indent, text, line });
    }
}

/// Visit each character of `text` that is outside string literals,
/// together with its byte offset and the bracket depth before it.
fn scan_code(text: &str, mut visit: impl FnMut(usize, char, i32) -> bool) {
    let mut depth = 0;
    let mut quote: Option<(char, bool)> = None;
    let bytes: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = 0;
    while i < bytes.len() {
        let (offset, c) = bytes[i];
        if let Some((q, triple)) = quote {
            if c == '\\' {
                i += 2;
                continue;
            }
            if c == q {
                if !triple {
                    quote = None;
                } else if bytes.get(i + 1).map(|b| b.1) == Some(q) && bytes.get(i + 2).map(|b| b.1) == Some(q) {
                    quote = None;
                    i += 3;
                    continue;
                }
            }
            i += 1;
            continue;
        }
        match c {
            '\'' | '"' => {
                let triple = bytes.get(i + 1).map(|b| b.1) == Some(c) && bytes.get(i + 2).map(|b| b.1) == Some(c);
                if bytes.get(i + 1).map(|b| b.1) == Some(c) && !triple {
                    i += 2;
                    continue;
                }
                quote = Some((c, triple));
                i += if triple { 3 } else { 1 };
                continue;
            }
            '(' | '[' | '{' => {
                if !visit(offset, c, depth) {
                    return;
                }
                depth += 1;
            }
            ')' | ']' | '}' => {
                depth -= 1;
                if !visit(offset, c, depth) {
                    return;
                }
            }
            _ => {
                if !visit(offset, c, depth) {
                    return;
                }
            }
        }
        i += 1;
    }
}

/// Split at top-level occurrences of `sep`, outside brackets and strings.
pub fn split_top_level(text: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut last = 0;
    scan_code(text, |offset, c, depth| {
        if c == sep && depth == 0 {
            parts.push(text[last..offset].trim().to_string());
            last = offset + c.len_utf8();
        }
        true
    });
    let tail = text[last..].trim();
    if !tail.is_empty() {
        parts.push(tail.to_string());
    }
    parts.retain(|part| !part.is_empty());
    parts
}

/// Split a compound statement header at its colon: `class A(B): pass`
/// gives `("class A(B)", Some("pass"))`.
pub fn split_header(text: &str) -> (String, Option<String>) {
    let mut colon = None;
    scan_code(text, |offset, c, depth| {
        if c == ':' && depth == 0 {
            colon = Some(offset);
            return false;
        }
        true
    });
    match colon {
        Some(offset) => {
            let body = text[offset + 1..].trim();
            (
                text[..offset].trim().to_string(),
                (!body.is_empty()).then(|| body.to_string()),
            )
        }
        None => (text.trim().to_string(), None),
    }
}

/// Position of the first top-level `=` that is an assignment.
pub fn find_assignment(text: &str) -> Option<usize> {
    let mut found = None;
    let mut previous = ' ';
    scan_code(text, |offset, c, depth| {
        if c == '=' && depth == 0 {
            let next = text[offset + 1..].chars().next().unwrap_or(' ');
            if next != '=' && !matches!(previous, '=' | '!' | '<' | '>' | '+' | '-' | '*' | '/' | '%' | '|' | '&' | ':') {
                found = Some(offset);
                return false;
            }
        }
        previous = c;
        true
    });
    found
}

/// Offset of the bracket closing the one at `open`.
pub fn matching_bracket(text: &str, open: usize) -> Option<usize> {
    let mut close = None;
    scan_code(&text[open..], |offset, c, depth| {
        if matches!(c, ')' | ']' | '}') && depth == 0 {
            close = Some(open + offset);
            return false;
        }
        true
    });
    close
}

/// Split `callee(args)` into the callee and the argument text.
pub fn split_call(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    let open = text.find('(')?;
    if !text.ends_with(')') {
        return None;
    }
    let callee = text[..open].trim();
    if callee.is_empty() || !callee.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.') {
        return None;
    }
    if matching_bracket(text, open) != Some(text.len() - 1) {
        return None;
    }
    Some((callee.to_string(), text[open + 1..text.len() - 1].to_string()))
}

/// Parse one (possibly prefixed) string literal at the start of `text`.
/// Returns the unescaped value and the remaining text.
pub fn parse_string_literal(text: &str) -> Option<(String, &str)> {
    let text = text.trim_start();
    let prefix_len = text
        .chars()
        .take_while(|c| matches!(c, 'u' | 'U' | 'b' | 'B' | 'r' | 'R'))
        .count();
    if prefix_len > 2 {
        return None;
    }
    let raw = text[..prefix_len].to_ascii_lowercase().contains('r');
    let rest = &text[prefix_len..];
    let q = rest.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let delimiter: String = if rest.starts_with(&q.to_string().repeat(3)) {
        q.to_string().repeat(3)
    } else {
        q.to_string()
    };
    let body_start = delimiter.len();
    let body = &rest[body_start..];
    let mut value = String::new();
    let mut chars = body.char_indices();
    while let Some((offset, c)) = chars.next() {
        if c == '\\' {
            let Some((_, next)) = chars.next() else { break };
            if raw {
                value.push('\\');
                value.push(next);
                continue;
            }
            match next {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                '\n' => {}
                other => value.push(other),
            }
            continue;
        }
        if body[offset..].starts_with(&delimiter) {
            return Some((value, &body[offset + delimiter.len()..]));
        }
        value.push(c);
    }
    None
}

/// Parse an expression made only of adjacent string literals, optionally
/// wrapped in parentheses.
pub fn parse_strings(text: &str) -> Option<String> {
    let mut text = text.trim();
    if text.starts_with('(') && text.ends_with(')') {
        text = text[1..text.len() - 1].trim();
    }
    let mut value = String::new();
    let mut rest = text;
    loop {
        let (part, remaining) = parse_string_literal(rest)?;
        value.push_str(&part);
        rest = remaining.trim_start();
        if rest.is_empty() {
            return Some(value);
        }
    }
}

/// Python-style `repr` of a literal expression.
pub fn literal_repr(text: &str) -> String {
    let text = text.trim();
    match parse_strings(text) {
        Some(value) if !value.contains('\'') => format!("'{}'", value.replace('\n', "\\n")),
        Some(value) => format!("\"{}\"", value.replace('\n', "\\n")),
        None => text.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

/// The type name of a literal expression, when it is one.
pub fn literal_type(text: &str) -> Option<&'static str> {
    let text = text.trim();
    if parse_strings(text).is_some() {
        let is_bytes = text.trim_start_matches(['r', 'R']).starts_with(['b', 'B']);
        return Some(if is_bytes { "bytes" } else { "str" });
    }
    match text {
        "True" | "False" => return Some("bool"),
        "None" => return Some("NoneType"),
        _ => {}
    }
    if text.parse::<i64>().is_ok() {
        return Some("int");
    }
    if text.parse::<f64>().is_ok() {
        return Some("float");
    }
    match text.chars().next() {
        Some('[') => Some("list"),
        Some('{') => Some(if text == "{}" || text.contains(':') { "dict" } else { "set" }),
        Some('(') => Some("tuple"),
        _ => None,
    }
}

/// Items of a list/tuple literal of strings, e.g. an `__all__` value.
pub fn string_sequence(text: &str) -> Option<Vec<String>> {
    let text = text.trim();
    let inner = text
        .strip_prefix(['[', '('])
        .and_then(|t| t.strip_suffix([']', ')']))?;
    split_top_level(inner, ',')
        .iter()
        .map(|item| parse_strings(item))
        .collect()
}

pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

pub fn is_dotted_name(text: &str) -> bool {
    !text.is_empty() && text.split('.').all(is_identifier)
}
