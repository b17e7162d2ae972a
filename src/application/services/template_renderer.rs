//! Placeholder substitution for template content and subjects.
//!
//! Every `{{key}}` whose key is present in the parameter map is first
//! rewritten to the call form `{{var "key"}}`, so keys never have to be valid
//! identifiers. The rewritten text is then parsed as a minimal expression
//! template whose only function is `var`, and evaluated without any other
//! data context.

use std::collections::HashMap;

use thiserror::Error;

const LOOKUP_FN: &str = "var";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("unclosed action starting at byte {offset}")]
    Unclosed { offset: usize },
    #[error("empty action at byte {offset}")]
    EmptyAction { offset: usize },
    #[error("unknown directive `{directive}`")]
    UnknownDirective { directive: String },
    #[error("malformed argument to var: {reason}")]
    BadArgument { reason: String },
}

#[derive(Debug, PartialEq, Eq)]
enum Node<'a> {
    Text(&'a str),
    Lookup(String),
}

/// Renders `content` against `params`. Keys missing from `params` render as
/// an empty string; structurally invalid templates are an error.
pub fn render(content: &str, params: &HashMap<String, String>) -> Result<String, RenderError> {
    let rewritten = rewrite_placeholders(content, params);
    let nodes = parse(&rewritten)?;
    Ok(execute(&nodes, params))
}

fn rewrite_placeholders(content: &str, params: &HashMap<String, String>) -> String {
    let mut rewritten = content.to_string();
    for key in params.keys() {
        let placeholder = format!("{{{{{key}}}}}");
        if rewritten.contains(&placeholder) {
            let call = format!("{{{{{LOOKUP_FN} {}}}}}", quote(key));
            rewritten = rewritten.replace(&placeholder, &call);
        }
    }
    rewritten
}

fn quote(key: &str) -> String {
    let mut quoted = String::with_capacity(key.len() + 2);
    quoted.push('"');
    for ch in key.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

fn parse(source: &str) -> Result<Vec<Node<'_>>, RenderError> {
    let mut nodes = Vec::new();
    let mut rest = source;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            nodes.push(Node::Text(&rest[..start]));
        }
        let action_offset = offset + start;
        let body = &rest[start + 2..];
        let end = find_action_end(body).ok_or(RenderError::Unclosed {
            offset: action_offset,
        })?;
        nodes.push(parse_action(body[..end].trim(), action_offset)?);

        let consumed = start + 2 + end + 2;
        rest = &rest[consumed..];
        offset += consumed;
    }
    if !rest.is_empty() {
        nodes.push(Node::Text(rest));
    }
    Ok(nodes)
}

/// Index of the closing `}}`, skipping over quoted strings.
fn find_action_end(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut in_quote = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_quote => i += 1,
            b'"' => in_quote = !in_quote,
            b'}' if !in_quote && bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn parse_action(action: &str, offset: usize) -> Result<Node<'static>, RenderError> {
    if action.is_empty() {
        return Err(RenderError::EmptyAction { offset });
    }
    if let Some(argument) = action.strip_prefix(LOOKUP_FN) {
        if argument.is_empty() {
            return Err(RenderError::BadArgument {
                reason: "missing key".into(),
            });
        }
        if argument.starts_with(char::is_whitespace) {
            return parse_string_literal(argument.trim()).map(Node::Lookup);
        }
    }
    if is_bare_key(action) {
        return Ok(Node::Lookup(action.to_string()));
    }
    Err(RenderError::UnknownDirective {
        directive: action.to_string(),
    })
}

fn is_bare_key(action: &str) -> bool {
    let mut chars = action.chars();
    match chars.next() {
        Some(first) if first.is_alphanumeric() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.'))
}

fn parse_string_literal(literal: &str) -> Result<String, RenderError> {
    let bad = |reason: &str| RenderError::BadArgument {
        reason: reason.to_string(),
    };

    let mut chars = literal.chars();
    if chars.next() != Some('"') {
        return Err(bad("expected a quoted key"));
    }
    let mut key = String::new();
    loop {
        match chars.next() {
            None => return Err(bad("unterminated string")),
            Some('"') => break,
            Some('\\') => match chars.next() {
                Some('"') => key.push('"'),
                Some('\\') => key.push('\\'),
                Some('n') => key.push('\n'),
                Some('t') => key.push('\t'),
                _ => return Err(bad("invalid escape sequence")),
            },
            Some(ch) => key.push(ch),
        }
    }
    if chars.next().is_some() {
        return Err(bad("unexpected input after key"));
    }
    Ok(key)
}

fn execute(nodes: &[Node<'_>], params: &HashMap<String, String>) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Lookup(key) => {
                if let Some(value) = params.get(key) {
                    out.push_str(value);
                }
            }
        }
    }
    out
}
