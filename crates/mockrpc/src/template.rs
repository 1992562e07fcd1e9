//! Fault message templates.
//!
//! Fixtures may carry an `error_message` that is rendered when no entry
//! matches the inbound params.
//!
//! # Supported Template Variables
//!
//! - `${action}` - The action name
//! - `${params}` - All params, as compact JSON
//! - `${params.<key>}` - A single param; nested keys and array indexes are
//!   separated by dots (`${params.ids.0}`)
//!
//! Strings are substituted raw, every other value as compact JSON. A path
//! that resolves to nothing renders as an empty string.
//!
//! # Example
//!
//! ```yaml
//! error_message: 'Bug ${params.ids.0} does not exist (${action})'
//! ```

use crate::types::Params;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Regex for matching template variables: ${action}, ${params.ids.0}, etc.
static TEMPLATE_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_template_regex() -> &'static Regex {
    TEMPLATE_REGEX.get_or_init(|| Regex::new(r"\$\{([^}]*)\}").expect("valid template regex"))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("unknown variable '{0}' (expected 'action' or 'params')")]
    UnknownVariable(String),
    #[error("empty path segment in '{0}'")]
    EmptySegment(String),
    #[error("unterminated '${{' at byte {0}")]
    Unterminated(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Action,
    Params(Vec<String>),
}

/// A parsed `error_message` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl MessageTemplate {
    /// Parse a template, rejecting unknown variables and unterminated
    /// placeholders.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in get_template_regex().captures_iter(source) {
            let (Some(whole), Some(expr)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            push_literal(&mut segments, &source[last..whole.start()], last)?;
            segments.push(parse_variable(expr.as_str().trim())?);
            last = whole.end();
        }
        push_literal(&mut segments, &source[last..], last)?;

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render with the inbound params and the action name bound.
    pub fn render(&self, action: &str, params: &Params) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Action => out.push_str(action),
                Segment::Params(path) if path.is_empty() => {
                    out.push_str(&Value::Object(params.clone()).to_string());
                }
                Segment::Params(path) => {
                    if let Some(value) = lookup(params, path) {
                        push_value(&mut out, value);
                    }
                }
            }
        }
        out
    }
}

fn push_literal(
    segments: &mut Vec<Segment>,
    text: &str,
    offset: usize,
) -> Result<(), TemplateError> {
    if let Some(pos) = text.find("${") {
        return Err(TemplateError::Unterminated(offset + pos));
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_string()));
    }
    Ok(())
}

fn parse_variable(expr: &str) -> Result<Segment, TemplateError> {
    let mut parts = expr.split('.');
    match parts.next() {
        Some("action") if parts.next().is_none() => Ok(Segment::Action),
        Some("params") => {
            let path: Vec<String> = parts.map(str::to_string).collect();
            if path.iter().any(|p| p.is_empty()) {
                return Err(TemplateError::EmptySegment(expr.to_string()));
            }
            Ok(Segment::Params(path))
        }
        _ => Err(TemplateError::UnknownVariable(expr.to_string())),
    }
}

fn lookup<'a>(params: &'a Params, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = params.get(first)?;
    for key in rest {
        current = match current {
            Value::Object(map) => map.get(key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn push_value(out: &mut String, value: &Value) {
    match value {
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}
