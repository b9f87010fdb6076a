//! Template rendering for step commands and prompts.
//!
//! Placeholders use `{{name}}` syntax, where `name` may be a dotted path
//! into nested mappings (`{{repo.owner}}`). Whitespace inside the braces is
//! ignored.
//!
//! Two modes exist:
//!
//! - [`RenderMode::Plain`] substitutes values as text (agent prompts)
//! - [`RenderMode::Shell`] quotes every substituted value as a single shell
//!   word (bash commands)
//!
//! Missing variables render as an empty string in both modes.
//!
//! # Example
//!
//! ```
//! use recipe_runner::context::{render_template, RenderMode};
//! use serde_json::json;
//!
//! let vars = json!({"target": "a; rm -rf /"});
//! let lookup = |name: &str| vars.get(name).cloned();
//! let command = render_template("rm {{target}}", lookup, RenderMode::Shell);
//! assert_eq!(command, "rm 'a; rm -rf /'");
//! ```

use crate::shell::quote;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_\-]*(?:\.[A-Za-z0-9_\-]+)*)\s*\}\}").unwrap()
});

/// How substituted values are written into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Values inserted verbatim.
    Plain,
    /// Values quoted for POSIX shells.
    Shell,
}

/// A segment of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Variable reference: {{name}}
    Variable(String),
}

/// Split a template into literal and variable segments.
pub fn parse_template(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(input) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Literal(input[last..whole.start()].to_string()));
        }
        segments.push(Segment::Variable(name.as_str().to_string()));
        last = whole.end();
    }

    if last < input.len() {
        segments.push(Segment::Literal(input[last..].to_string()));
    }

    segments
}

/// Extract all variable names referenced by a template.
pub fn extract_variables(input: &str) -> HashSet<String> {
    parse_template(input)
        .into_iter()
        .filter_map(|seg| match seg {
            Segment::Variable(name) => Some(name),
            _ => None,
        })
        .collect()
}

/// Check if a template contains any placeholder.
pub fn has_placeholders(input: &str) -> bool {
    PLACEHOLDER.is_match(input)
}

/// Render a template, resolving each placeholder through `lookup`.
pub fn render_template<F>(input: &str, lookup: F, mode: RenderMode) -> String
where
    F: Fn(&str) -> Option<Value>,
{
    let mut result = String::with_capacity(input.len());

    for segment in parse_template(input) {
        match segment {
            Segment::Literal(text) => result.push_str(&text),
            Segment::Variable(name) => {
                let text = lookup(&name).map(|v| value_to_text(&v)).unwrap_or_default();
                match mode {
                    RenderMode::Plain => result.push_str(&text),
                    RenderMode::Shell => result.push_str(&quote(&text)),
                }
            }
        }
    }

    result
}

/// Textual form of a context value.
///
/// Strings are used as-is, `null` is empty, and everything else uses
/// compact JSON with sorted mapping keys.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
