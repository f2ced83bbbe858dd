//! Total field access over untrusted JSON.
//!
//! A [`Cursor`] never fails: missing keys, nulls and wrong types all resolve
//! to a defined default, and shape surprises are recorded in [`Diagnostics`]
//! with the dotted path where they happened.

use lazy_static::lazy_static;
use modul_core::{AdapterWarning, PLACEHOLDER};
use regex::Regex;
use serde_json::Value;

lazy_static! {
    /// "1. ", "2) ", "- ", "• " at the start of a list item
    static ref LIST_MARKER: Regex = Regex::new(r"^\s*(?:\d{1,3}[.)]|[-•*])\s+").unwrap();
}

pub(crate) static NULL: Value = Value::Null;

/// Warnings collected while adapting one payload
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<AdapterWarning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: AdapterWarning) {
        self.warnings.push(warning);
    }

    pub fn unexpected(&mut self, path: &str, found: &Value) {
        self.push(AdapterWarning::UnexpectedShape {
            field: path.to_string(),
            found: kind(found).to_string(),
        });
    }

    pub fn into_warnings(self) -> Vec<AdapterWarning> {
        self.warnings
    }

    pub fn warnings(&self) -> &[AdapterWarning] {
        &self.warnings
    }
}

/// JSON type name used in warnings
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Strip a leading list marker so the renderer can number items itself.
pub fn strip_list_marker(item: &str) -> String {
    LIST_MARKER.replace(item.trim(), "").trim().to_string()
}

/// Read-only position inside a payload
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    node: &'a Value,
}

impl<'a> Cursor<'a> {
    pub fn new(node: &'a Value) -> Self {
        Self { node }
    }

    pub fn value(&self) -> &'a Value {
        self.node
    }

    pub fn is_missing(&self) -> bool {
        match self.node {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn is_object(&self) -> bool {
        self.node.is_object()
    }

    pub fn is_array(&self) -> bool {
        self.node.is_array()
    }

    /// Child by key; null when absent or when this is not an object.
    pub fn get(&self, key: &str) -> Cursor<'a> {
        Cursor::new(self.node.get(key).unwrap_or(&NULL))
    }

    /// First child among `keys` that is present and not blank.
    pub fn first(&self, keys: &[&str]) -> Cursor<'a> {
        keys.iter()
            .map(|k| self.get(k))
            .find(|c| !c.is_missing())
            .unwrap_or(Cursor::new(&NULL))
    }

    /// Scalar text; arrays of scalars are joined, objects are a shape error.
    pub fn text(&self, path: &str, diag: &mut Diagnostics) -> String {
        self.text_opt(path, diag)
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    /// Like [`Cursor::text`] but with a caller-supplied fallback for absent values.
    pub fn text_or(&self, path: &str, fallback: &str, diag: &mut Diagnostics) -> String {
        match self.text_opt(path, diag) {
            Some(text) => text,
            None if !fallback.trim().is_empty() => fallback.trim().to_string(),
            None => PLACEHOLDER.to_string(),
        }
    }

    /// Text when present, `None` for absent/blank/unusable values.
    pub fn text_opt(&self, path: &str, diag: &mut Diagnostics) -> Option<String> {
        match self.node {
            Value::Null => None,
            Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(if *b { "Ya" } else { "Tidak" }.to_string()),
            Value::Array(items) => {
                if items.iter().any(|item| scalar_text(item).is_none()) {
                    diag.unexpected(path, self.node);
                }
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(scalar_text)
                    .map(|s| strip_list_marker(&s))
                    .filter(|s| !s.is_empty())
                    .collect();
                Some(parts.join("; ")).filter(|s| !s.is_empty())
            }
            Value::Object(_) => {
                diag.unexpected(path, self.node);
                None
            }
        }
    }

    /// List of strings. A bare string becomes a one-element list; list
    /// markers are stripped; blank entries are dropped.
    pub fn list(&self, path: &str, diag: &mut Diagnostics) -> Vec<String> {
        match self.node {
            Value::Null => Vec::new(),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| match scalar_text(item) {
                    Some(s) => Some(s),
                    None => {
                        diag.unexpected(&format!("{}[{}]", path, i), item);
                        None
                    }
                })
                .map(|s| strip_list_marker(&s))
                .filter(|s| !s.is_empty())
                .collect(),
            Value::Object(_) => {
                diag.unexpected(path, self.node);
                Vec::new()
            }
            scalar => scalar_text(scalar)
                .map(|s| strip_list_marker(&s))
                .filter(|s| !s.is_empty())
                .into_iter()
                .collect(),
        }
    }

    /// Element cursors of an array. A single object counts as a one-element
    /// array; anything else is empty.
    pub fn items(&self, path: &str, diag: &mut Diagnostics) -> Vec<Cursor<'a>> {
        match self.node {
            Value::Null => Vec::new(),
            Value::Array(items) => items.iter().map(Cursor::new).collect(),
            Value::Object(_) => vec![*self],
            other => {
                diag.unexpected(path, other);
                Vec::new()
            }
        }
    }

    /// Unsigned integer from a number or a numeric prefix of a string.
    pub fn number(&self) -> Option<u32> {
        match self.node {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s
                .trim()
                .split(|c: char| !c.is_ascii_digit())
                .find(|part| !part.is_empty())
                .and_then(|digits| digits.parse().ok()),
            _ => None,
        }
    }

    /// Markdown-lite text. Arrays become bullet lists; objects inside
    /// arrays become "key: value" lines (glossary entries and the like).
    pub fn markdown(&self, path: &str, diag: &mut Diagnostics) -> String {
        match self.node {
            Value::Array(items) => {
                let lines: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Object(map) => {
                            let parts: Vec<String> = map.values().filter_map(scalar_text).collect();
                            Some(parts.join(": "))
                        }
                        other => scalar_text(other),
                    })
                    .map(|s| strip_list_marker(&s))
                    .filter(|s| !s.is_empty())
                    .map(|s| format!("- {}", s))
                    .collect();
                if lines.is_empty() {
                    PLACEHOLDER.to_string()
                } else {
                    lines.join("\n")
                }
            }
            Value::Object(map) => {
                let lines: Vec<String> = map
                    .iter()
                    .filter_map(|(k, v)| scalar_text(v).map(|v| format!("- **{}**: {}", k, v)))
                    .collect();
                if lines.is_empty() {
                    diag.unexpected(path, self.node);
                    PLACEHOLDER.to_string()
                } else {
                    lines.join("\n")
                }
            }
            _ => self.text(path, diag),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// "Kelas X (Fase E)" + "Ganjil" → "Kelas X (Fase E) / Ganjil"
pub fn class_semester(class: Option<String>, semester: Option<String>) -> String {
    let semester = semester.filter(|s| !s.trim().is_empty());
    match (class, semester) {
        (Some(c), Some(s)) if names_word(&c, &s) => c,
        (Some(c), Some(s)) => format!("{} / {}", c, s),
        (Some(c), None) => c,
        (None, Some(s)) => format!("{} / {}", PLACEHOLDER, s),
        (None, None) => PLACEHOLDER.to_string(),
    }
}

/// `needle` appears in `text` as whole words, not inside a longer one
fn names_word(text: &str, needle: &str) -> bool {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(needle.trim())))
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}
