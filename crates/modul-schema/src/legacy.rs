//! Legacy narrative adapter: the body stays Markdown-lite text
use crate::fields::{Cursor, Diagnostics};
use crate::AdaptContext;
use lazy_static::lazy_static;
use modul_core::document::LegacyDocument;
use modul_core::PLACEHOLDER;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    /// "Mata Pelajaran: Matematika", "**Mata Pelajaran**: Matematika", "| Mata Pelajaran | Matematika |"
    static ref SUBJECT_LINE: Regex =
        Regex::new(r"(?im)^[\s|*\-]*mata\s+pelajaran[\s*]*[:|][\s:]*\**\s*([^|\n*]+)").unwrap();
}

pub fn adapt_text(text: &str, ctx: &AdaptContext) -> LegacyDocument {
    let body = text.trim();
    LegacyDocument {
        subject: subject_of(body, ctx),
        body: if body.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            body.to_string()
        },
    }
}

/// A legacy request answered with JSON: keep a string as is, print anything else.
pub fn adapt_json(value: &Value, ctx: &AdaptContext, diag: &mut Diagnostics) -> LegacyDocument {
    match value {
        Value::String(text) => adapt_text(text, ctx),
        Value::Null => adapt_text("", ctx),
        other => {
            diag.unexpected("body", other);
            let cursor = Cursor::new(other);
            let body = match cursor.first(&["body", "isi", "konten"]).value() {
                Value::String(text) => text.clone(),
                _ => serde_json::to_string_pretty(other).unwrap_or_default(),
            };
            adapt_text(&body, ctx)
        }
    }
}

fn subject_of(body: &str, ctx: &AdaptContext) -> String {
    SUBJECT_LINE
        .captures(body)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| Some(ctx.hints.subject.clone()).filter(|s| !s.is_empty()))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
