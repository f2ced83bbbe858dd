//! Response Normalizer: raw generator text → Payload
//!
//! - Strips Markdown code fences the generator adds despite instructions
//! - Parses JSON for structured variants, unwrapping stringified JSON
//! - Passes text through for the legacy variant

use lazy_static::lazy_static;
use modul_core::error::{excerpt, EXCERPT_CHARS};
use modul_core::{ModulError, Payload, ResponseFormat};
use regex::Regex;
use serde_json::Value;
use tracing::warn;

lazy_static! {
    /// Opening fence with optional language tag: "```json", "``` JSON"
    static ref OPEN_FENCE: Regex = Regex::new(r"^\s*```[ \t]*[A-Za-z0-9_-]*[ \t]*\r?\n?").unwrap();

    /// Closing fence at the very end
    static ref CLOSE_FENCE: Regex = Regex::new(r"\r?\n?[ \t]*```[ \t]*$").unwrap();
}

/// Remove a single enclosing code fence, if any, and trim.
pub fn strip_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }
    let without_open = OPEN_FENCE.replace(trimmed, "");
    CLOSE_FENCE.replace(&without_open, "").trim().to_string()
}

/// Normalize raw generator output according to the requested format.
pub fn normalize(raw: &str, format: ResponseFormat) -> Result<Payload, ModulError> {
    let cleaned = strip_fences(raw);
    match format {
        ResponseFormat::Text => Ok(Payload::Text(cleaned)),
        ResponseFormat::Json => parse_json(&cleaned).map(Payload::Json),
    }
}

fn parse_json(cleaned: &str) -> Result<Value, ModulError> {
    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        warn!(
            error = %e,
            excerpt = %excerpt(cleaned, EXCERPT_CHARS),
            "Generator returned malformed JSON"
        );
        ModulError::malformed(e, cleaned)
    })?;

    // Some models wrap the whole object in a JSON string
    if let Value::String(inner) = &value {
        let inner = strip_fences(inner);
        if inner.starts_with('{') || inner.starts_with('[') {
            return serde_json::from_str(&inner).map_err(|e| {
                warn!(
                    error = %e,
                    excerpt = %excerpt(&inner, EXCERPT_CHARS),
                    "Stringified JSON payload did not parse"
                );
                ModulError::malformed(e, &inner)
            });
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_fences_variants() {
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_fences("```markdown\n# Modul\n\n- satu\n```\n"), "# Modul\n\n- satu");
    }

    #[test]
    fn test_inner_fences_are_kept() {
        let text = "# Modul\n\n```\ncontoh\n```\n\nSelesai";
        assert_eq!(strip_fences(text), text);
    }

    #[test]
    fn test_normalize_json_object() {
        let payload = normalize("```json\n{\"informasiUmum\": {}}\n```", ResponseFormat::Json).unwrap();
        assert_eq!(payload, Payload::Json(json!({"informasiUmum": {}})));
    }

    #[test]
    fn test_normalize_stringified_json() {
        let raw = serde_json::to_string("{\"rubrik\": {\"judul\": \"R\"}}").unwrap();
        let payload = normalize(&raw, ResponseFormat::Json).unwrap();
        assert_eq!(payload, Payload::Json(json!({"rubrik": {"judul": "R"}})));
    }

    #[test]
    fn test_plain_json_string_is_kept() {
        let payload = normalize("\"halo\"", ResponseFormat::Json).unwrap();
        assert_eq!(payload, Payload::Json(json!("halo")));
    }

    #[test]
    fn test_malformed_json_is_distinct_error() {
        let err = normalize("```json\n{not valid}\n```", ResponseFormat::Json).unwrap_err();
        match err {
            ModulError::MalformedResponse { excerpt, .. } => assert_eq!(excerpt, "{not valid}"),
            other => panic!("expected MalformedResponse, got {other}"),
        }
    }

    #[test]
    fn test_text_format_passes_through() {
        let payload = normalize("```\n# Judul\nIsi\n```", ResponseFormat::Text).unwrap();
        assert_eq!(payload, Payload::Text("# Judul\nIsi".to_string()));
    }
}
