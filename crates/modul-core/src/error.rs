//! Unified Error Model
//!
//! Fatal errors abort a generation or export; [`AdapterWarning`]s never do.
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModulError {
    #[error("INPUT/{field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("GENERATION/{0}")]
    GenerationFailed(#[from] GenerationFailure),

    #[error("RESPONSE/malformed JSON: {source} (excerpt: {excerpt:?})")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
        excerpt: String,
    },

    #[error("EXPORT/{0}")]
    ExportFailed(#[from] ExportFailure),

    #[error("CONFIG/{0}")]
    Config(String),
}

/// Why the external generation service did not produce usable text
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationFailure {
    #[error("network: {0}")]
    Network(String),
    #[error("auth: {0}")]
    Auth(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("empty response")]
    Empty,
    #[error("response truncated at the token limit")]
    Truncated,
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFailure {
    #[error("pdf: {0}")]
    Pdf(String),
    #[error("docx: {0}")]
    Docx(String),
    #[error("header image: {0}")]
    Image(String),
    #[error("no rendered document in session")]
    NothingToExport,
    #[error("document was replaced while exporting")]
    Stale,
    #[error("export worker: {0}")]
    Task(String),
}

impl ModulError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Build a malformed-response error keeping a bounded excerpt of the payload.
    pub fn malformed(source: serde_json::Error, raw: &str) -> Self {
        Self::MalformedResponse {
            source,
            excerpt: excerpt(raw, EXCERPT_CHARS),
        }
    }

    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::GenerationFailed(_) => "generation_failed",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::ExportFailed(_) => "export_failed",
            Self::Config(_) => "config",
        }
    }

    /// Message shown to the teacher in the form view.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput { field, reason } => {
                format!("Data form belum lengkap atau tidak valid ({}): {}", field, reason)
            }
            Self::GenerationFailed(GenerationFailure::Auth(_)) => {
                "Gagal membuat modul ajar. Pastikan API Key valid.".to_string()
            }
            Self::GenerationFailed(GenerationFailure::RateLimited(_)) => {
                "Gagal membuat modul ajar. Batas penggunaan AI tercapai, coba lagi nanti.".to_string()
            }
            Self::GenerationFailed(failure) => {
                format!("Gagal membuat modul ajar. Detail: {}", failure)
            }
            Self::MalformedResponse { .. } => {
                "Gagal membuat modul ajar. AI memberikan format data yang tidak valid. Silakan coba lagi."
                    .to_string()
            }
            Self::ExportFailed(failure) => format!("Gagal mengunduh dokumen. Detail: {}", failure),
            Self::Config(msg) => format!("Konfigurasi tidak valid: {}", msg),
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InvalidInput { .. } | Self::Config(_) => false,
            Self::GenerationFailed(GenerationFailure::Auth(_)) => false,
            _ => true,
        }
    }
}

/// Non-fatal findings attached to an adapted document
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterWarning {
    #[error("payload root is {found}, expected an object; rendered an empty document")]
    RootNotObject { found: String },

    #[error("field {field} had an unexpected shape ({found}); default used")]
    UnexpectedShape { field: String, found: String },

    #[error("generator produced {actual} meeting(s), form asked for {expected}")]
    MeetingCountMismatch { expected: u32, actual: u32 },

    #[error("{scope}: activities add up to {actual} minutes, budget is {expected}")]
    TimeAllocationMismatch {
        scope: String,
        expected: u32,
        actual: u32,
    },

    #[error("unknown schema version {found:?}, adapted as {expected}")]
    UnknownSchemaVersion { found: String, expected: String },
}

/// Maximum characters of raw payload kept in logs and error messages
pub const EXCERPT_CHARS: usize = 400;

/// Char-boundary safe prefix of `raw`, with an ellipsis when cut.
pub fn excerpt(raw: &str, max_chars: usize) -> String {
    let mut out: String = raw.chars().take(max_chars).collect();
    if raw.chars().count() > max_chars {
        out.push('…');
    }
    out
}
