//! Export Engine: RenderedView → PDF, DOCX, print HTML or plain text
//!
//! Every exporter reads the same view and never mutates it, so a failed
//! export can be retried without regenerating content.

mod docx;
mod html;
mod pdf;
mod text;

pub use docx::to_docx;
pub use html::{to_print_html, to_word_html};
pub use pdf::to_pdf;
pub use text::to_plain_text;

use crate::image::HeaderImage;
use crate::view::RenderedView;
use lazy_static::lazy_static;
use modul_core::{DocumentVariant, ExportSettings, ModulError, PLACEHOLDER};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::info;

lazy_static! {
    static ref UNSAFE_FILE_CHARS: Regex = Regex::new(r#"[\\/:*?"<>|\x00-\x1f]+"#).unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
    Html,
    Text,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [Self::Pdf, Self::Docx, Self::Html, Self::Text];

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Self::Html => "text/html; charset=utf-8",
            Self::Text => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Html => "html",
            Self::Text => "txt",
        }
    }

    /// Whether the format embeds the letterhead
    pub fn uses_header_image(&self) -> bool {
        !matches!(self, Self::Text)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ModulError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" | "word" | "doc" => Ok(Self::Docx),
            "html" | "print" => Ok(Self::Html),
            "text" | "txt" | "clipboard" => Ok(Self::Text),
            other => Err(ModulError::invalid_input(
                "format",
                format!("unknown export format {:?}", other),
            )),
        }
    }
}

/// Exported bytes with their download metadata
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub format: ExportFormat,
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

/// Produce one export of the view.
pub fn export(
    view: &RenderedView,
    format: ExportFormat,
    header: Option<&HeaderImage>,
    settings: &ExportSettings,
) -> Result<ExportArtifact, ModulError> {
    let bytes = match format {
        ExportFormat::Pdf => to_pdf(view, header, settings)?,
        ExportFormat::Docx => to_docx(view, header, settings)?,
        ExportFormat::Html => to_print_html(view, header, settings)?.into_bytes(),
        ExportFormat::Text => to_plain_text(view).into_bytes(),
    };
    let artifact = ExportArtifact {
        format,
        file_name: file_name(view, format),
        mime: format.mime(),
        bytes,
    };
    info!(
        format = %format,
        file = %artifact.file_name,
        bytes = artifact.bytes.len(),
        header_image = header.is_some(),
        "export produced"
    );
    Ok(artifact)
}

/// Download name derived from the subject, with a per-variant fallback.
pub fn file_name(view: &RenderedView, format: ExportFormat) -> String {
    let subject = WHITESPACE
        .replace_all(UNSAFE_FILE_CHARS.replace_all(view.subject.trim(), " ").trim(), " ")
        .to_string();
    let known = !subject.is_empty() && subject != PLACEHOLDER;

    let stem = match view.variant {
        DocumentVariant::StandardModule => {
            let part = if known { subject.replace(' ', "_") } else { "Mapel".to_string() };
            format!("Modul_Ajar_Standar_{}", part)
        }
        DocumentVariant::Legacy | DocumentVariant::DeepLearning => {
            let part = if known {
                subject.replace(' ', "-")
            } else {
                "deep-learning".to_string()
            };
            format!("modul-ajar-{}", part)
        }
    };
    format!("{}.{}", stem, format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(variant: DocumentVariant, subject: &str) -> RenderedView {
        RenderedView {
            variant,
            subject: subject.to_string(),
            blocks: Vec::new(),
        }
    }

    #[test]
    fn test_file_names() {
        let dl = view(DocumentVariant::DeepLearning, "Matematika");
        assert_eq!(file_name(&dl, ExportFormat::Pdf), "modul-ajar-Matematika.pdf");

        let standard = view(DocumentVariant::StandardModule, "Bahasa Indonesia");
        assert_eq!(
            file_name(&standard, ExportFormat::Docx),
            "Modul_Ajar_Standar_Bahasa_Indonesia.docx"
        );
    }

    #[test]
    fn test_file_name_fallbacks() {
        let dl = view(DocumentVariant::DeepLearning, "-");
        assert_eq!(file_name(&dl, ExportFormat::Docx), "modul-ajar-deep-learning.docx");

        let standard = view(DocumentVariant::StandardModule, "  ");
        assert_eq!(file_name(&standard, ExportFormat::Pdf), "Modul_Ajar_Standar_Mapel.pdf");

        let odd = view(DocumentVariant::Legacy, "IPA / Fisika: Gerak");
        assert_eq!(file_name(&odd, ExportFormat::Text), "modul-ajar-IPA-Fisika-Gerak.txt");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PDF".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert_eq!("word".parse::<ExportFormat>().unwrap(), ExportFormat::Docx);
        assert!("odt".parse::<ExportFormat>().is_err());
        assert!(!ExportFormat::Text.uses_header_image());
    }
}
