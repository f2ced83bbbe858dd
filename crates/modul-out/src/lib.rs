//! Modul-OUT: DocumentModel to screen, paper and clipboard
//!
//! - [`render`]: pure mapping of an adapted document into [`RenderedView`] blocks
//! - [`markdown`]: Markdown-lite parser for appendix sections and legacy bodies
//! - [`export`]: PDF, DOCX, print HTML and plain-text exporters over one view
//! - [`image`]: letterhead decoding and aspect-preserving sizing
//!
//! # Example
//!
//! ```ignore
//! use modul_out::{export, render, ExportFormat};
//!
//! let view = render(&adapted.model);
//! let pdf = export(&view, ExportFormat::Pdf, header.as_ref(), &config.export)?;
//! std::fs::write(&pdf.file_name, &pdf.bytes)?;
//! ```

pub mod export;
pub mod image;
pub mod markdown;
pub mod render;
pub mod view;

pub use export::{
    export, file_name, to_docx, to_pdf, to_plain_text, to_print_html, to_word_html,
    ExportArtifact, ExportFormat,
};
pub use image::HeaderImage;
pub use render::{render, EMPTY_RUBRIC_ROWS};
pub use view::{Block, Cell, Line, RenderedView, Row, Span, Table, TableClass};
