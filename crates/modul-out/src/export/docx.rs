//! DOCX packaging: the Word page travels as an MHT alternative-format chunk.
//!
//! Word imports `afchunk.mht` on open and converts it to native content, so
//! the package only needs the minimal parts that reference the chunk.

use super::html::{render_page, ImageSource};
use crate::image::HeaderImage;
use crate::view::RenderedView;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use modul_core::{ExportFailure, ExportSettings, ModulError};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const BOUNDARY: &str = "----=mhtDocumentPart";
const HTML_LOCATION: &str = "file:///C:/fake/document.html";
const IMAGE_LOCATION: &str = "file:///C:/fake/image0";
const LINE_LIMIT: usize = 76;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Default Extension="mht" ContentType="message/rfc822"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="htmlChunk" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/aFChunk" Target="/afchunk.mht"/>
</Relationships>"#;

/// A4 portrait, margins in twentieths of a point
fn document_xml(margin_mm: f32) -> String {
    let margin = (margin_mm / 25.4 * 1440.0).round() as u32;
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<w:body>
<w:altChunk r:id="htmlChunk"/>
<w:sectPr>
<w:pgSz w:w="11906" w:h="16838" w:orient="portrait"/>
<w:pgMar w:top="{m}" w:right="{m}" w:bottom="{m}" w:left="{m}" w:header="720" w:footer="720" w:gutter="0"/>
</w:sectPr>
</w:body>
</w:document>"#,
        m = margin
    )
}

pub fn to_docx(
    view: &RenderedView,
    header: Option<&HeaderImage>,
    settings: &ExportSettings,
) -> Result<Vec<u8>, ModulError> {
    let location = header.map(image_location);
    let image = header.zip(location.as_deref());
    let source = image.map(|(image, location)| ImageSource::Location(image, location));
    let html = render_page("word_page", view, source, settings)?;
    let mht = mht_document(&html, image);
    let document = document_xml(settings.pdf_margin_mm);

    package(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("word/document.xml", document.as_bytes()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes()),
        ("afchunk.mht", mht.as_bytes()),
    ])
}

fn image_location(image: &HeaderImage) -> String {
    let extension = image.mime().trim_start_matches("image/");
    format!("{}.{}", IMAGE_LOCATION, extension)
}

/// MIME multipart document: the HTML part, then the letterhead part if any.
fn mht_document(html: &str, image: Option<(&HeaderImage, &str)>) -> String {
    let mut out = String::new();
    out.push_str("MIME-Version: 1.0\r\n");
    out.push_str(&format!(
        "Content-Type: multipart/related; type=\"text/html\"; boundary=\"{}\"\r\n\r\n",
        BOUNDARY
    ));

    out.push_str(&format!("--{}\r\n", BOUNDARY));
    out.push_str("Content-Type: text/html; charset=\"utf-8\"\r\n");
    out.push_str("Content-Transfer-Encoding: quoted-printable\r\n");
    out.push_str(&format!("Content-Location: {}\r\n\r\n", HTML_LOCATION));
    out.push_str(&quoted_printable(html));
    out.push_str("\r\n\r\n");

    if let Some((image, location)) = image {
        out.push_str(&format!("--{}\r\n", BOUNDARY));
        out.push_str(&format!("Content-Type: {}\r\n", image.mime()));
        out.push_str("Content-Transfer-Encoding: base64\r\n");
        out.push_str(&format!("Content-Location: {}\r\n\r\n", location));
        let encoded = STANDARD.encode(image.bytes());
        for chunk in encoded.as_bytes().chunks(LINE_LIMIT) {
            out.push_str(&String::from_utf8_lossy(chunk));
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
    }

    out.push_str(&format!("--{}--\r\n", BOUNDARY));
    out
}

/// Quoted-printable body with soft line breaks.
fn quoted_printable(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut width = 0;
        let bytes = line.as_bytes();
        for (i, &byte) in bytes.iter().enumerate() {
            let trailing_space = (byte == b' ' || byte == b'\t') && i + 1 == bytes.len();
            let literal = (byte == b' ' || byte == b'\t' || (33..=126).contains(&byte))
                && byte != b'='
                && !trailing_space;
            let piece = if literal {
                (byte as char).to_string()
            } else {
                format!("={:02X}", byte)
            };
            if width + piece.len() > LINE_LIMIT - 1 {
                out.push_str("=\r\n");
                width = 0;
            }
            width += piece.len();
            out.push_str(&piece);
        }
        out.push_str("\r\n");
    }
    out
}

fn package(parts: &[(&str, &[u8])]) -> Result<Vec<u8>, ModulError> {
    let mut zout = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, data) in parts {
        zout.start_file(*name, opts).map_err(docx_error)?;
        zout.write_all(data)
            .map_err(|e| ExportFailure::Docx(format!("write {}: {}", name, e)))?;
    }
    let cursor = zout.finish().map_err(docx_error)?;
    Ok(cursor.into_inner())
}

fn docx_error(e: zip::result::ZipError) -> ModulError {
    ExportFailure::Docx(e.to_string()).into()
}
