//! Render and export over adapted fixtures.

use chrono::NaiveDate;
use modul_core::document::{DeepLearningModule, Rubric, RubricIndicator};
use modul_core::{DocumentModel, DocumentVariant, ExportSettings, Payload, TimeBudget};
use modul_out::{
    export, render, to_docx, to_pdf, to_plain_text, to_word_html, Block, ExportFormat,
    HeaderImage, RenderedView, TableClass, EMPTY_RUBRIC_ROWS,
};
use modul_schema::{adapt, AdaptContext};
use std::io::{Cursor, Read};

fn fixtures_dir() -> std::path::PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap();
    std::path::Path::new(&manifest_dir).join("../../testing/fixtures")
}

fn payload(name: &str) -> Payload {
    let text = std::fs::read_to_string(fixtures_dir().join("payloads").join(name)).unwrap();
    Payload::Json(serde_json::from_str(&text).unwrap())
}

fn letterhead() -> HeaderImage {
    let bytes = std::fs::read(fixtures_dir().join("images/letterhead.png")).unwrap();
    HeaderImage::decode(bytes).unwrap()
}

fn ctx() -> AdaptContext {
    AdaptContext::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()).with_budget(TimeBudget {
        meetings: 2,
        hours_per_meeting: 2,
        minutes_per_hour: 45,
    })
}

fn view_of(name: &str, variant: DocumentVariant) -> RenderedView {
    render(&adapt(&payload(name), variant, &ctx()).model)
}

fn rubric_rows(view: &RenderedView) -> usize {
    view.tables()
        .find(|t| t.columns() == 5)
        .map(|t| t.rows.len())
        .unwrap()
}

// ============================================================================
// Renderer
// ============================================================================

#[test]
fn test_deep_learning_profile_table_follows_dimensions() {
    let view = view_of("deep_learning_budi.json", DocumentVariant::DeepLearning);
    let profile = view.table_after("Dimensi Profil Lulusan").unwrap();
    assert_eq!(profile.rows.len(), 2);
    assert_eq!(profile.columns(), 2);
    assert_eq!(profile.rows[0].cells[0].plain_text(), "Kreativitas");
}

#[test]
fn test_rubric_rows_follow_indicator_count() {
    let view = view_of("deep_learning_budi.json", DocumentVariant::DeepLearning);
    assert_eq!(rubric_rows(&view), 2);

    let empty = render(&DocumentModel::DeepLearning(DeepLearningModule::default()));
    assert_eq!(rubric_rows(&empty), EMPTY_RUBRIC_ROWS);

    let seven = DeepLearningModule {
        rubric: Rubric {
            indicators: vec![RubricIndicator::default(); 7],
            ..Default::default()
        },
        ..Default::default()
    };
    assert_eq!(rubric_rows(&render(&DocumentModel::DeepLearning(seven))), 7);
}

#[test]
fn test_standard_fixture_renders_every_section() {
    let view = view_of("standard_budi.json", DocumentVariant::StandardModule);
    let needs = view.table_after("D. Pemetaan Kebutuhan Belajar").unwrap();
    assert_eq!(needs.rows.len(), 1);

    let identity = view.table_after("A. Identitas Modul").unwrap();
    assert_eq!(identity.class, TableClass::Layout);
    assert_eq!(identity.rows.len(), 9);

    assert!(matches!(view.blocks.last(), Some(Block::Signature(_))));
}

#[test]
fn test_every_variant_renders_from_empty_payload() {
    for variant in DocumentVariant::ALL {
        let adapted = adapt(&Payload::Json(serde_json::json!({})), variant, &ctx());
        let view = render(&adapted.model);
        assert!(matches!(view.blocks[0], Block::HeaderImage));
        let text = to_plain_text(&view);
        assert!(!text.trim().is_empty());
    }
}

// ============================================================================
// Exporters
// ============================================================================

#[test]
fn test_plain_text_is_idempotent() {
    let view = view_of("deep_learning_budi.json", DocumentVariant::DeepLearning);
    let first = to_plain_text(&view);
    let second = to_plain_text(&render(
        &adapt(&payload("deep_learning_budi.json"), DocumentVariant::DeepLearning, &ctx()).model,
    ));
    assert_eq!(first, second);
    assert!(first.contains("MODUL AJAR DEEP LEARNING"));
    assert!(!first.contains("Kop Surat"));
}

#[test]
fn test_pdf_with_and_without_letterhead() {
    let view = view_of("deep_learning_budi.json", DocumentVariant::DeepLearning);
    let settings = ExportSettings::default();

    let plain = to_pdf(&view, None, &settings).unwrap();
    assert!(plain.starts_with(b"%PDF"));

    let with_image = to_pdf(&view, Some(&letterhead()), &settings).unwrap();
    assert!(with_image.starts_with(b"%PDF"));
    assert!(with_image.len() > plain.len());
}

#[test]
fn test_docx_package_carries_html_chunk() {
    let view = view_of("standard_budi.json", DocumentVariant::StandardModule);
    let bytes = to_docx(&view, Some(&letterhead()), &ExportSettings::default()).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    for part in [
        "[Content_Types].xml",
        "_rels/.rels",
        "word/document.xml",
        "word/_rels/document.xml.rels",
    ] {
        assert!(archive.by_name(part).is_ok(), "missing {}", part);
    }

    let mut document = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut document)
        .unwrap();
    assert!(document.contains(r#"<w:altChunk r:id="htmlChunk"/>"#));

    let mut mht = String::new();
    archive
        .by_name("afchunk.mht")
        .unwrap()
        .read_to_string(&mut mht)
        .unwrap();
    assert!(mht.contains("Content-Type: multipart/related"));
    assert!(mht.contains("Content-Location: file:///C:/fake/image0.png"));
    assert!(mht.replace("=\r\n", "").contains("border=3D\"1\""));
}

#[test]
fn test_word_html_sizes_letterhead_by_aspect_ratio() {
    let view = view_of("deep_learning_budi.json", DocumentVariant::DeepLearning);
    let html = to_word_html(&view, Some(&letterhead()), &ExportSettings::default()).unwrap();
    // 8x2 fixture at 650px wide
    assert!(html.contains(r#"width="650" height="163""#));
    assert!(html.contains("src=\"data:image/png;base64,"));
    assert!(html.contains(r#"class="layout" border="0""#));
    assert!(html.contains(r#"class="content" border="1""#));
}

#[test]
fn test_export_artifact_metadata() {
    let view = view_of("deep_learning_budi.json", DocumentVariant::DeepLearning);
    let settings = ExportSettings::default();
    for format in ExportFormat::ALL {
        let artifact = export(&view, format, None, &settings).unwrap();
        assert_eq!(artifact.mime, format.mime());
        assert!(artifact.file_name.starts_with("modul-ajar-Matematika."));
        assert!(!artifact.bytes.is_empty());
    }
}
