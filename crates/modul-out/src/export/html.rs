//! HTML exporters: standalone print page and the Word-conversion page.
//!
//! The Word page cannot rely on a stylesheet, so every element carries
//! inline styles and content tables get explicit `border`/`cellpadding`
//! attributes. Layout tables are forced borderless.

use crate::image::HeaderImage;
use crate::view::{RenderedView, TableClass};
use modul_core::{EscapeMode, ExportSettings, ModulError, TemplateRenderer};
use once_cell::sync::Lazy;
use serde_json::{json, Value};

static EXPORT_TEMPLATES: Lazy<Result<TemplateRenderer, String>> = Lazy::new(|| {
    TemplateRenderer::from_yaml(include_str!("../../templates/export.yaml"), EscapeMode::Html)
});

const CONTENT_CELL_STYLE: &str = "border:1px solid #000;padding:5px;vertical-align:top;";
const LAYOUT_CELL_STYLE: &str = "border:none;padding:2px 4px;vertical-align:top;";

/// Where the page's `<img>` points
pub(crate) enum ImageSource<'a> {
    DataUri(&'a HeaderImage),
    /// Part location inside an MHT package
    Location(&'a HeaderImage, &'a str),
}

/// Complete print page with the export stylesheet.
pub fn to_print_html(
    view: &RenderedView,
    header: Option<&HeaderImage>,
    settings: &ExportSettings,
) -> Result<String, ModulError> {
    let source = header.map(ImageSource::DataUri);
    render_page("print_page", view, source, settings)
}

/// Self-contained page with inline styles, as handed to the Word converter.
pub fn to_word_html(
    view: &RenderedView,
    header: Option<&HeaderImage>,
    settings: &ExportSettings,
) -> Result<String, ModulError> {
    let source = header.map(ImageSource::DataUri);
    render_page("word_page", view, source, settings)
}

pub(crate) fn render_page(
    template: &str,
    view: &RenderedView,
    header: Option<ImageSource<'_>>,
    settings: &ExportSettings,
) -> Result<String, ModulError> {
    let renderer = EXPORT_TEMPLATES.as_ref().map_err(|e| ModulError::Config(e.clone()))?;
    let data = page_data(view, header, settings)?;
    renderer.render(template, &data).map_err(ModulError::Config)
}

fn page_data(
    view: &RenderedView,
    header: Option<ImageSource<'_>>,
    settings: &ExportSettings,
) -> Result<Value, ModulError> {
    let mut blocks = serde_json::to_value(&view.blocks)
        .map_err(|e| ModulError::Config(format!("view does not serialize: {}", e)))?;
    if let Some(blocks) = blocks.as_array_mut() {
        for block in blocks.iter_mut().filter(|b| b["kind"] == "table") {
            decorate_table(block);
        }
    }

    let header = header.map(|source| {
        let (image, src) = match source {
            ImageSource::DataUri(image) => (image, image.data_uri()),
            ImageSource::Location(image, location) => (image, location.to_string()),
        };
        let (width, height) = image.display_size(settings.docx_header_width_px);
        json!({ "src": src, "width": width, "height": height })
    });

    Ok(json!({
        "title": page_title(view),
        "header": header,
        "blocks": blocks,
        "margin_mm": settings.pdf_margin_mm,
        "font_pt": settings.base_font_pt + 1.0,
    }))
}

/// Adds column percentages and the per-class inline cell style.
fn decorate_table(block: &mut Value) {
    let widths: Vec<u64> = block["widths"]
        .as_array()
        .map(|w| w.iter().filter_map(Value::as_u64).collect())
        .unwrap_or_default();
    let class = if block["class"] == "content" {
        TableClass::Content
    } else {
        TableClass::Layout
    };
    let style = match class {
        TableClass::Content => CONTENT_CELL_STYLE,
        TableClass::Layout => LAYOUT_CELL_STYLE,
    };
    block["percent"] = json!(percentages(&widths));
    block["cell_style"] = json!(style);
}

/// Relative widths as whole percentages summing to 100
fn percentages(widths: &[u64]) -> Vec<u64> {
    let total: u64 = widths.iter().sum();
    if total == 0 {
        return Vec::new();
    }
    let mut out: Vec<u64> = widths.iter().map(|w| w * 100 / total).collect();
    let assigned: u64 = out.iter().sum();
    if let Some(last) = out.last_mut() {
        *last += 100 - assigned;
    }
    out
}

fn page_title(view: &RenderedView) -> String {
    if view.subject.trim().is_empty() || view.subject == modul_core::PLACEHOLDER {
        "Modul Ajar".to_string()
    } else {
        format!("Modul Ajar - {}", view.subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Block, Cell, Row, Table};
    use modul_core::DocumentVariant;

    fn view(blocks: Vec<Block>) -> RenderedView {
        RenderedView {
            variant: DocumentVariant::StandardModule,
            subject: "Matematika".into(),
            blocks,
        }
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        assert_eq!(percentages(&[1, 1, 1]), vec![33, 33, 34]);
        assert_eq!(percentages(&[30, 70]), vec![30, 70]);
        assert!(percentages(&[]).is_empty());
    }

    #[test]
    fn test_word_tables_have_explicit_borders() {
        let mut content = Table::new(TableClass::Content, vec![1, 1]);
        content.push(Row::new(vec![Cell::text("a"), Cell::text("b")]));
        let mut layout = Table::new(TableClass::Layout, vec![1, 1]);
        layout.push(Row::new(vec![Cell::text("c"), Cell::text("d")]));

        let html = to_word_html(
            &view(vec![Block::Table(content), Block::Table(layout)]),
            None,
            &ExportSettings::default(),
        )
        .unwrap();

        assert!(html.contains(r#"class="content" border="1" cellspacing="0" cellpadding="5""#));
        assert!(html.contains(r#"class="layout" border="0""#));
        assert!(html.contains(CONTENT_CELL_STYLE));
        assert!(html.contains(LAYOUT_CELL_STYLE));
        assert!(!html.contains("<style>"));
    }

    #[test]
    fn test_text_is_escaped_and_marked_up() {
        let blocks = vec![
            Block::Paragraph {
                spans: crate::markdown::inline("a < b dan **tebal**"),
            },
            Block::List {
                ordered: true,
                items: vec![crate::markdown::inline("satu")],
            },
        ];
        let html = to_print_html(&view(blocks), None, &ExportSettings::default()).unwrap();
        assert!(html.contains("a &lt; b dan <strong>tebal</strong>"));
        assert!(html.contains("<ol"));
        assert!(html.contains("<li>satu</li>"));
        assert!(html.contains("<title>Modul Ajar - Matematika</title>"));
    }

    #[test]
    fn test_header_image_only_when_present() {
        let blocks = vec![Block::HeaderImage, Block::paragraph("isi")];
        let html = to_print_html(&view(blocks), None, &ExportSettings::default()).unwrap();
        assert!(!html.contains("<img"));
    }
}
