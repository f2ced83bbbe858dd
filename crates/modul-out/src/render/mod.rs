//! Document Renderer: DocumentModel → RenderedView
//!
//! Pure mapping. Row counts and column spans come from the model's list
//! lengths, never from fixed layouts.

mod deep_learning;
mod legacy;
mod standard;

use crate::markdown;
use crate::view::{Block, Cell, Line, RenderedView, Row, Table, TableClass};
use modul_core::document::{Appendix, ProfileDimensions, Rubric};
use modul_core::{DocumentModel, PLACEHOLDER};

/// Placeholder rows printed when the rubric has no indicators
pub const EMPTY_RUBRIC_ROWS: usize = 3;

pub fn render(model: &DocumentModel) -> RenderedView {
    let blocks = match model {
        DocumentModel::Legacy(doc) => legacy::blocks(doc),
        DocumentModel::DeepLearning(doc) => deep_learning::blocks(doc),
        DocumentModel::StandardModule(doc) => standard::blocks(doc),
    };
    RenderedView {
        variant: model.variant(),
        subject: model.subject().to_string(),
        blocks,
    }
}

// ============================================================================
// Shared section builders
// ============================================================================

/// "Label : value" rows in a borderless layout table
pub(crate) fn identity_table(rows: &[(&str, &str)]) -> Table {
    let mut table = Table::new(TableClass::Layout, vec![30, 3, 67]);
    for &(label, value) in rows {
        table.push(Row::new(vec![
            Cell::text(label),
            Cell::text(":"),
            Cell::text(value),
        ]));
    }
    table
}

/// Two-column bordered table of label and Markdown-lite value
pub(crate) fn field_table(rows: &[(&str, &str)]) -> Table {
    let mut table = Table::new(TableClass::Content, vec![30, 70]);
    for &(label, value) in rows {
        table.push(Row::new(vec![
            Cell::strong(label),
            Cell::lines(markdown::cell_lines(value)),
        ]));
    }
    table
}

/// Listed dimensions render as a bullet list, described ones as a table.
pub(crate) fn profile_blocks(profile: &ProfileDimensions) -> Vec<Block> {
    match profile {
        ProfileDimensions::Listed(names) if names.is_empty() => vec![Block::paragraph(PLACEHOLDER)],
        ProfileDimensions::Listed(names) => vec![Block::List {
            ordered: false,
            items: names.iter().map(|n| markdown::inline(n)).collect(),
        }],
        ProfileDimensions::Described(records) => {
            let mut table =
                Table::new(TableClass::Content, vec![30, 70]).with_header(["Dimensi", "Deskripsi"]);
            for record in records {
                table.push(Row::new(vec![
                    Cell::strong(record.dimension.as_str()),
                    Cell::lines(markdown::cell_lines(&record.description)),
                ]));
            }
            vec![Block::Table(table)]
        }
    }
}

pub(crate) fn rubric_blocks(rubric: &Rubric, heading: &str) -> Vec<Block> {
    let mut blocks = vec![Block::heading(2, heading)];
    if rubric.title != PLACEHOLDER {
        blocks.push(Block::heading(3, rubric.title.as_str()));
    }
    blocks.push(Block::Paragraph {
        spans: markdown::inline(&format!("**Tujuan:** {}", rubric.goal)),
    });

    let mut table = Table::new(TableClass::Content, vec![24, 19, 19, 19, 19]).with_header([
        "Aspek",
        "Baru Berkembang",
        "Layak",
        "Cakap",
        "Mahir",
    ]);
    if rubric.indicators.is_empty() {
        for _ in 0..EMPTY_RUBRIC_ROWS {
            table.push(Row::new(vec![Cell::text(""); 5]));
        }
    }
    for indicator in &rubric.indicators {
        table.push(Row::new(vec![
            Cell::strong(indicator.aspect.as_str()),
            Cell::text(indicator.beginning.as_str()),
            Cell::text(indicator.developing.as_str()),
            Cell::text(indicator.proficient.as_str()),
            Cell::text(indicator.advanced.as_str()),
        ]));
    }
    blocks.push(Block::Table(table));

    if !rubric.notes.is_empty() {
        blocks.push(Block::Paragraph {
            spans: markdown::inline("**Keterangan:**"),
        });
        blocks.push(Block::List {
            ordered: false,
            items: rubric.notes.iter().map(|n| markdown::inline(n)).collect(),
        });
    }
    blocks
}

pub(crate) fn appendix_blocks(appendix: &Appendix, heading: &str) -> Vec<Block> {
    let mut blocks = vec![Block::PageBreak, Block::heading(2, heading)];
    for (title, body) in appendix.sections() {
        blocks.push(Block::heading(3, title));
        let parsed = markdown::parse(body);
        if parsed.is_empty() {
            blocks.push(Block::paragraph(PLACEHOLDER));
        } else {
            blocks.extend(parsed);
        }
    }
    blocks
}

/// Markdown-lite text as blocks, a dash when it parses to nothing
pub(crate) fn text_blocks(text: &str) -> Vec<Block> {
    let parsed = markdown::parse(text);
    if parsed.is_empty() {
        vec![Block::paragraph(PLACEHOLDER)]
    } else {
        parsed
    }
}

pub(crate) fn duration_cell(duration: &str) -> Cell {
    Cell::lines(vec![Line::plain(duration)])
}
