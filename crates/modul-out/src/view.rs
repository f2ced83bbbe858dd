//! RenderedView: channel-independent block structure of a document
//!
//! The renderer produces blocks; every exporter walks the same blocks, so
//! the PDF, Word, print and clipboard outputs never disagree about what a
//! table contains.

use modul_core::document::Signature;
use modul_core::DocumentVariant;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedView {
    pub variant: DocumentVariant,
    /// Subject as shown in the document, used for file names
    pub subject: String,
    pub blocks: Vec<Block>,
}

impl RenderedView {
    /// Tables in document order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(table) => Some(table),
            _ => None,
        })
    }

    /// Table directly following the heading with `text`
    pub fn table_after(&self, heading: &str) -> Option<&Table> {
        let start = self
            .blocks
            .iter()
            .position(|b| matches!(b, Block::Heading { text, .. } if text == heading))?;
        self.blocks[start + 1..].iter().find_map(|b| match b {
            Block::Table(table) => Some(table),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// Letterhead region; filled by exporters that have an image
    HeaderImage,
    Title { text: String, subtitle: Option<String> },
    Heading { level: u8, text: String },
    Paragraph { spans: Vec<Span> },
    List { ordered: bool, items: Vec<Vec<Span>> },
    Table(Table),
    PageBreak,
    Signature(Signature),
}

impl Block {
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            level,
            text: text.into(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph {
            spans: vec![Span::plain(text)],
        }
    }
}

/// Run of inline text with emphasis flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            italic: false,
        }
    }
}

/// Concatenated text of a span run
pub fn spans_text(spans: &[Span]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

/// Content tables are bordered; layout tables only align label/value pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableClass {
    Content,
    Layout,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub class: TableClass,
    /// Relative column widths; their count is the column count
    pub widths: Vec<u32>,
    pub header: Vec<Row>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new(class: TableClass, widths: Vec<u32>) -> Self {
        Self {
            class,
            widths,
            header: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> usize {
        self.widths.len()
    }

    pub fn with_header<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header
            .push(Row::new(labels.into_iter().map(Cell::strong).collect()));
        self
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

impl Row {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Single cell spanning `columns`
    pub fn spanning(cell: Cell, columns: usize) -> Self {
        Self {
            cells: vec![Cell {
                colspan: columns as u32,
                ..cell
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub lines: Vec<Line>,
    pub colspan: u32,
    pub strong: bool,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            lines: vec![Line::plain(text)],
            colspan: 1,
            strong: false,
        }
    }

    pub fn strong(text: impl Into<String>) -> Self {
        Self {
            strong: true,
            ..Self::text(text)
        }
    }

    pub fn lines(lines: Vec<Line>) -> Self {
        Self {
            lines,
            colspan: 1,
            strong: false,
        }
    }

    /// Numbered list cell; a dash when the list is empty
    pub fn numbered(items: &[String]) -> Self {
        if items.is_empty() {
            return Self::text(modul_core::PLACEHOLDER);
        }
        Self::lines(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| Line::marked(format!("{}.", i + 1), item))
                .collect(),
        )
    }

    /// Bulleted list cell; a dash when the list is empty
    pub fn bulleted(items: &[String]) -> Self {
        if items.is_empty() {
            return Self::text(modul_core::PLACEHOLDER);
        }
        Self::lines(items.iter().map(|item| Line::marked("•", item)).collect())
    }

    pub fn plain_text(&self) -> String {
        self.lines
            .iter()
            .map(Line::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One line inside a cell, optionally led by a list marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    pub marker: Option<String>,
    pub spans: Vec<Span>,
}

impl Line {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            marker: None,
            spans: vec![Span::plain(text)],
        }
    }

    pub fn marked(marker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            marker: Some(marker.into()),
            spans: crate::markdown::inline(&text.into()),
        }
    }

    pub fn plain_text(&self) -> String {
        match &self.marker {
            Some(marker) => format!("{} {}", marker, spans_text(&self.spans)),
            None => spans_text(&self.spans),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_cell() {
        let cell = Cell::numbered(&["Satu".into(), "Dua".into()]);
        assert_eq!(cell.plain_text(), "1. Satu\n2. Dua");
        assert_eq!(Cell::numbered(&[]).plain_text(), "-");
    }

    #[test]
    fn test_spanning_row() {
        let row = Row::spanning(Cell::strong("Pertemuan 1"), 4);
        assert_eq!(row.cells.len(), 1);
        assert_eq!(row.cells[0].colspan, 4);
        assert!(row.cells[0].strong);
    }

    #[test]
    fn test_block_serializes_with_kind() {
        let value = serde_json::to_value(Block::heading(2, "A. INFORMASI UMUM")).unwrap();
        assert_eq!(value["kind"], "heading");
        assert_eq!(value["level"], 2);

        let table = Table::new(TableClass::Layout, vec![1, 2]);
        let value = serde_json::to_value(Block::Table(table)).unwrap();
        assert_eq!(value["kind"], "table");
        assert_eq!(value["class"], "layout");
    }
}
