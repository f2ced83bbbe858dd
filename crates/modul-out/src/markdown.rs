//! Markdown-lite block parser.
//!
//! The generator writes appendix sections and the whole legacy document in
//! a small Markdown subset: `#` headings, paragraphs, `-`/`*` bullets,
//! numbered items, pipe tables, and `**bold**`/`*italic*` inline emphasis.
//! Anything else is kept as paragraph text. Numbers on ordered items are
//! dropped here and re-applied by the exporters.

use crate::view::{Block, Cell, Line, Row, Span, Table, TableClass};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HEADING: Regex = Regex::new(r"^(#{1,6})\s+(.+?)\s*#*$").unwrap();
    static ref BULLET: Regex = Regex::new(r"^[-*•+]\s+(.+)$").unwrap();
    static ref NUMBERED: Regex = Regex::new(r"^\d{1,3}[.)]\s+(.+)$").unwrap();
    static ref TABLE_RULE: Regex =
        Regex::new(r"^\|?\s*:?-{3,}:?\s*(?:\|\s*:?-{3,}:?\s*)*\|?$").unwrap();
    static ref RULE: Regex = Regex::new(r"^(?:-{3,}|\*{3,}|_{3,})$").unwrap();
    static ref EMPHASIS: Regex = Regex::new(r"\*\*(.+?)\*\*|__(.+?)__|\*([^*\s][^*]*?)\*").unwrap();
}

/// Parse Markdown-lite text into blocks.
pub fn parse(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut list: Option<(bool, Vec<Vec<Span>>)> = None;
    let mut table: Vec<&str> = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();

        if line.starts_with('|') {
            flush_paragraph(&mut paragraph, &mut blocks);
            flush_list(&mut list, &mut blocks);
            table.push(line);
            continue;
        }
        flush_table(&mut table, &mut blocks);

        if line.is_empty() || line.starts_with("```") || RULE.is_match(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            flush_list(&mut list, &mut blocks);
            continue;
        }

        if let Some(caps) = HEADING.captures(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            flush_list(&mut list, &mut blocks);
            let level = caps[1].len().min(3) as u8;
            blocks.push(Block::heading(level, strip_emphasis(&caps[2])));
            continue;
        }

        let item = NUMBERED
            .captures(line)
            .map(|c| (true, c[1].to_string()))
            .or_else(|| BULLET.captures(line).map(|c| (false, c[1].to_string())));
        if let Some((ordered, content)) = item {
            flush_paragraph(&mut paragraph, &mut blocks);
            if !matches!(&list, Some((kind, _)) if *kind == ordered) {
                flush_list(&mut list, &mut blocks);
                list = Some((ordered, Vec::new()));
            }
            if let Some((_, items)) = &mut list {
                items.push(inline(&content));
            }
            continue;
        }

        flush_list(&mut list, &mut blocks);
        paragraph.push(line);
    }

    flush_table(&mut table, &mut blocks);
    flush_paragraph(&mut paragraph, &mut blocks);
    flush_list(&mut list, &mut blocks);
    blocks
}

/// Inline emphasis spans of one line.
pub fn inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut last = 0;
    for caps in EMPHASIS.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            spans.push(Span::plain(&text[last..whole.start()]));
        }
        if let Some(bold) = caps.get(1).or_else(|| caps.get(2)) {
            spans.push(Span::bold(bold.as_str()));
        } else if let Some(italic) = caps.get(3) {
            spans.push(Span {
                text: italic.as_str().to_string(),
                bold: false,
                italic: true,
            });
        }
        last = whole.end();
    }
    if last < text.len() || spans.is_empty() {
        spans.push(Span::plain(&text[last..]));
    }
    spans
}

/// Markdown-lite text as cell lines: list items keep a marker, emphasis is kept.
pub fn cell_lines(text: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    for block in parse(text) {
        match block {
            Block::Paragraph { spans } => lines.push(Line { marker: None, spans }),
            Block::Heading { text, .. } => lines.push(Line {
                marker: None,
                spans: vec![Span::bold(text)],
            }),
            Block::List { ordered, items } => {
                for (i, spans) in items.into_iter().enumerate() {
                    let marker = if ordered { format!("{}.", i + 1) } else { "•".to_string() };
                    lines.push(Line {
                        marker: Some(marker),
                        spans,
                    });
                }
            }
            Block::Table(table) => {
                for row in table.header.iter().chain(table.rows.iter()) {
                    let text: Vec<String> = row.cells.iter().map(Cell::plain_text).collect();
                    lines.push(Line::plain(text.join(" | ")));
                }
            }
            _ => {}
        }
    }
    if lines.is_empty() {
        lines.push(Line::plain(modul_core::PLACEHOLDER));
    }
    lines
}

fn strip_emphasis(text: &str) -> String {
    crate::view::spans_text(&inline(text))
}

fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if paragraph.is_empty() {
        return;
    }
    let joined = paragraph.join(" ");
    blocks.push(Block::Paragraph {
        spans: inline(&joined),
    });
    paragraph.clear();
}

fn flush_list(list: &mut Option<(bool, Vec<Vec<Span>>)>, blocks: &mut Vec<Block>) {
    if let Some((ordered, items)) = list.take() {
        blocks.push(Block::List { ordered, items });
    }
}

fn flush_table(lines: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if lines.is_empty() {
        return;
    }
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut has_header = false;
    for (i, line) in lines.iter().enumerate() {
        if TABLE_RULE.is_match(line) {
            has_header |= i == 1;
            continue;
        }
        let cells = line
            .trim_matches('|')
            .split('|')
            .map(|c| c.trim().to_string())
            .collect();
        rows.push(cells);
    }
    lines.clear();

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return;
    }

    let mut table = Table::new(TableClass::Content, vec![1; columns]);
    for (i, cells) in rows.into_iter().enumerate() {
        let mut cells: Vec<Cell> = cells
            .into_iter()
            .map(|text| {
                let mut cell = Cell::lines(vec![Line {
                    marker: None,
                    spans: inline(&text),
                }]);
                cell.strong = has_header && i == 0;
                cell
            })
            .collect();
        cells.resize_with(columns, || Cell::text(""));
        if has_header && i == 0 {
            table.header.push(Row::new(cells));
        } else {
            table.push(Row::new(cells));
        }
    }
    blocks.push(Block::Table(table));
}
