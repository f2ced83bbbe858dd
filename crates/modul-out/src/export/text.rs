//! Plain-text flattening for clipboard copy.
//!
//! Only visible text is kept: the letterhead region is skipped, table cells
//! are tab separated and the signature columns are laid side by side.

use crate::view::{spans_text, Block, Cell, RenderedView, Row};
use modul_core::document::SignatureParty;

pub fn to_plain_text(view: &RenderedView) -> String {
    let mut out: Vec<String> = Vec::new();
    for block in &view.blocks {
        match block {
            Block::HeaderImage | Block::PageBreak => continue,
            Block::Title { text, subtitle } => {
                out.push(text.clone());
                if let Some(subtitle) = subtitle {
                    out.push(subtitle.clone());
                }
            }
            Block::Heading { text, .. } => out.push(text.clone()),
            Block::Paragraph { spans } => out.push(spans_text(spans)),
            Block::List { ordered, items } => {
                for (i, item) in items.iter().enumerate() {
                    let marker = if *ordered {
                        format!("{}.", i + 1)
                    } else {
                        "•".to_string()
                    };
                    out.push(format!("{} {}", marker, spans_text(item)));
                }
            }
            Block::Table(table) => {
                for row in table.header.iter().chain(table.rows.iter()) {
                    out.push(row_text(row));
                }
            }
            Block::Signature(signature) => {
                let left = party_lines(&signature.left);
                let right = party_lines(&signature.right);
                for i in 0..left.len().max(right.len()) {
                    let l = left.get(i).map(String::as_str).unwrap_or("");
                    let r = right.get(i).map(String::as_str).unwrap_or("");
                    out.push(format!("{}\t{}", l, r).trim_end().to_string());
                }
            }
        }
        out.push(String::new());
    }

    let mut text = out.join("\n").trim_end().to_string();
    text.push('\n');
    text
}

fn row_text(row: &Row) -> String {
    row.cells
        .iter()
        .map(cell_text)
        .collect::<Vec<_>>()
        .join("\t")
}

/// Cell lines on one line, so rows stay one line each
fn cell_text(cell: &Cell) -> String {
    cell.lines
        .iter()
        .map(|l| l.plain_text())
        .collect::<Vec<_>>()
        .join(" ")
}

fn party_lines(party: &SignatureParty) -> Vec<String> {
    let mut lines = party.heading.clone();
    lines.push(String::new());
    lines.push(party.name.clone());
    if let Some(id) = &party.id_line {
        lines.push(id.clone());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Table, TableClass};
    use modul_core::document::Signature;
    use modul_core::DocumentVariant;

    fn view(blocks: Vec<Block>) -> RenderedView {
        RenderedView {
            variant: DocumentVariant::DeepLearning,
            subject: "Matematika".into(),
            blocks,
        }
    }

    #[test]
    fn test_header_region_is_excluded() {
        let text = to_plain_text(&view(vec![Block::HeaderImage, Block::paragraph("Isi")]));
        assert_eq!(text, "Isi\n");
    }

    #[test]
    fn test_table_rows_are_tab_separated() {
        let mut table =
            Table::new(TableClass::Content, vec![1, 1]).with_header(["Tahap", "Kegiatan"]);
        table.push(Row::new(vec![
            Cell::strong("Awal"),
            Cell::numbered(&["Salam".into(), "Doa".into()]),
        ]));
        let text = to_plain_text(&view(vec![Block::Table(table)]));
        assert_eq!(text, "Tahap\tKegiatan\nAwal\t1. Salam 2. Doa\n");
    }

    #[test]
    fn test_signature_columns() {
        let signature = Signature {
            left: SignatureParty {
                heading: vec!["Mengetahui,".into(), "Kepala Sekolah".into()],
                name: "Pujiono".into(),
                id_line: Some("NIP. .....".into()),
            },
            right: SignatureParty {
                heading: vec!["Wates, 16 Oktober 2026".into(), "Guru Mata Pelajaran".into()],
                name: "Budi".into(),
                id_line: None,
            },
        };
        let text = to_plain_text(&view(vec![Block::Signature(signature)]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Mengetahui,\tWates, 16 Oktober 2026");
        assert_eq!(lines[3], "Pujiono\tBudi");
        assert_eq!(lines[4], "NIP. .....");
    }
}
