use super::text_blocks;
use crate::view::Block;
use modul_core::document::LegacyDocument;

/// The narrative body already carries its own title, tables and signature lines.
pub(super) fn blocks(doc: &LegacyDocument) -> Vec<Block> {
    let mut blocks = vec![Block::HeaderImage];
    blocks.extend(text_blocks(&doc.body));
    blocks
}
