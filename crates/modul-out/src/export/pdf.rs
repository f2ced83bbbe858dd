//! PDF writer: A4 portrait, millimetre units, fixed margins.
//!
//! Text uses the built-in Times faces, so no font files are shipped. Widths
//! are estimated from the glyph count, which is close enough for wrapping
//! Indonesian prose in table cells. The whole document is built and
//! serialized synchronously.

use crate::image::HeaderImage;
use crate::view::{Block, Cell, Line as CellLine, RenderedView, Row, Span, Table, TableClass};
use modul_core::document::SignatureParty;
use modul_core::{ExportFailure, ExportSettings, ModulError};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point,
};
use tracing::debug;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const PT_TO_MM: f32 = 0.3528;
/// Average glyph advance as a fraction of the font size
const GLYPH_EM: f32 = 0.5;
const LINE_SPACING: f32 = 1.3;
const CELL_PADDING: f32 = 1.5;
const LIST_INDENT: f32 = 6.0;
const BORDER_PT: f32 = 0.5;

pub fn to_pdf(
    view: &RenderedView,
    header: Option<&HeaderImage>,
    settings: &ExportSettings,
) -> Result<Vec<u8>, ModulError> {
    let mut writer = PdfWriter::new(view, settings)?;
    for block in &view.blocks {
        writer.block(block, header)?;
    }
    debug!(pages = writer.pages, blocks = view.blocks.len(), "pdf laid out");
    writer.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl Face {
    fn of(span: &Span, force_bold: bool) -> Self {
        match (span.bold || force_bold, span.italic) {
            (true, true) => Face::BoldItalic,
            (true, false) => Face::Bold,
            (false, true) => Face::Italic,
            (false, false) => Face::Regular,
        }
    }
}

/// A word placed on a wrapped line, `x` relative to the line start
#[derive(Debug, Clone, PartialEq)]
struct Placed {
    x: f32,
    text: String,
    face: Face,
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
    bold_italic: IndirectFontRef,
}

impl Fonts {
    fn get(&self, face: Face) -> &IndirectFontRef {
        match face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
            Face::Italic => &self.italic,
            Face::BoldItalic => &self.bold_italic,
        }
    }
}

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    fonts: Fonts,
    margin: f32,
    dpi: f32,
    base_pt: f32,
    /// Top of the free area, measured from the page bottom
    y: f32,
    pages: usize,
}

impl PdfWriter {
    fn new(view: &RenderedView, settings: &ExportSettings) -> Result<Self, ModulError> {
        let title = if view.subject.trim().is_empty() {
            "Modul Ajar".to_string()
        } else {
            format!("Modul Ajar - {}", view.subject)
        };
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let font = |f: BuiltinFont| doc.add_builtin_font(f).map_err(pdf_error);
        let fonts = Fonts {
            regular: font(BuiltinFont::TimesRoman)?,
            bold: font(BuiltinFont::TimesBold)?,
            italic: font(BuiltinFont::TimesItalic)?,
            bold_italic: font(BuiltinFont::TimesBoldItalic)?,
        };
        let layer = doc.get_page(page).get_layer(layer);
        let margin = settings.pdf_margin_mm.clamp(0.0, 60.0);
        Ok(Self {
            doc,
            layer,
            fonts,
            margin,
            dpi: settings.image_dpi.max(1.0),
            base_pt: settings.base_font_pt.max(4.0),
            y: PAGE_HEIGHT - margin,
            pages: 1,
        })
    }

    fn finish(self) -> Result<Vec<u8>, ModulError> {
        self.doc.save_to_bytes().map_err(pdf_error)
    }

    fn usable_width(&self) -> f32 {
        PAGE_WIDTH - 2.0 * self.margin
    }

    fn at_page_top(&self) -> bool {
        self.y >= PAGE_HEIGHT - self.margin - f32::EPSILON
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - self.margin;
        self.pages += 1;
    }

    /// Break the page when `height` does not fit below the cursor.
    fn reserve(&mut self, height: f32) {
        if self.y - height < self.margin && !self.at_page_top() {
            self.new_page();
        }
    }

    fn line_height(size: f32) -> f32 {
        size * LINE_SPACING * PT_TO_MM
    }

    fn block(&mut self, block: &Block, header: Option<&HeaderImage>) -> Result<(), ModulError> {
        let base = self.base_pt;
        match block {
            Block::HeaderImage => {
                if let Some(image) = header {
                    self.header_image(image)?;
                }
            }
            Block::Title { text, subtitle } => {
                self.centered(text, base + 4.0, Face::Bold);
                if let Some(subtitle) = subtitle {
                    self.centered(subtitle, base + 2.0, Face::Bold);
                }
                self.y -= 4.0;
            }
            Block::Heading { level, text } => {
                let size = base + (4 - (*level).clamp(1, 3)) as f32;
                self.y -= 2.5;
                self.reserve(Self::line_height(size) * 2.0);
                let width = self.usable_width();
                self.flow(&[Span::bold(text.as_str())], self.margin, width, size, false);
                self.y -= 1.0;
            }
            Block::Paragraph { spans } => {
                let width = self.usable_width();
                self.flow(spans, self.margin, width, base, false);
                self.y -= 2.0;
            }
            Block::List { ordered, items } => {
                for (i, item) in items.iter().enumerate() {
                    let marker = if *ordered {
                        format!("{}.", i + 1)
                    } else {
                        "•".to_string()
                    };
                    self.reserve(Self::line_height(base));
                    let top = self.y;
                    self.text(&marker, self.margin + 1.0, top, base, Face::Regular);
                    let (x, width) = (self.margin + LIST_INDENT, self.usable_width() - LIST_INDENT);
                    self.flow(item, x, width, base, false);
                }
                self.y -= 2.0;
            }
            Block::Table(table) => {
                self.table(table);
                self.y -= 3.0;
            }
            Block::PageBreak => {
                if !self.at_page_top() {
                    self.new_page();
                }
            }
            Block::Signature(signature) => self.signature(&signature.left, &signature.right),
        }
        Ok(())
    }

    fn header_image(&mut self, image: &HeaderImage) -> Result<(), ModulError> {
        let width = self.usable_width();
        let height = image.height_for_width(width);
        self.reserve(height);

        let native_width = image.width() as f32 / self.dpi * 25.4;
        let scale = width / native_width;
        let pixels = image.pixels()?;
        Image::from_dynamic_image(&pixels).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(self.margin)),
                translate_y: Some(Mm(self.y - height)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(self.dpi),
                ..Default::default()
            },
        );
        self.y -= height + 4.0;
        Ok(())
    }

    fn text(&self, text: &str, x: f32, top: f32, size: f32, face: Face) {
        let baseline = top - size * PT_TO_MM;
        self.layer
            .use_text(text, size, Mm(x), Mm(baseline), self.fonts.get(face));
    }

    fn centered(&mut self, text: &str, size: f32, face: Face) {
        let height = Self::line_height(size);
        self.reserve(height);
        let x = self.margin + ((self.usable_width() - text_width(text, size)) / 2.0).max(0.0);
        self.text(text, x, self.y, size, face);
        self.y -= height;
    }

    /// Wrapped spans starting at the cursor; moves the cursor below them.
    fn flow(&mut self, spans: &[Span], x: f32, width: f32, size: f32, force_bold: bool) {
        let height = Self::line_height(size);
        for line in wrap(spans, width, size, force_bold) {
            self.reserve(height);
            for word in &line {
                self.text(&word.text, x + word.x, self.y, size, word.face);
            }
            self.y -= height;
        }
    }

    fn table(&mut self, table: &Table) {
        let width = self.usable_width();
        let total: u32 = table.widths.iter().sum::<u32>().max(1);
        let columns: Vec<f32> = table
            .widths
            .iter()
            .map(|w| *w as f32 / total as f32 * width)
            .collect();

        for row in &table.header {
            self.row(row, &columns, table.class, true);
        }
        for row in &table.rows {
            self.row(row, &columns, table.class, false);
        }
    }

    fn row(&mut self, row: &Row, columns: &[f32], class: TableClass, header: bool) {
        let size = self.base_pt;
        let line_height = Self::line_height(size);

        let mut cells = Vec::with_capacity(row.cells.len());
        let mut column = 0;
        for cell in &row.cells {
            let span = (cell.colspan.max(1) as usize).min(columns.len().saturating_sub(column));
            if span == 0 {
                break;
            }
            let x: f32 = columns[..column].iter().sum();
            let w: f32 = columns[column..column + span].iter().sum();
            let lines = cell_lines(cell, w - 2.0 * CELL_PADDING, size, header || cell.strong);
            cells.push((x, w, lines));
            column += span;
        }

        let tallest = cells.iter().map(|(_, _, l)| l.len()).max().unwrap_or(1).max(1);
        self.reserve(tallest as f32 * line_height + 2.0 * CELL_PADDING);

        // rows taller than the free space continue on the next page
        let mut start = 0;
        loop {
            let room = ((self.y - self.margin - 2.0 * CELL_PADDING) / line_height).floor();
            let take = (tallest - start).min(room.max(1.0) as usize);
            let height = take as f32 * line_height + 2.0 * CELL_PADDING;
            let top = self.y;
            for (x, w, lines) in &cells {
                let left = self.margin + x;
                let end = lines.len().min(start + take);
                for (i, line) in lines.iter().enumerate().take(end).skip(start) {
                    let line_top = top - CELL_PADDING - (i - start) as f32 * line_height;
                    let shift = if header {
                        let used = line.last().map(|p| p.x + text_width(&p.text, size)).unwrap_or(0.0);
                        ((w - 2.0 * CELL_PADDING - used) / 2.0).max(0.0)
                    } else {
                        0.0
                    };
                    for word in line {
                        let x = left + CELL_PADDING + shift + word.x;
                        self.text(&word.text, x, line_top, size, word.face);
                    }
                }
                if class == TableClass::Content {
                    self.rect(left, top - height, *w, height);
                }
            }
            self.y -= height;
            start += take;
            if start >= tallest {
                break;
            }
            self.new_page();
        }
    }

    fn rect(&self, x: f32, y: f32, w: f32, h: f32) {
        self.layer.set_outline_thickness(BORDER_PT);
        let corner = |cx: f32, cy: f32| (Point::new(Mm(cx), Mm(cy)), false);
        self.layer.add_line(Line {
            points: vec![corner(x, y), corner(x + w, y), corner(x + w, y + h), corner(x, y + h)],
            is_closed: true,
        });
    }

    fn signature(&mut self, left: &SignatureParty, right: &SignatureParty) {
        let size = self.base_pt;
        let line_height = Self::line_height(size);
        fn column(p: &SignatureParty) -> Vec<(&str, Face)> {
            let mut lines: Vec<(&str, Face)> =
                p.heading.iter().map(|h| (h.as_str(), Face::Regular)).collect();
            lines.extend(std::iter::repeat(("", Face::Regular)).take(4));
            lines.push((p.name.as_str(), Face::Bold));
            if let Some(id) = &p.id_line {
                lines.push((id.as_str(), Face::Regular));
            }
            lines
        }
        let columns = [column(left), column(right)];
        let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
        self.y -= 6.0;
        self.reserve(rows as f32 * line_height);

        let half = self.usable_width() / 2.0;
        for i in 0..rows {
            self.reserve(line_height);
            for (lines, x) in columns.iter().zip([self.margin, self.margin + half]) {
                let Some((text, face)) = lines.get(i) else {
                    continue;
                };
                if text.is_empty() {
                    continue;
                }
                let cx = x + ((half - text_width(text, size)) / 2.0).max(0.0);
                self.text(text, cx, self.y, size, *face);
            }
            self.y -= line_height;
        }
    }
}

fn pdf_error(e: printpdf::Error) -> ModulError {
    ExportFailure::Pdf(e.to_string()).into()
}

/// Estimated advance of `text` in millimetres
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * GLYPH_EM * PT_TO_MM
}

/// Wrap cell lines; markers lead the first wrapped line of their item.
fn cell_lines(cell: &Cell, width: f32, size: f32, strong: bool) -> Vec<Vec<Placed>> {
    let mut out = Vec::new();
    for line in &cell.lines {
        out.extend(wrap(&marked_spans(line), width, size, strong));
    }
    if out.is_empty() {
        out.push(Vec::new());
    }
    out
}

fn marked_spans(line: &CellLine) -> Vec<Span> {
    match &line.marker {
        Some(marker) => {
            let mut spans = vec![Span::plain(format!("{} ", marker))];
            spans.extend(line.spans.iter().cloned());
            spans
        }
        None => line.spans.clone(),
    }
}

/// Greedy word wrap across styled spans.
fn wrap(spans: &[Span], width: f32, size: f32, force_bold: bool) -> Vec<Vec<Placed>> {
    let space = size * GLYPH_EM * 0.5 * PT_TO_MM;
    let max_chars = ((width / (size * GLYPH_EM * PT_TO_MM)).floor() as usize).max(1);

    let mut lines: Vec<Vec<Placed>> = Vec::new();
    let mut current: Vec<Placed> = Vec::new();
    let mut x = 0.0;
    for span in spans {
        let face = Face::of(span, force_bold);
        for word in span.text.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            for piece in chars.chunks(max_chars) {
                let text: String = piece.iter().collect();
                let w = text_width(&text, size);
                if !current.is_empty() && x + w > width {
                    lines.push(std::mem::take(&mut current));
                    x = 0.0;
                }
                current.push(Placed { x, text, face });
                x += w + space;
            }
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
