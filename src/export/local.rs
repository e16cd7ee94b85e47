//! Client-side export: walk the result HTML and paint it with printpdf.
//!
//! Rendering is split in three passes so each can be tested on its own:
//! [`extract_blocks`] flattens the HTML into headings, paragraphs, list
//! items, rules and tables; [`layout`] places them on A4 pages with manual
//! pagination; [`render`] paints the placed operations into a PDF.
//!
//! Tables are drawn natively as a cell grid. Cells whose whole text is
//! `low`, `medium` or `high` keep their risk colour as a filled background.

use crate::error::InsightsError;
use printpdf::*;
use scraper::{ElementRef, Html};
use std::io::BufWriter;
use tracing::debug;

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 20.0;
const CONTENT_W: f32 = PAGE_W - 2.0 * MARGIN;
const TOP: f32 = PAGE_H - MARGIN;
const BOTTOM: f32 = MARGIN;

const BODY_PT: f32 = 10.5;
const TABLE_PT: f32 = 9.0;
const CELL_PAD: f32 = 1.8;
const PT_TO_MM: f32 = 0.3528;

const HEADER_FILL: (f32, f32, f32) = (0.93, 0.93, 0.93);

/// Risk level recognised in a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Exact, case-insensitive match on the trimmed cell text.
    pub fn from_text(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }

    pub fn fill(self) -> (f32, f32, f32) {
        match self {
            RiskLevel::Low => (0.85, 0.95, 0.85),
            RiskLevel::Medium => (1.0, 0.93, 0.75),
            RiskLevel::High => (1.0, 0.82, 0.82),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub text: String,
    pub header: bool,
    pub risk: Option<RiskLevel>,
}

/// A unit of document flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    ListItem { marker: String, text: String, depth: usize },
    Table(Vec<Vec<TableCell>>),
    Rule,
}

// ── Extraction ───────────────────────────────────────────────────────────────

/// Flatten sanitised result HTML into blocks.
pub fn extract_blocks(html: &str) -> Vec<Block> {
    let fragment = Html::parse_fragment(html);
    let mut blocks = Vec::new();
    let mut pending = String::new();
    walk(fragment.root_element(), &mut blocks, &mut pending);
    flush(&mut blocks, &mut pending);
    blocks
}

fn walk(el: ElementRef<'_>, blocks: &mut Vec<Block>, pending: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            pending.push_str(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child.value().name();
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                flush(blocks, pending);
                let level = name.as_bytes()[1] - b'0';
                let text = inline_text(child, false);
                if !text.is_empty() {
                    blocks.push(Block::Heading { level, text });
                }
            }
            "p" | "pre" | "blockquote" => {
                flush(blocks, pending);
                let text = inline_text(child, false);
                if !text.is_empty() {
                    blocks.push(Block::Paragraph(text));
                }
            }
            "ul" | "ol" => {
                flush(blocks, pending);
                list_items(child, 0, blocks);
            }
            "table" => {
                flush(blocks, pending);
                let mut rows = Vec::new();
                table_rows(child, false, &mut rows);
                if !rows.is_empty() {
                    blocks.push(Block::Table(rows));
                }
            }
            "hr" => {
                flush(blocks, pending);
                blocks.push(Block::Rule);
            }
            "br" => pending.push(' '),
            "div" | "section" | "article" | "header" | "footer" | "main" | "dl" => {
                flush(blocks, pending);
                walk(child, blocks, pending);
                flush(blocks, pending);
            }
            _ => {
                pending.push_str(&inline_text(child, false));
                pending.push(' ');
            }
        }
    }
}

fn flush(blocks: &mut Vec<Block>, pending: &mut String) {
    let text = collapse(pending);
    if !text.is_empty() {
        blocks.push(Block::Paragraph(text));
    }
    pending.clear();
}

fn list_items(list: ElementRef<'_>, depth: usize, blocks: &mut Vec<Block>) {
    let ordered = list.value().name() == "ol";
    let mut n = 0;
    for item in list.children().filter_map(ElementRef::wrap) {
        if item.value().name() != "li" {
            continue;
        }
        n += 1;
        let marker = if ordered { format!("{n}.") } else { "-".to_string() };
        blocks.push(Block::ListItem {
            marker,
            text: inline_text(item, true),
            depth,
        });
        for nested in item.children().filter_map(ElementRef::wrap) {
            if matches!(nested.value().name(), "ul" | "ol") {
                list_items(nested, depth + 1, blocks);
            }
        }
    }
}

fn table_rows(el: ElementRef<'_>, header: bool, rows: &mut Vec<Vec<TableCell>>) {
    for child in el.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "thead" => table_rows(child, true, rows),
            "tbody" | "tfoot" => table_rows(child, header, rows),
            "tr" => {
                let cells: Vec<TableCell> = child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|c| matches!(c.value().name(), "td" | "th"))
                    .map(|c| {
                        let text = inline_text(c, false);
                        let is_header = header || c.value().name() == "th";
                        let risk = if is_header { None } else { RiskLevel::from_text(&text) };
                        TableCell {
                            text,
                            header: is_header,
                            risk,
                        }
                    })
                    .collect();
                if !cells.is_empty() {
                    rows.push(cells);
                }
            }
            _ => {}
        }
    }
}

/// All text below `el` on one line. Nested lists are skipped when
/// `skip_lists` is set so list items do not repeat their children.
fn inline_text(el: ElementRef<'_>, skip_lists: bool) -> String {
    let mut out = String::new();
    collect_text(el, skip_lists, &mut out);
    collapse(&out)
}

fn collect_text(el: ElementRef<'_>, skip_lists: bool, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(e) = ElementRef::wrap(child) {
            match e.value().name() {
                "br" => out.push(' '),
                "ul" | "ol" if skip_lists => {}
                "p" | "div" | "li" | "tr" | "td" | "th" => {
                    collect_text(e, skip_lists, out);
                    out.push(' ');
                }
                _ => collect_text(e, skip_lists, out),
            }
        }
    }
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Layout ───────────────────────────────────────────────────────────────────

/// A positioned drawing operation, coordinates in millimetres from the
/// bottom-left corner.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Text {
        text: String,
        size: f32,
        bold: bool,
        x: f32,
        y: f32,
    },
    Fill {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        rgb: (f32, f32, f32),
    },
    Stroke {
        from: (f32, f32),
        to: (f32, f32),
    },
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * 1.4
}

/// Characters of Helvetica at `size` that fit in `width_mm`, roughly.
fn chars_per_line(width_mm: f32, size: f32) -> usize {
    let avg_char = size * PT_TO_MM * 0.5;
    ((width_mm / avg_char) as usize).max(8)
}

/// Simple word-wrap helper for PDF text rendering.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.chars().count() + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

struct Cursor {
    pages: Vec<Vec<Op>>,
    y: f32,
}

impl Cursor {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: TOP,
        }
    }

    /// Start a new page unless `height` still fits above the bottom margin.
    fn ensure(&mut self, height: f32) {
        if self.y - height < BOTTOM && self.y < TOP {
            self.page_break();
        }
    }

    fn page_break(&mut self) {
        self.pages.push(Vec::new());
        self.y = TOP;
    }

    fn push(&mut self, op: Op) {
        if let Some(page) = self.pages.last_mut() {
            page.push(op);
        }
    }

    fn text_lines(&mut self, text: &str, size: f32, bold: bool, x: f32, width: f32) {
        let lh = line_height(size);
        for line in wrap_text(text, chars_per_line(width, size)) {
            self.ensure(lh);
            self.y -= lh;
            self.push(Op::Text {
                text: line,
                size,
                bold,
                x,
                y: self.y,
            });
        }
    }
}

fn heading_size(level: u8) -> f32 {
    match level {
        1 => 18.0,
        2 => 15.0,
        3 => 13.0,
        _ => 11.5,
    }
}

/// Place `blocks` on pages, preceded by `title`.
pub fn layout(title: &str, blocks: &[Block]) -> Vec<Vec<Op>> {
    let mut c = Cursor::new();
    c.text_lines(title, heading_size(1), true, MARGIN, CONTENT_W);
    c.y -= 4.0;

    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let size = heading_size(*level);
                // keep a heading together with at least one body line
                c.ensure(line_height(size) + 3.0 + line_height(BODY_PT));
                c.y -= 3.0;
                c.text_lines(text, size, true, MARGIN, CONTENT_W);
                c.y -= 1.5;
            }
            Block::Paragraph(text) => {
                c.text_lines(text, BODY_PT, false, MARGIN, CONTENT_W);
                c.y -= 2.5;
            }
            Block::ListItem { marker, text, depth } => {
                let indent = MARGIN + 4.0 + *depth as f32 * 6.0;
                let lh = line_height(BODY_PT);
                c.ensure(lh);
                let marker_y = c.y - lh;
                c.push(Op::Text {
                    text: marker.clone(),
                    size: BODY_PT,
                    bold: false,
                    x: indent,
                    y: marker_y,
                });
                let text_x = indent + 6.0;
                c.text_lines(text, BODY_PT, false, text_x, PAGE_W - MARGIN - text_x);
                c.y -= 1.0;
            }
            Block::Rule => {
                c.ensure(5.0);
                c.y -= 2.5;
                c.push(Op::Stroke {
                    from: (MARGIN, c.y),
                    to: (PAGE_W - MARGIN, c.y),
                });
                c.y -= 2.5;
            }
            Block::Table(rows) => layout_table(&mut c, rows),
        }
    }

    c.pages
}

fn layout_table(c: &mut Cursor, rows: &[Vec<TableCell>]) {
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    if cols == 0 {
        return;
    }
    let col_w = CONTENT_W / cols as f32;
    let lh = line_height(TABLE_PT);
    let max_chars = chars_per_line(col_w - 2.0 * CELL_PAD, TABLE_PT);
    let lines_fitting = |y: f32| ((y - BOTTOM - 2.0 * CELL_PAD) / lh).floor().max(0.0) as usize;
    let page_lines = lines_fitting(TOP).max(1);

    c.y -= 2.0;
    for row in rows {
        let wrapped: Vec<Vec<String>> = row.iter().map(|cell| wrap_text(&cell.text, max_chars)).collect();
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1);

        // A row taller than a page continues on the next one, grid and fill
        // redrawn for every part.
        let mut first = 0;
        while first < lines {
            let remaining = lines - first;
            if lines_fitting(c.y) < remaining.min(page_lines) && c.y < TOP {
                c.page_break();
                continue;
            }
            let count = remaining.min(lines_fitting(c.y).max(1));
            layout_row_part(c, row, &wrapped, first, count, col_w, cols);
            first += count;
            if first < lines {
                c.page_break();
            }
        }
    }
    c.y -= 4.0;
}

/// Paint lines `first..first + count` of every cell of `row` as one band.
fn layout_row_part(
    c: &mut Cursor,
    row: &[TableCell],
    wrapped: &[Vec<String>],
    first: usize,
    count: usize,
    col_w: f32,
    cols: usize,
) {
    let lh = line_height(TABLE_PT);
    let row_h = count as f32 * lh + 2.0 * CELL_PAD;
    let top = c.y;
    let bottom = top - row_h;

    for (i, (cell, cell_lines)) in row.iter().zip(wrapped).enumerate() {
        let x = MARGIN + i as f32 * col_w;
        let fill = if cell.header {
            Some(HEADER_FILL)
        } else {
            cell.risk.map(RiskLevel::fill)
        };
        if let Some(rgb) = fill {
            c.push(Op::Fill {
                x,
                y: bottom,
                w: col_w,
                h: row_h,
                rgb,
            });
        }
        for (n, line) in cell_lines.iter().skip(first).take(count).enumerate() {
            c.push(Op::Text {
                text: line.clone(),
                size: TABLE_PT,
                bold: cell.header,
                x: x + CELL_PAD,
                y: top - CELL_PAD - (n + 1) as f32 * lh + lh * 0.25,
            });
        }
    }

    // grid
    c.push(Op::Stroke {
        from: (MARGIN, top),
        to: (MARGIN + CONTENT_W, top),
    });
    c.push(Op::Stroke {
        from: (MARGIN, bottom),
        to: (MARGIN + CONTENT_W, bottom),
    });
    for i in 0..=cols {
        let x = MARGIN + i as f32 * col_w;
        c.push(Op::Stroke {
            from: (x, top),
            to: (x, bottom),
        });
    }
    c.y = bottom;
}

// ── Painting ─────────────────────────────────────────────────────────────────

fn pdf_err(e: impl std::fmt::Display) -> InsightsError {
    InsightsError::Export(format!("PDF: {e}"))
}

fn rgb(c: (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(c.0, c.1, c.2, None))
}

/// Render `html` (already sanitised) as a PDF titled `title`.
pub fn render(title: &str, html: &str) -> Result<Vec<u8>, InsightsError> {
    let blocks = extract_blocks(html);
    let pages = layout(title, &blocks);
    debug!("Local export: {} blocks on {} page(s)", blocks.len(), pages.len());

    let (doc, page1, layer1) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
    let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;

    for (i, ops) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(page1).get_layer(layer1)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };
        layer.set_outline_color(rgb((0.75, 0.75, 0.75)));
        layer.set_outline_thickness(0.5);
        layer.set_fill_color(rgb((0.0, 0.0, 0.0)));

        for op in ops {
            match op {
                Op::Text {
                    text,
                    size,
                    bold: is_bold,
                    x,
                    y,
                } => {
                    let f = if *is_bold { &bold } else { &font };
                    layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), f);
                }
                Op::Fill { x, y, w, h, rgb: fill } => {
                    layer.set_fill_color(rgb(*fill));
                    layer.add_rect(Rect::new(Mm(*x), Mm(*y), Mm(x + w), Mm(y + h)));
                    layer.set_fill_color(rgb((0.0, 0.0, 0.0)));
                }
                Op::Stroke { from, to } => {
                    layer.add_line(Line {
                        points: vec![
                            (Point::new(Mm(from.0), Mm(from.1)), false),
                            (Point::new(Mm(to.0), Mm(to.1)), false),
                        ],
                        is_closed: false,
                    });
                }
            }
        }
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf).map_err(pdf_err)?;
    buf.into_inner().map_err(pdf_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RISK_HTML: &str = r#"<h2>Risk Analysis</h2>
<p>Reviewed for the <strong>Tenant</strong>.</p>
<ul><li>First <em>point</em><ul><li>Nested</li></ul></li><li>Second</li></ul>
<ol><li>One</li><li>Two</li></ol>
<table><thead><tr><th>Clause</th><th>Risk</th></tr></thead>
<tbody><tr><td>Repairs</td><td>Medium</td></tr><tr><td>Deposit</td><td> HIGH </td></tr><tr><td>Low income</td><td>n/a</td></tr></tbody></table>
<hr>"#;

    #[test]
    fn risk_levels_match_exact_text_only() {
        assert_eq!(RiskLevel::from_text(" Low "), Some(RiskLevel::Low));
        assert_eq!(RiskLevel::from_text("MEDIUM"), Some(RiskLevel::Medium));
        assert_eq!(RiskLevel::from_text("high"), Some(RiskLevel::High));
        assert_eq!(RiskLevel::from_text("Low income"), None);
    }

    #[test]
    fn blocks_are_extracted_in_order() {
        let blocks = extract_blocks(RISK_HTML);
        assert_eq!(
            blocks[0],
            Block::Heading {
                level: 2,
                text: "Risk Analysis".into()
            }
        );
        assert_eq!(blocks[1], Block::Paragraph("Reviewed for the Tenant.".into()));
        assert_eq!(
            blocks[2],
            Block::ListItem {
                marker: "-".into(),
                text: "First point".into(),
                depth: 0
            }
        );
        assert_eq!(
            blocks[3],
            Block::ListItem {
                marker: "-".into(),
                text: "Nested".into(),
                depth: 1
            }
        );
        assert!(matches!(&blocks[5], Block::ListItem { marker, .. } if marker == "1."));
        assert!(matches!(blocks.last(), Some(Block::Rule)));
    }

    #[test]
    fn table_cells_carry_risk_and_header_flags() {
        let blocks = extract_blocks(RISK_HTML);
        let rows = blocks
            .iter()
            .find_map(|b| match b {
                Block::Table(rows) => Some(rows.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].iter().all(|c| c.header && c.risk.is_none()));
        assert_eq!(rows[1][1].risk, Some(RiskLevel::Medium));
        assert_eq!(rows[2][1].risk, Some(RiskLevel::High));
        assert_eq!(rows[3][0].risk, None);
    }

    #[test]
    fn loose_text_becomes_paragraphs() {
        let blocks = extract_blocks("Intro text <strong>bold</strong><h3>Next</h3>tail");
        assert_eq!(blocks[0], Block::Paragraph("Intro text bold".into()));
        assert_eq!(blocks[2], Block::Paragraph("tail".into()));
    }

    #[test]
    fn long_documents_paginate() {
        let blocks: Vec<Block> = (0..120)
            .map(|i| Block::Paragraph(format!("Paragraph {i} with enough words to wrap across the line a couple of times when it is laid out on an A4 page.")))
            .collect();
        let pages = layout("Long", &blocks);
        assert!(pages.len() > 1, "expected pagination, got {} page", pages.len());
        for page in &pages {
            for op in page {
                if let Op::Text { y, .. } = op {
                    assert!(*y >= BOTTOM - 0.01 && *y <= TOP, "text at y={y}");
                }
            }
        }
    }

    #[test]
    fn tall_table_row_continues_on_next_pages() {
        let long: String = (0..4000).map(|i| format!("w{i} ")).collect();
        let html = format!(
            "<table><tr><td>Clause</td><td>{long}</td><td>High</td></tr><tr><td>After</td><td>x</td><td>y</td></tr></table>"
        );
        let pages = layout("Tall", &extract_blocks(&html));
        assert!(pages.len() > 2, "got {} pages", pages.len());

        let texts: Vec<(&str, f32)> = pages
            .iter()
            .flatten()
            .filter_map(|op| match op {
                Op::Text { text, y, .. } => Some((text.as_str(), *y)),
                _ => None,
            })
            .collect();
        for (text, y) in &texts {
            assert!(*y >= BOTTOM && *y <= TOP, "{text:?} at y={y}");
        }
        assert!(texts.iter().any(|(t, _)| t.split_whitespace().any(|w| w == "w3999")));
        assert!(texts.iter().any(|(t, _)| *t == "After"));

        // every part of the split row keeps its risk fill
        let high_fills = pages
            .iter()
            .filter(|page| {
                page.iter()
                    .any(|op| matches!(op, Op::Fill { rgb, .. } if *rgb == RiskLevel::High.fill()))
            })
            .count();
        assert!(high_fills > 1, "fill on {high_fills} page(s)");
    }

    #[test]
    fn risk_cells_get_fills() {
        let pages = layout("Risk", &extract_blocks(RISK_HTML));
        let fills: Vec<_> = pages
            .iter()
            .flatten()
            .filter_map(|op| match op {
                Op::Fill { rgb, .. } => Some(*rgb),
                _ => None,
            })
            .collect();
        assert!(fills.contains(&RiskLevel::Medium.fill()));
        assert!(fills.contains(&RiskLevel::High.fill()));
        assert!(!fills.contains(&RiskLevel::Low.fill()));
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("one two three four five", 10);
        assert_eq!(lines, vec!["one two", "three four", "five"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn render_produces_pdf_bytes() {
        let bytes = render("Legal Document Analysis", RISK_HTML).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
