use std::io::BufWriter;

use printpdf::*;

use crate::error::{GastosError, Result};
use crate::export::ExportTable;

// US Letter dimensions (mm)
const PAGE_W: f32 = 215.9;
const PAGE_H: f32 = 279.4;
const MARGIN_TOP: f32 = 25.4;
const MARGIN_BOTTOM: f32 = 25.4;
const MARGIN_LEFT: f32 = 19.05;
const MARGIN_RIGHT: f32 = 19.05;
const ROW_H: f32 = 5.0;
const FONT_SIZE: f32 = 10.0;
const TITLE_SIZE: f32 = 16.0;
const SUBTITLE_SIZE: f32 = 10.0;
const CELL_PAD: f32 = 2.0;

pub const TITLE: &str = "Consulta de Gastos";

fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.18
}

/// Cut `text` so it fits in `width` mm, ending in `...` when shortened.
fn fit(text: &str, width: f32, size: f32) -> String {
    if approx_text_width(text, size) <= width {
        return text.to_string();
    }
    let max_chars = (width / (size * 0.18)) as usize;
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[derive(Clone, Copy)]
enum Align {
    Left,
    Right,
}

struct Col {
    width: f32,
    align: Align,
}

const COLUMNS: [Col; 4] = [
    Col { width: 30.0, align: Align::Left },
    Col { width: 35.0, align: Align::Right },
    Col { width: 40.0, align: Align::Left },
    Col { width: 72.8, align: Align::Left },
];

struct PdfWriter {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    current_page: PdfPageIndex,
    current_layer: PdfLayerIndex,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| GastosError::Pdf(format!("{e:?}")))?;
        let font_bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| GastosError::Pdf(format!("{e:?}")))?;
        Ok(Self {
            doc,
            font,
            font_bold,
            current_page: page,
            current_layer: layer,
            y: MARGIN_TOP,
        })
    }

    fn pdf_y(&self) -> f32 {
        PAGE_H - self.y
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer");
        self.current_page = page;
        self.current_layer = layer;
        self.y = MARGIN_TOP;
    }

    /// Break to a new page when `needed` mm do not fit. Returns whether a
    /// break happened so callers can repeat the column headers.
    fn ensure_space(&mut self, needed: f32) -> bool {
        if self.y + needed > PAGE_H - MARGIN_BOTTOM {
            self.new_page();
            true
        } else {
            false
        }
    }

    fn text(&self, s: &str, x: f32, size: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.use_text(s, size, Mm(x), Mm(self.pdf_y()), font);
    }

    fn hline(&self) {
        let layer = self
            .doc
            .get_page(self.current_page)
            .get_layer(self.current_layer);
        layer.set_outline_thickness(0.5);
        let line = Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(self.pdf_y())), false),
                (Point::new(Mm(PAGE_W - MARGIN_RIGHT), Mm(self.pdf_y())), false),
            ],
            is_closed: false,
        };
        layer.add_line(line);
    }

    fn header(&mut self, title: &str, period: &str) {
        self.text(title, MARGIN_LEFT, TITLE_SIZE, true);
        self.y += 7.0;
        if !period.is_empty() {
            self.text(period, MARGIN_LEFT, SUBTITLE_SIZE, false);
            self.y += 5.0;
        }
        let ts = chrono::Local::now()
            .format("Generado %Y-%m-%d %H:%M")
            .to_string();
        self.text(&ts, MARGIN_LEFT, 8.0, false);
        self.y += 5.0;
        self.hline();
        self.y += 5.0;
    }

    fn cells(&self, values: &[String; 4], bold: bool) {
        let mut x = MARGIN_LEFT;
        for (col, value) in COLUMNS.iter().zip(values) {
            let value = fit(value, col.width - CELL_PAD, FONT_SIZE);
            match col.align {
                Align::Left => self.text(&value, x, FONT_SIZE, bold),
                Align::Right => {
                    let tw = approx_text_width(&value, FONT_SIZE);
                    self.text(&value, x + col.width - CELL_PAD - tw, FONT_SIZE, bold);
                }
            }
            x += col.width;
        }
    }

    fn table_header(&mut self, headers: &[&str; 4]) {
        self.ensure_space(ROW_H * 2.0);
        self.cells(&(*headers).map(String::from), true);
        self.y += ROW_H;
        self.hline();
        self.y += 2.0;
    }

    fn table_row(&mut self, headers: &[&str; 4], values: &[String; 4], bold: bool) {
        if self.ensure_space(ROW_H) {
            self.table_header(headers);
        }
        self.cells(values, bold);
        self.y += ROW_H;
    }

    fn separator(&mut self) {
        self.hline();
        self.y += 2.0;
    }

    fn to_bytes(self) -> Result<Vec<u8>> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| GastosError::Pdf(format!("{e:?}")))?;
        buf.into_inner().map_err(|e| GastosError::Pdf(e.to_string()))
    }
}

/// Expense table as a one-or-more page PDF, headers repeated on each page.
pub fn render_expenses(table: &ExportTable) -> Result<Vec<u8>> {
    let mut pdf = PdfWriter::new(TITLE)?;
    pdf.header(TITLE, &table.period);
    pdf.table_header(&table.headers);

    for row in &table.rows {
        pdf.table_row(&table.headers, row, false);
    }
    pdf.separator();
    pdf.table_row(&table.headers, &table.total, true);

    pdf.to_bytes()
}
