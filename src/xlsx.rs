use rust_xlsxwriter::{Format, Workbook};

use crate::error::Result;
use crate::export::ExportTable;

pub const SHEET_NAME: &str = "Gastos";

const COLUMN_WIDTHS: [f64; 4] = [12.0, 16.0, 22.0, 40.0];

/// Single-sheet workbook: header row, one row per expense, total row last.
/// Every cell is written as text so amounts read exactly as on screen.
pub fn render_expenses(table: &ExportTable) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        sheet.set_column_width(col as u16, *width)?;
    }
    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    let last = table.rows.len();
    for (i, values) in table.body().enumerate() {
        let row = i as u32 + 1;
        for (col, value) in values.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            if i == last {
                sheet.write_string_with_format(row, col as u16, value, &bold)?;
            } else {
                sheet.write_string(row, col as u16, value)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}
