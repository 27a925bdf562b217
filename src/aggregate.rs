use crate::models::{Column, ExpenseRecord};

/// Lenient number parsing for amounts that arrive as text. Currency symbols
/// and thousands separators are ignored; anything else unparsable is `None`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.replace([',', '$'], "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn numeric(row: &ExpenseRecord, column: Column) -> Option<f64> {
    match column {
        Column::Amount => row.amount_value(),
        Column::Date => parse_number(&row.date),
        Column::PaymentType => parse_number(&row.payment_type),
        Column::Description => parse_number(&row.description),
    }
}

/// Round half away from zero to two fractional digits.
pub fn round2(val: f64) -> f64 {
    let rounded = (val * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Sum of `column` over `rows`, rounded to cents. Missing or unparsable
/// values count as zero.
///
/// The addends are sorted before summing so the result does not depend on
/// row order.
pub fn total<'a, I>(rows: I, column: Column) -> f64
where
    I: IntoIterator<Item = &'a ExpenseRecord>,
{
    let mut values: Vec<f64> = rows.into_iter().filter_map(|r| numeric(r, column)).collect();
    values.sort_by(f64::total_cmp);
    round2(values.iter().sum())
}
