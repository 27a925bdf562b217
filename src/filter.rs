use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::{FieldErrors, Result};
use crate::models::{month_name, Column, ExpenseRecord, PaymentCatalog};

/// First year offered by the year picker.
pub const FIRST_YEAR: i32 = 2025;

/// Years offered for monthly filtering: from [`FIRST_YEAR`] through next year.
pub fn available_years(current_year: i32) -> std::ops::RangeInclusive<i32> {
    FIRST_YEAR..=current_year.max(FIRST_YEAR - 1) + 1
}

/// What the server is asked to filter by. Only the active mode's fields exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    Monthly {
        year: i32,
        month: u32,
        payment_type: Option<String>,
    },
    Range {
        start: NaiveDate,
        end: NaiveDate,
        payment_type: Option<String>,
    },
}

#[derive(Serialize)]
struct FilterBody<'a> {
    anio: Option<i32>,
    mes: Option<u32>,
    fecha_inicial: Option<NaiveDate>,
    fecha_final: Option<NaiveDate>,
    tipo_pago: &'a str,
    type_date: bool,
}

impl FilterSpec {
    pub fn payment_type(&self) -> Option<&str> {
        match self {
            Self::Monthly { payment_type, .. } | Self::Range { payment_type, .. } => {
                payment_type.as_deref()
            }
        }
    }

    /// JSON body for the filter endpoint. The inactive mode's fields are
    /// sent as `null`.
    pub fn to_body(&self) -> serde_json::Value {
        let tipo_pago = self.payment_type().unwrap_or("");
        let body = match self {
            Self::Monthly { year, month, .. } => FilterBody {
                anio: Some(*year),
                mes: Some(*month),
                fecha_inicial: None,
                fecha_final: None,
                tipo_pago,
                type_date: true,
            },
            Self::Range { start, end, .. } => FilterBody {
                anio: None,
                mes: None,
                fecha_inicial: Some(*start),
                fecha_final: Some(*end),
                tipo_pago,
                type_date: false,
            },
        };
        serde_json::to_value(body).unwrap_or_default()
    }

    /// Human-readable period, e.g. `Enero 2025` or `2025-01-01 a 2025-01-31`.
    pub fn describe(&self) -> String {
        match self {
            Self::Monthly { year, month, .. } => {
                format!("{} {year}", month_name(*month).unwrap_or("?"))
            }
            Self::Range { start, end, .. } => format!("{start} a {end}"),
        }
    }
}

/// Editable filter state. Both modes' fields live side by side; the
/// `monthly` flag selects which ones [`FilterForm::to_spec`] reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterForm {
    pub monthly: bool,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub payment_type: Option<String>,
}

impl FilterForm {
    /// Monthly mode preset to the month containing `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            monthly: true,
            year: Some(today.year()),
            month: Some(today.month()),
            start: None,
            end: None,
            payment_type: None,
        }
    }

    /// Switch mode, clearing the fields of the mode being left.
    pub fn toggle_mode(&mut self, monthly: bool) {
        self.monthly = monthly;
        if monthly {
            self.start = None;
            self.end = None;
        } else {
            self.year = None;
            self.month = None;
        }
    }

    /// Clear every field and go back to monthly mode.
    pub fn reset(&mut self) {
        *self = Self {
            monthly: true,
            year: None,
            month: None,
            start: None,
            end: None,
            payment_type: None,
        };
    }

    pub fn to_spec(&self) -> Result<FilterSpec> {
        let mut errors = FieldErrors::new();
        let payment_type = self
            .payment_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        if self.monthly {
            if self.year.is_none() {
                errors.add("anio", "El año es obligatorio.");
            }
            match self.month {
                None => errors.add("mes", "El mes es obligatorio."),
                Some(m) if !(1..=12).contains(&m) => errors.add("mes", "El mes no es válido."),
                Some(_) => {}
            }
            errors.into_result()?;
            return Ok(FilterSpec::Monthly {
                year: self.year.unwrap_or_default(),
                month: self.month.unwrap_or_default(),
                payment_type,
            });
        }

        match (self.start, self.end) {
            (Some(start), Some(end)) => {
                if start > end {
                    errors.add(
                        "fecha_inicial",
                        "La fecha inicial no puede ser posterior a la final.",
                    );
                }
                errors.into_result()?;
                Ok(FilterSpec::Range {
                    start,
                    end,
                    payment_type,
                })
            }
            (start, end) => {
                if start.is_none() {
                    errors.add("fecha_inicial", "La fecha inicial es obligatoria.");
                }
                if end.is_none() {
                    errors.add("fecha_final", "La fecha final es obligatoria.");
                }
                Err(crate::error::GastosError::Validation(errors))
            }
        }
    }
}

/// Rows whose amount, payment-type label, date or description contains
/// `text`, ignoring case. Empty `text` keeps every row.
///
/// Always evaluated against the full `rows`; the result borrows from it.
pub fn quick_filter<'a>(
    rows: &'a [ExpenseRecord],
    text: &str,
    catalog: &PaymentCatalog,
) -> Vec<&'a ExpenseRecord> {
    if text.is_empty() {
        return rows.iter().collect();
    }
    let needle = text.to_lowercase();
    rows.iter()
        .filter(|row| {
            Column::ALL
                .iter()
                .any(|col| row.cell(*col, catalog).to_lowercase().contains(&needle))
        })
        .collect()
}

/// The order to sort table rows in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Column the table is sorted by, and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: Column,
    pub order: SortOrder,
}

fn compare(a: &ExpenseRecord, b: &ExpenseRecord, column: Column, catalog: &PaymentCatalog) -> Ordering {
    match column {
        // Unparsable amounts go after every number.
        Column::Amount => match (a.amount_value(), b.amount_value()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        _ => a
            .cell(column, catalog)
            .to_lowercase()
            .cmp(&b.cell(column, catalog).to_lowercase()),
    }
}

/// Stable sort by the displayed value of `sort.column`; payment types
/// order by label, text case-insensitively.
pub fn sort_rows(rows: &mut [&ExpenseRecord], sort: Sort, catalog: &PaymentCatalog) {
    rows.sort_by(|a, b| {
        let ord = compare(a, b, sort.column, catalog);
        match sort.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GastosError;
    use crate::models::{Amount, PaymentType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rec(amount: f64, key: &str, date: &str, desc: &str) -> ExpenseRecord {
        ExpenseRecord {
            id: None,
            amount: Some(Amount::Number(amount)),
            payment_type: key.into(),
            date: date.into(),
            description: desc.into(),
        }
    }

    fn catalog() -> PaymentCatalog {
        PaymentCatalog::new(vec![
            PaymentType { key: "EF".into(), label: "Efectivo".into() },
            PaymentType { key: "TC".into(), label: "Tarjeta de Crédito".into() },
        ])
    }

    fn sample() -> Vec<ExpenseRecord> {
        vec![
            rec(100.0, "EF", "2025-01-10", "Renta"),
            rec(45.5, "TC", "2025-01-12", "Gasolina"),
            rec(12.0, "EF", "2025-02-01", "Café"),
        ]
    }

    #[test]
    fn test_quick_filter_empty_is_identity() {
        let rows = sample();
        let out = quick_filter(&rows, "", &catalog());
        let out: Vec<ExpenseRecord> = out.into_iter().cloned().collect();
        assert_eq!(out, rows);
    }

    #[test]
    fn test_quick_filter_is_case_insensitive() {
        let rows = sample();
        let upper = quick_filter(&rows, "EFEC", &catalog());
        let lower = quick_filter(&rows, "efec", &catalog());
        assert_eq!(upper, lower);
        assert_eq!(upper.len(), 2);
    }

    #[test]
    fn test_quick_filter_matches_each_column() {
        let rows = sample();
        let cat = catalog();
        assert_eq!(quick_filter(&rows, "45.5", &cat).len(), 1);
        assert_eq!(quick_filter(&rows, "2025-02", &cat).len(), 1);
        assert_eq!(quick_filter(&rows, "gasol", &cat).len(), 1);
        assert_eq!(quick_filter(&rows, "crédito", &cat).len(), 1);
        assert!(quick_filter(&rows, "zzz", &cat).is_empty());
    }

    #[test]
    fn test_quick_filter_does_not_compound() {
        let rows = sample();
        let cat = catalog();
        assert_eq!(quick_filter(&rows, "renta", &cat).len(), 1);
        // A new text is evaluated against all rows, not the previous result.
        assert_eq!(quick_filter(&rows, "café", &cat).len(), 1);
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_toggle_clears_inactive_fields() {
        let mut form = FilterForm::new(date(2025, 3, 15));
        assert_eq!(form.year, Some(2025));
        assert_eq!(form.month, Some(3));

        form.toggle_mode(false);
        assert_eq!(form.year, None);
        assert_eq!(form.month, None);

        form.start = Some(date(2025, 1, 1));
        form.end = Some(date(2025, 1, 31));
        form.toggle_mode(true);
        assert_eq!(form.start, None);
        assert_eq!(form.end, None);
    }

    #[test]
    fn test_spec_never_reads_other_mode() {
        let mut form = FilterForm::new(date(2025, 3, 15));
        form.start = Some(date(2024, 1, 1));
        form.end = Some(date(2024, 1, 2));
        let spec = form.to_spec().unwrap();
        assert_eq!(
            spec,
            FilterSpec::Monthly { year: 2025, month: 3, payment_type: None }
        );
        let body = spec.to_body();
        assert!(body["fecha_inicial"].is_null());
        assert!(body["fecha_final"].is_null());
        assert_eq!(body["type_date"], true);
        assert_eq!(body["tipo_pago"], "");
    }

    #[test]
    fn test_range_body() {
        let mut form = FilterForm::new(date(2025, 3, 15));
        form.toggle_mode(false);
        form.start = Some(date(2025, 1, 1));
        form.end = Some(date(2025, 1, 31));
        form.payment_type = Some("EF".into());
        let body = form.to_spec().unwrap().to_body();
        assert!(body["anio"].is_null());
        assert!(body["mes"].is_null());
        assert_eq!(body["fecha_inicial"], "2025-01-01");
        assert_eq!(body["fecha_final"], "2025-01-31");
        assert_eq!(body["tipo_pago"], "EF");
        assert_eq!(body["type_date"], false);
    }

    #[test]
    fn test_missing_fields_are_reported() {
        let mut form = FilterForm::new(date(2025, 3, 15));
        form.reset();
        match form.to_spec().unwrap_err() {
            GastosError::Validation(errors) => {
                assert!(errors.contains("anio"));
                assert!(errors.contains("mes"));
            }
            other => panic!("unexpected error: {other}"),
        }

        form.toggle_mode(false);
        form.start = Some(date(2025, 2, 1));
        match form.to_spec().unwrap_err() {
            GastosError::Validation(errors) => {
                assert!(errors.contains("fecha_final"));
                assert!(!errors.contains("fecha_inicial"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let mut form = FilterForm::new(date(2025, 3, 15));
        form.toggle_mode(false);
        form.start = Some(date(2025, 2, 1));
        form.end = Some(date(2025, 1, 1));
        assert!(form.to_spec().is_err());
    }

    #[test]
    fn test_available_years() {
        let years: Vec<i32> = available_years(2026).collect();
        assert_eq!(years, vec![2025, 2026, 2027]);
        assert_eq!(available_years(2025).collect::<Vec<_>>(), vec![2025, 2026]);
    }

    #[test]
    fn test_describe() {
        let spec = FilterSpec::Monthly { year: 2025, month: 1, payment_type: None };
        assert_eq!(spec.describe(), "Enero 2025");
    }

    fn sortable() -> (Vec<ExpenseRecord>, PaymentCatalog) {
        let catalog = PaymentCatalog::new(vec![
            PaymentType { key: "TC".into(), label: "Tarjeta de Crédito".into() },
            PaymentType { key: "EF".into(), label: "Efectivo".into() },
        ]);
        let rec = |amount: Amount, tipo: &str, fecha: &str, desc: &str| ExpenseRecord {
            id: None,
            amount: Some(amount),
            payment_type: tipo.into(),
            date: fecha.into(),
            description: desc.into(),
        };
        let rows = vec![
            rec(Amount::Number(100.0), "TC", "2025-01-20", "renta"),
            rec(Amount::Text("n/a".into()), "EF", "2025-01-05", "Agua"),
            rec(Amount::Number(9.5), "EF", "2025-01-12", "Luz"),
        ];
        (rows, catalog)
    }

    fn descriptions(rows: &[&ExpenseRecord]) -> Vec<String> {
        rows.iter().map(|r| r.description.clone()).collect()
    }

    #[test]
    fn test_sort_by_amount_puts_text_last() {
        let (rows, catalog) = sortable();
        let mut view: Vec<&ExpenseRecord> = rows.iter().collect();
        let sort = Sort { column: Column::Amount, order: SortOrder::Ascending };
        sort_rows(&mut view, sort, &catalog);
        assert_eq!(descriptions(&view), vec!["Luz", "renta", "Agua"]);
    }

    #[test]
    fn test_sort_by_label_and_text_ignores_case() {
        let (rows, catalog) = sortable();
        let mut view: Vec<&ExpenseRecord> = rows.iter().collect();
        sort_rows(&mut view, Sort { column: Column::PaymentType, order: SortOrder::Descending }, &catalog);
        assert_eq!(view[0].payment_type, "TC");

        sort_rows(&mut view, Sort { column: Column::Description, order: SortOrder::Ascending }, &catalog);
        assert_eq!(descriptions(&view), vec!["Agua", "Luz", "renta"]);

        sort_rows(&mut view, Sort { column: Column::Date, order: SortOrder::Descending }, &catalog);
        assert_eq!(descriptions(&view), vec!["renta", "Luz", "Agua"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let (rows, catalog) = sortable();
        let mut view: Vec<&ExpenseRecord> = rows.iter().collect();
        sort_rows(&mut view, Sort { column: Column::PaymentType, order: SortOrder::Ascending }, &catalog);
        assert_eq!(descriptions(&view), vec!["Agua", "Luz", "renta"]);
    }
}
