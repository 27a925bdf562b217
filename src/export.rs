use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::Result;
use crate::fmt::money;
use crate::models::{Column, ExpenseRecord, PaymentCatalog};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Pdf,
    Xlsx,
}

impl ExportKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Xlsx => "xlsx",
        }
    }
}

/// `control_gastos_<kind>_<timestamp>.<ext>`, with the ISO-8601 timestamp
/// made filesystem-safe (`:` and `.` become `-`).
pub fn filename(kind: ExportKind, now: DateTime<Utc>) -> String {
    let stamp = now
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .replace([':', '.'], "-");
    let ext = kind.extension();
    format!("control_gastos_{ext}_{stamp}.{ext}")
}

/// Rows exactly as they are written to either artifact: the four display
/// columns, currency already formatted, plus the trailing total row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub headers: [&'static str; 4],
    pub rows: Vec<[String; 4]>,
    pub total: [String; 4],
    /// Period shown under the PDF title; may be empty.
    pub period: String,
}

impl ExportTable {
    pub fn build<'a, I>(rows: I, catalog: &PaymentCatalog, total: f64) -> Self
    where
        I: IntoIterator<Item = &'a ExpenseRecord>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                Column::ALL.map(|col| match col {
                    Column::Amount => match row.amount_value() {
                        Some(v) => money(v),
                        None => row.cell(col, catalog),
                    },
                    _ => row.cell(col, catalog),
                })
            })
            .collect();
        Self {
            headers: Column::ALL.map(|c| c.header()),
            rows,
            total: ["Total".to_string(), money(total), String::new(), String::new()],
            period: String::new(),
        }
    }

    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = period.into();
        self
    }

    /// Data rows followed by the total row.
    pub fn body(&self) -> impl Iterator<Item = &[String; 4]> {
        self.rows.iter().chain(std::iter::once(&self.total))
    }
}

pub fn render(kind: ExportKind, table: &ExportTable) -> Result<Vec<u8>> {
    match kind {
        ExportKind::Pdf => crate::pdf::render_expenses(table),
        ExportKind::Xlsx => crate::xlsx::render_expenses(table),
    }
}

/// Where finished artifacts go.
pub trait ArtifactSink {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes artifacts into a directory, creating it on first use.
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactSink for DirSink {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(filename);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Render `table` as `kind` and hand it to `sink`.
pub fn export(
    kind: ExportKind,
    table: &ExportTable,
    sink: &dyn ArtifactSink,
    now: DateTime<Utc>,
) -> Result<PathBuf> {
    let bytes = render(kind, table)?;
    let name = filename(kind, now);
    let path = sink.save(&name, &bytes)?;
    info!(path = %path.display(), rows = table.rows.len(), "export written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::models::{Amount, PaymentType};

    fn catalog() -> PaymentCatalog {
        PaymentCatalog::new(vec![PaymentType {
            key: "EF".into(),
            label: "Efectivo".into(),
        }])
    }

    fn renta() -> ExpenseRecord {
        ExpenseRecord {
            id: None,
            amount: Some(Amount::Number(100.0)),
            payment_type: "EF".into(),
            date: "2025-01-10".into(),
            description: "Renta".into(),
        }
    }

    #[test]
    fn test_filename_is_filesystem_safe() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 12, 30, 45).unwrap()
            + chrono::Duration::milliseconds(123);
        assert_eq!(
            filename(ExportKind::Pdf, now),
            "control_gastos_pdf_2025-01-10T12-30-45-123Z.pdf"
        );
        assert_eq!(
            filename(ExportKind::Xlsx, now),
            "control_gastos_xlsx_2025-01-10T12-30-45-123Z.xlsx"
        );
    }

    #[test]
    fn test_table_rows_match_screen() {
        let rows = vec![renta()];
        let table = ExportTable::build(&rows, &catalog(), 100.0);
        assert_eq!(table.headers, ["Fecha", "Cantidad", "Tipo de Pago", "Descripción"]);
        let body: Vec<&[String; 4]> = table.body().collect();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0], &["2025-01-10", "$ 100.00", "Efectivo", "Renta"].map(String::from));
        assert_eq!(body[1], &["Total", "$ 100.00", "", ""].map(String::from));
    }

    #[test]
    fn test_row_amount_matches_total_on_ties() {
        let mut rec = renta();
        rec.amount = Some(Amount::Number(10.625));
        let rows = vec![rec];
        let total = crate::aggregate::total(&rows, Column::Amount);
        let table = ExportTable::build(&rows, &catalog(), total);
        assert_eq!(table.rows[0][1], "$ 10.63");
        assert_eq!(table.rows[0][1], table.total[1]);
    }

    #[test]
    fn test_empty_table_has_only_total() {
        let rows: Vec<ExpenseRecord> = Vec::new();
        let table = ExportTable::build(&rows, &catalog(), 0.0);
        let body: Vec<&[String; 4]> = table.body().collect();
        assert_eq!(body, vec![&["Total", "$ 0.00", "", ""].map(String::from)]);
    }

    #[test]
    fn test_unparsable_amount_is_kept_verbatim() {
        let mut rec = renta();
        rec.amount = Some(Amount::Text("n/a".into()));
        let table = ExportTable::build([&rec], &catalog(), 0.0);
        assert_eq!(table.rows[0][1], "n/a");
    }

    #[test]
    fn test_export_writes_both_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirSink::new(dir.path().join("exports"));
        let rows = vec![renta()];
        let table = ExportTable::build(&rows, &catalog(), 100.0);
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();

        let pdf = export(ExportKind::Pdf, &table, &sink, now).unwrap();
        assert!(pdf.ends_with("control_gastos_pdf_2025-01-10T00-00-00-000Z.pdf"));
        assert!(std::fs::read(&pdf).unwrap().starts_with(b"%PDF"));

        let xlsx = export(ExportKind::Xlsx, &table, &sink, now).unwrap();
        assert!(std::fs::read(&xlsx).unwrap().starts_with(b"PK"));
    }

    struct FailingSink;

    impl ArtifactSink for FailingSink {
        fn save(&self, _filename: &str, _bytes: &[u8]) -> Result<PathBuf> {
            Err(std::io::Error::other("disk full").into())
        }
    }

    #[test]
    fn test_sink_failure_is_serialization_error() {
        let rows: Vec<ExpenseRecord> = Vec::new();
        let table = ExportTable::build(&rows, &catalog(), 0.0);
        let err = export(ExportKind::Pdf, &table, &FailingSink, Utc::now()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Serialization);
    }
}
