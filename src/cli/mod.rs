pub mod add;
pub mod config;
pub mod delete;
pub mod export;
pub mod list;
pub mod tipos;

use std::future::Future;

use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use crate::api::HttpApi;
use crate::error::{FieldErrors, GastosError, Result};
use crate::export::ExportKind;
use crate::filter::{available_years, FilterForm, FilterSpec, Sort, SortOrder};
use crate::models::Column;
use crate::pager::PageSize;
use crate::settings::Settings;
use crate::view::{ExpenseView, NoticeLevel};

#[derive(Parser)]
#[command(name = "gastos", version, about = "Control de gastos: filter, total and export expense records.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List expenses for a month or a date range.
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        view: ViewArgs,
        #[command(flatten)]
        sort: SortArgs,
    },
    /// Record a single payment.
    Add {
        /// Amount paid
        #[arg(long, default_value = "")]
        cantidad: String,
        /// Payment type key (see `gastos tipos`)
        #[arg(long = "tipo-pago", default_value = "")]
        tipo_pago: String,
        /// Date: YYYY-MM-DD
        #[arg(long, default_value = "")]
        fecha: String,
        #[arg(long, default_value = "")]
        descripcion: String,
    },
    /// Record an installment purchase (meses sin intereses).
    AddMsi {
        /// Total purchase amount
        #[arg(long = "monto-compra", default_value = "")]
        monto_compra: String,
        /// Number of monthly installments
        #[arg(long, default_value = "")]
        meses: String,
        #[arg(long = "tipo-pago", default_value = "")]
        tipo_pago: String,
        #[arg(long, default_value = "")]
        descripcion: String,
        /// Month of the first installment (1-12)
        #[arg(long = "inicio-pagos", default_value = "")]
        inicio_pagos: String,
    },
    /// Delete a record by id.
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Export the filtered expenses to PDF or Excel.
    Export {
        #[arg(value_enum)]
        format: ExportFormat,
        #[command(flatten)]
        filter: FilterArgs,
        /// Quick-filter text applied before exporting
        #[arg(long)]
        search: Option<String>,
        #[command(flatten)]
        sort: SortArgs,
        /// Directory for the file (default: export_dir from settings)
        #[arg(long = "output-dir")]
        output_dir: Option<String>,
    },
    /// List the payment types known to the server.
    Tipos,
    /// Show or change persisted settings.
    Config {
        #[arg(long = "base-url")]
        base_url: Option<String>,
        #[arg(long = "export-dir")]
        export_dir: Option<String>,
        #[arg(long = "page-size")]
        page_size: Option<usize>,
    },
    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Pdf,
    Xlsx,
}

impl From<ExportFormat> for ExportKind {
    fn from(f: ExportFormat) -> Self {
        match f {
            ExportFormat::Pdf => ExportKind::Pdf,
            ExportFormat::Xlsx => ExportKind::Xlsx,
        }
    }
}

/// Monthly (`--year/--month`) or range (`--from/--to`) selection.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Year (default: current year)
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub year: Option<i32>,
    /// Month 1-12 (default: current month)
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub month: Option<u32>,
    /// Range start: YYYY-MM-DD
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Range end: YYYY-MM-DD
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Only this payment type key
    #[arg(long = "tipo-pago")]
    pub tipo_pago: Option<String>,
}

impl FilterArgs {
    pub fn to_form(&self, today: NaiveDate) -> FilterForm {
        let mut form = FilterForm::new(today);
        if self.from.is_some() || self.to.is_some() {
            form.reset();
            form.toggle_mode(false);
            form.start = self.from;
            form.end = self.to;
        } else {
            if self.year.is_some() {
                form.year = self.year;
            }
            if self.month.is_some() {
                form.month = self.month;
            }
        }
        form.payment_type = self.tipo_pago.clone();
        form
    }

    /// The year must be one the picker offers (see [`available_years`]).
    pub fn to_spec(&self, today: NaiveDate) -> Result<FilterSpec> {
        if let Some(year) = self.year {
            if !available_years(today.year()).contains(&year) {
                let mut errors = FieldErrors::new();
                errors.add("anio", "El año no es válido.");
                return Err(GastosError::Validation(errors));
            }
        }
        self.to_form(today).to_spec()
    }
}

#[derive(Args, Debug, Default)]
pub struct ViewArgs {
    /// Quick-filter text matched against every column
    #[arg(long)]
    pub search: Option<String>,
    /// Page number, starting at 1
    #[arg(long, default_value_t = 1)]
    pub page: usize,
    /// Rows per page: 5, 10 or 25 (default: from settings)
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SortField {
    Fecha,
    Cantidad,
    TipoPago,
    Descripcion,
}

impl From<SortField> for Column {
    fn from(f: SortField) -> Self {
        match f {
            SortField::Fecha => Column::Date,
            SortField::Cantidad => Column::Amount,
            SortField::TipoPago => Column::PaymentType,
            SortField::Descripcion => Column::Description,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct SortArgs {
    /// Sort rows by this column
    #[arg(long, value_enum)]
    pub sort: Option<SortField>,
    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,
}

impl SortArgs {
    pub fn to_sort(&self) -> Option<Sort> {
        self.sort.map(|field| Sort {
            column: field.into(),
            order: if self.desc { SortOrder::Descending } else { SortOrder::Ascending },
        })
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn page_size_or(arg: Option<usize>, settings: &Settings) -> Result<PageSize> {
    match arg {
        Some(n) => PageSize::try_from(n),
        None => Ok(settings.page_size()),
    }
}

pub(crate) fn connect(settings: &Settings) -> HttpApi {
    HttpApi::new(settings.base_url.clone())
}

/// Drive `fut` to completion on a fresh runtime.
pub(crate) fn block_on<F: Future>(fut: F) -> Result<F::Output> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(rt.block_on(fut))
}

/// Print queued success notices; turn queued errors into the command's
/// error. The first error decides the reported kind.
pub(crate) fn flush_notices(view: &mut ExpenseView) -> Result<()> {
    let mut kind = None;
    let mut errors = Vec::new();
    for notice in view.take_notices() {
        match notice.level {
            NoticeLevel::Success => println!("{}", notice.message.green()),
            NoticeLevel::Error(k) => {
                kind.get_or_insert(k);
                errors.push(notice.message);
            }
        }
    }
    match kind {
        None => Ok(()),
        Some(kind) => Err(GastosError::Reported { kind, message: errors.join("; ") }),
    }
}
