use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{block_on, connect, flush_notices, page_size_or, today, FilterArgs, SortArgs, ViewArgs};
use crate::error::Result;
use crate::fmt::money;
use crate::models::{Column, ExpenseRecord, PaymentCatalog};
use crate::settings::load_settings;
use crate::view::ExpenseView;

fn amount_cell(row: &ExpenseRecord, catalog: &PaymentCatalog) -> Cell {
    let text = match row.amount_value() {
        Some(v) => money(v),
        None => row.cell(Column::Amount, catalog),
    };
    Cell::new(text).set_alignment(CellAlignment::Right)
}

pub(crate) fn render(view: &ExpenseView) -> Table {
    let catalog = view.catalog();
    let mut table = Table::new();
    let mut header: Vec<&str> = Column::ALL.iter().map(|c| c.header()).collect();
    header.push("ID");
    table.set_header(header);
    for row in view.visible_page() {
        table.add_row(vec![
            Cell::new(row.cell(Column::Date, catalog)),
            amount_cell(row, catalog),
            Cell::new(row.cell(Column::PaymentType, catalog)),
            Cell::new(row.cell(Column::Description, catalog)),
            Cell::new(row.id.as_ref().map(|id| id.to_string()).unwrap_or_default()),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total:".bold()),
        Cell::new(money(view.total()).bold()).set_alignment(CellAlignment::Right),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
    ]);
    table
}

pub fn run(filter: FilterArgs, args: ViewArgs, sort: SortArgs) -> Result<()> {
    let settings = load_settings();
    let spec = filter.to_spec(today())?;
    let size = page_size_or(args.page_size, &settings)?;
    let api = connect(&settings);

    let mut view = ExpenseView::new(settings.page_size());
    block_on(async {
        view.load_catalog(&api).await;
        view.refresh(&api, &spec).await;
    })?;
    flush_notices(&mut view)?;

    if let Some(text) = args.search {
        view.set_quick_filter(text);
    }
    view.set_sort(sort.to_sort());
    view.set_page_size(size);
    view.set_page(args.page.saturating_sub(1));

    println!("Consulta de Gastos: {}", spec.describe());
    if !view.quick_filter_text().is_empty() {
        println!("Búsqueda: {}", view.quick_filter_text());
    }
    println!("{}", render(&view));
    println!("{}", view.range_label());
    Ok(())
}
