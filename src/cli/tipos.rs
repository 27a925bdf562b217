use comfy_table::{Cell, Table};

use crate::cli::{block_on, connect, flush_notices};
use crate::error::Result;
use crate::settings::load_settings;
use crate::view::ExpenseView;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let api = connect(&settings);
    let mut view = ExpenseView::new(settings.page_size());
    block_on(view.load_catalog(&api))?;
    flush_notices(&mut view)?;

    let mut table = Table::new();
    table.set_header(vec!["Clave", "Descripción"]);
    for t in view.catalog().iter() {
        table.add_row(vec![Cell::new(&t.key), Cell::new(&t.label)]);
    }
    println!("Tipos de pago\n{table}");
    Ok(())
}
