use std::io::Write;

use crate::cli::{block_on, connect, flush_notices};
use crate::error::Result;
use crate::models::RecordId;
use crate::settings::load_settings;
use crate::view::ExpenseView;

fn confirm(id: &RecordId) -> Result<bool> {
    println!("¿Estás seguro? No podrás revertir esta acción.");
    print!("Eliminar registro {id}? [s/N] ");
    std::io::stdout().flush()?;
    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim().to_lowercase().as_str(), "s" | "si" | "sí" | "y" | "yes"))
}

pub fn run(id: &str, yes: bool) -> Result<()> {
    let id = RecordId::from(id);
    if !yes && !confirm(&id)? {
        println!("Cancelado.");
        return Ok(());
    }

    let settings = load_settings();
    let api = connect(&settings);
    let mut view = ExpenseView::new(settings.page_size());
    block_on(view.delete(&api, &id))?;
    flush_notices(&mut view)
}
