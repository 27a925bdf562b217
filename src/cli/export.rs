use std::path::PathBuf;

use chrono::Utc;

use crate::cli::{block_on, connect, flush_notices, today, ExportFormat, FilterArgs, SortArgs};
use crate::error::Result;
use crate::export::DirSink;
use crate::settings::{load_settings, shellexpand_path};
use crate::view::ExpenseView;

pub fn run(
    format: ExportFormat,
    filter: FilterArgs,
    search: Option<String>,
    sort: SortArgs,
    output_dir: Option<String>,
) -> Result<()> {
    let settings = load_settings();
    let spec = filter.to_spec(today())?;
    let api = connect(&settings);

    let mut view = ExpenseView::new(settings.page_size());
    block_on(async {
        view.load_catalog(&api).await;
        view.refresh(&api, &spec).await;
    })?;
    flush_notices(&mut view)?;

    if let Some(text) = search {
        view.set_quick_filter(text);
    }
    view.set_sort(sort.to_sort());
    let dir = output_dir
        .map(|d| PathBuf::from(shellexpand_path(&d)))
        .unwrap_or_else(|| settings.export_path());
    view.export(format.into(), &DirSink::new(dir), Utc::now());
    flush_notices(&mut view)
}
