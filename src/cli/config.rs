use crate::error::Result;
use crate::pager::PageSize;
use crate::settings::{load_settings_from, save_settings, settings_path, BACKEND_URL_ENV};

pub fn run(base_url: Option<String>, export_dir: Option<String>, page_size: Option<usize>) -> Result<()> {
    let mut settings = load_settings_from(&settings_path());
    let changed = base_url.is_some() || export_dir.is_some() || page_size.is_some();

    if let Some(url) = base_url {
        settings.base_url = url;
    }
    if let Some(dir) = export_dir {
        settings.export_dir = dir;
    }
    if let Some(n) = page_size {
        settings.page_size = PageSize::try_from(n)?.get();
    }
    if changed {
        save_settings(&settings)?;
        println!("Saved {}", settings_path().display());
    }

    println!("base_url:   {}", settings.base_url);
    println!("export_dir: {}", settings.export_dir);
    println!("page_size:  {}", settings.page_size);
    if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
        println!("({BACKEND_URL_ENV}={url} overrides base_url for this shell)");
    }
    Ok(())
}
