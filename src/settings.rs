use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GastosError, Result};
use crate::pager::PageSize;

/// Overrides `base_url` for a single run.
pub const BACKEND_URL_ENV: &str = "GASTOS_BACKEND_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_export_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("gastos")
        .join("exports")
        .to_string_lossy()
        .to_string()
}

fn default_page_size() -> usize {
    PageSize::default().get()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            export_dir: default_export_dir(),
            page_size: default_page_size(),
        }
    }
}

impl Settings {
    /// Configured page size, or the default when the file holds something
    /// the table does not offer.
    pub fn page_size(&self) -> PageSize {
        PageSize::try_from(self.page_size).unwrap_or_default()
    }

    /// Replace `base_url` with `url` when it is set and non-blank.
    pub fn with_base_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        self
    }

    pub fn export_path(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.export_dir))
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("gastos")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Settings from `path`, falling back to defaults for anything missing or
/// unreadable.
pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

/// Stored settings with the environment override applied.
pub fn load_settings() -> Settings {
    load_settings_from(&settings_path()).with_base_url_override(std::env::var(BACKEND_URL_ENV).ok())
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| GastosError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}
