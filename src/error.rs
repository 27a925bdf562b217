use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Per-field validation messages, keyed by the wire name of the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    #[cfg(test)]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(())` when no field failed, otherwise the collected errors.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(GastosError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, v)| format!("{k}: {v}")).collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Coarse classification used when reporting a failure to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Transport,
    Serialization,
    Config,
}

impl ErrorKind {
    /// Process exit status for a command that failed with this kind.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Config => 1,
            Self::Validation => 2,
            Self::Transport => 3,
            Self::Serialization => 4,
        }
    }
}

#[derive(Error, Debug)]
pub enum GastosError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Another request is still in flight")]
    Busy,

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    /// Failure already worded for the user, keeping the kind of its cause.
    #[error("{message}")]
    Reported { kind: ErrorKind, message: String },

    #[error("{0}")]
    Other(String),
}

impl GastosError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Http(_) | Self::Status(_) | Self::Rejected(_) | Self::Json(_) | Self::Busy => {
                ErrorKind::Transport
            }
            Self::Pdf(_) | Self::Xlsx(_) | Self::Io(_) => ErrorKind::Serialization,
            Self::Reported { kind, .. } => *kind,
            Self::Settings(_) | Self::Other(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, GastosError>;
