use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier assigned by the remote store. The API hands back either a
/// number or a string, and expects the same shape back on delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for RecordId {
    /// Numeric only when the text is the canonical form of the number, so
    /// ids like `007` go back to the server unchanged.
    fn from(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<i64>() {
            Ok(n) if n.to_string() == raw => Self::Int(n),
            _ => Self::Text(raw.to_string()),
        }
    }
}

/// Monetary value exactly as the server sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    /// Numeric value, `None` when the server sent something unparsable.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Text(s) => crate::aggregate::parse_number(s),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One row returned by the filter endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "cantidad", default)]
    pub amount: Option<Amount>,
    #[serde(rename = "tipo_pago", default, deserialize_with = "null_as_empty")]
    pub payment_type: String,
    #[serde(rename = "fecha", default, deserialize_with = "null_as_empty")]
    pub date: String,
    #[serde(rename = "descripcion", default, deserialize_with = "null_as_empty")]
    pub description: String,
}

impl ExpenseRecord {
    /// Raw text of a column, before any currency formatting. The payment
    /// type is resolved to its label through the catalog.
    pub fn cell(&self, column: Column, catalog: &PaymentCatalog) -> String {
        match column {
            Column::Date => self.date.clone(),
            Column::Amount => self.amount.as_ref().map(Amount::to_string).unwrap_or_default(),
            Column::PaymentType => catalog.label(&self.payment_type).to_string(),
            Column::Description => self.description.clone(),
        }
    }

    pub fn amount_value(&self) -> Option<f64> {
        self.amount.as_ref().and_then(Amount::value)
    }
}

/// Columns of the expense table, in display and export order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Date,
    Amount,
    PaymentType,
    Description,
}

impl Column {
    pub const ALL: [Column; 4] = [
        Column::Date,
        Column::Amount,
        Column::PaymentType,
        Column::Description,
    ];

    pub fn header(&self) -> &'static str {
        match self {
            Self::Date => "Fecha",
            Self::Amount => "Cantidad",
            Self::PaymentType => "Tipo de Pago",
            Self::Description => "Descripción",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentType {
    #[serde(rename = "clave")]
    pub key: String,
    #[serde(rename = "descripcion")]
    pub label: String,
}

/// Payment types fetched once per session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentCatalog {
    types: Vec<PaymentType>,
}

impl PaymentCatalog {
    pub fn new(types: Vec<PaymentType>) -> Self {
        Self { types }
    }

    /// Label for `key`, or the key itself when the catalog does not know it.
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.types
            .iter()
            .find(|t| t.key == key)
            .map(|t| t.label.as_str())
            .unwrap_or(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.types.iter().any(|t| t.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PaymentType> {
        self.types.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleExpense {
    #[serde(rename = "cantidad")]
    pub amount: f64,
    #[serde(rename = "tipo_pago")]
    pub payment_type: String,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "descripcion")]
    pub description: String,
}

/// Purchase paid in monthly installments ("meses sin intereses").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentExpense {
    #[serde(rename = "monto_compra")]
    pub purchase_amount: f64,
    #[serde(rename = "cantidad_meses")]
    pub month_count: u32,
    #[serde(rename = "tipo_pago")]
    pub payment_type: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "inicio_pagos")]
    pub start_month: u32,
}

/// A validated record ready to be submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum Expense {
    Simple(SimpleExpense),
    Installment(InstallmentExpense),
}

pub const MONTHS: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

/// Spanish month name for 1..=12.
pub fn month_name(month: u32) -> Option<&'static str> {
    let idx = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTHS.get(idx).copied()
}
