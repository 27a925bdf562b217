use chrono::NaiveDate;
use tracing::{info, warn};

use crate::aggregate::parse_number;
use crate::api::ExpenseApi;
use crate::error::{ErrorKind, FieldErrors, GastosError, Result};
use crate::models::{Expense, InstallmentExpense, PaymentCatalog, RecordId, SimpleExpense};
use crate::status::OpState;

/// Raw form input for a single payment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub amount: String,
    pub payment_type: String,
    pub date: String,
    pub description: String,
}

/// Raw form input for an installment purchase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallmentDraft {
    pub purchase_amount: String,
    pub month_count: String,
    pub payment_type: String,
    pub description: String,
    pub start_month: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draft {
    Simple(ExpenseDraft),
    Installment(InstallmentDraft),
}

impl Draft {
    /// Empty draft of the same shape.
    pub fn cleared(&self) -> Self {
        match self {
            Self::Simple(_) => Self::Simple(ExpenseDraft::default()),
            Self::Installment(_) => Self::Installment(InstallmentDraft::default()),
        }
    }
}

fn required<'a>(errors: &mut FieldErrors, field: &'static str, raw: &'a str, message: &str) -> Option<&'a str> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, message);
        None
    } else {
        Some(value)
    }
}

fn check_payment_type(errors: &mut FieldErrors, raw: &str, catalog: &PaymentCatalog) -> String {
    match required(errors, "tipo_pago", raw, "El tipo de pago es obligatorio.") {
        Some(key) if !catalog.is_empty() && !catalog.contains(key) => {
            errors.add("tipo_pago", "El tipo de pago no es válido.");
            String::new()
        }
        Some(key) => key.to_string(),
        None => String::new(),
    }
}

fn validate_simple(draft: &ExpenseDraft, catalog: &PaymentCatalog) -> Result<SimpleExpense> {
    let mut errors = FieldErrors::new();

    let amount = required(&mut errors, "cantidad", &draft.amount, "La cantidad es obligatoria.")
        .and_then(|raw| match parse_number(raw) {
            Some(n) if n >= 0.0 => Some(n),
            _ => {
                errors.add("cantidad", "La cantidad debe ser un número mayor o igual a cero.");
                None
            }
        });
    let payment_type = check_payment_type(&mut errors, &draft.payment_type, catalog);
    let description = required(
        &mut errors,
        "descripcion",
        &draft.description,
        "La descripción es obligatoria.",
    )
    .map(str::to_string);
    let date = required(&mut errors, "fecha", &draft.date, "La fecha es obligatoria.").and_then(|raw| {
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                errors.add("fecha", "La fecha debe tener el formato AAAA-MM-DD.");
                None
            }
        }
    });

    match (amount, description, date) {
        (Some(amount), Some(description), Some(date)) if errors.is_empty() => Ok(SimpleExpense {
            amount,
            payment_type,
            date,
            description,
        }),
        _ => Err(GastosError::Validation(errors)),
    }
}

fn validate_installment(draft: &InstallmentDraft, catalog: &PaymentCatalog) -> Result<InstallmentExpense> {
    let mut errors = FieldErrors::new();

    let purchase_amount = required(
        &mut errors,
        "monto_compra",
        &draft.purchase_amount,
        "El monto es obligatorio.",
    )
    .and_then(|raw| match parse_number(raw) {
        Some(n) if n >= 0.0 => Some(n),
        _ => {
            errors.add("monto_compra", "El monto debe ser un número mayor o igual a cero.");
            None
        }
    });
    let month_count = required(
        &mut errors,
        "cantidad_meses",
        &draft.month_count,
        "La cantidad de meses es obligatoria.",
    )
    .and_then(|raw| match raw.parse::<u32>() {
        Ok(n) if n > 0 => Some(n),
        _ => {
            errors.add("cantidad_meses", "La cantidad de meses debe ser un entero positivo.");
            None
        }
    });
    let payment_type = check_payment_type(&mut errors, &draft.payment_type, catalog);
    let description = required(
        &mut errors,
        "descripcion",
        &draft.description,
        "La descripción es obligatoria.",
    )
    .map(str::to_string);
    let start_month = required(
        &mut errors,
        "inicio_pagos",
        &draft.start_month,
        "El inicio de pagos es obligatorio.",
    )
    .and_then(|raw| match raw.parse::<u32>() {
        Ok(m) if (1..=12).contains(&m) => Some(m),
        _ => {
            errors.add("inicio_pagos", "El inicio de pagos debe ser un mes entre 1 y 12.");
            None
        }
    });

    match (purchase_amount, month_count, description, start_month) {
        (Some(purchase_amount), Some(month_count), Some(description), Some(start_month))
            if errors.is_empty() =>
        {
            Ok(InstallmentExpense {
                purchase_amount,
                month_count,
                payment_type,
                description,
                start_month,
            })
        }
        _ => Err(GastosError::Validation(errors)),
    }
}

/// Check every required field of `draft`. The rule set follows the draft's
/// shape. With a non-empty `catalog` the payment type must also exist in it.
pub fn validate(draft: &Draft, catalog: &PaymentCatalog) -> Result<Expense> {
    match draft {
        Draft::Simple(d) => validate_simple(d, catalog).map(Expense::Simple),
        Draft::Installment(d) => validate_installment(d, catalog).map(Expense::Installment),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Saved; the caller should refresh its rows. Carries the new id when
    /// the store reports one.
    Saved(Option<RecordId>),
    /// Blocked before any request was made.
    Invalid(FieldErrors),
    /// The store refused or could not be reached. The draft is untouched.
    Failed(ErrorKind, String),
    /// A previous submit has not finished.
    Busy,
}

/// Create form for either record shape.
#[derive(Debug, Clone)]
pub struct RecordEditor {
    draft: Draft,
    errors: FieldErrors,
    state: OpState,
    open: bool,
}

impl RecordEditor {
    pub fn new(draft: Draft) -> Self {
        Self {
            draft,
            errors: FieldErrors::new(),
            state: OpState::Idle,
            open: true,
        }
    }

    #[cfg(test)]
    pub fn simple() -> Self {
        Self::new(Draft::Simple(ExpenseDraft::default()))
    }

    #[cfg(test)]
    pub fn installment() -> Self {
        Self::new(Draft::Installment(InstallmentDraft::default()))
    }

    #[cfg(test)]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    #[cfg(test)]
    pub fn draft_mut(&mut self) -> &mut Draft {
        &mut self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[cfg(test)]
    pub fn state(&self) -> &OpState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub async fn submit<A: ExpenseApi>(&mut self, api: &A, catalog: &PaymentCatalog) -> SubmitOutcome {
        if self.state.is_busy() {
            return SubmitOutcome::Busy;
        }
        let expense = match validate(&self.draft, catalog) {
            Ok(expense) => expense,
            Err(GastosError::Validation(errors)) => {
                self.errors = errors.clone();
                return SubmitOutcome::Invalid(errors);
            }
            Err(other) => return SubmitOutcome::Failed(other.kind(), other.to_string()),
        };
        self.errors = FieldErrors::new();
        if self.state.begin().is_err() {
            return SubmitOutcome::Busy;
        }

        let result = match &expense {
            Expense::Simple(e) => api.create(e).await.map(Some),
            Expense::Installment(e) => api.create_installment(e).await.map(|_| None),
        };
        self.state.settle(&result);

        match result {
            Ok(id) => {
                info!(id = ?id, "record created");
                self.draft = self.draft.cleared();
                self.open = false;
                SubmitOutcome::Saved(id)
            }
            Err(e) => {
                warn!(error = %e, "record could not be saved");
                SubmitOutcome::Failed(e.kind(), e.to_string())
            }
        }
    }
}
