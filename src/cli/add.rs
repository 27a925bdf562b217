use crate::cli::{block_on, connect, flush_notices};
use crate::editor::{validate, Draft, ExpenseDraft, InstallmentDraft, RecordEditor, SubmitOutcome};
use crate::error::{GastosError, Result};
use crate::models::PaymentCatalog;
use crate::settings::load_settings;
use crate::view::ExpenseView;

fn submit(draft: Draft) -> Result<()> {
    // Required fields are checked before anything touches the network.
    validate(&draft, &PaymentCatalog::default())?;

    let settings = load_settings();
    let api = connect(&settings);
    let mut view = ExpenseView::new(settings.page_size());
    let mut editor = RecordEditor::new(draft);

    let outcome = block_on(async {
        if !view.load_catalog(&api).await {
            return None;
        }
        Some(view.submit(&mut editor, &api).await)
    })?;
    flush_notices(&mut view)?;

    match outcome {
        Some(SubmitOutcome::Invalid(_)) => Err(GastosError::Validation(editor.errors().clone())),
        Some(SubmitOutcome::Saved(Some(id))) if !editor.is_open() => {
            println!("ID: {id}");
            Ok(())
        }
        _ => Ok(()),
    }
}

pub fn simple(cantidad: String, tipo_pago: String, fecha: String, descripcion: String) -> Result<()> {
    submit(Draft::Simple(ExpenseDraft {
        amount: cantidad,
        payment_type: tipo_pago,
        date: fecha,
        description: descripcion,
    }))
}

pub fn installment(
    monto_compra: String,
    meses: String,
    tipo_pago: String,
    descripcion: String,
    inicio_pagos: String,
) -> Result<()> {
    submit(Draft::Installment(InstallmentDraft {
        purchase_amount: monto_compra,
        month_count: meses,
        payment_type: tipo_pago,
        description: descripcion,
        start_month: inicio_pagos,
    }))
}
