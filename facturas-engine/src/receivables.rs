//! Receivables selector: the collections follow-up view.

use crate::models::Invoice;
use crate::services::store::InvoiceStore;
use facturas_core::AppError;
use tracing::instrument;
use uuid::Uuid;

/// Return the owner's invoices with an outstanding balance, ordered by due
/// date ascending with the invoice id as a deterministic tiebreak.
///
/// An empty result is not an error. When the store cannot execute the
/// composite filter (ownership equality + balance range) this fails
/// `QueryUnavailable`; callers must treat that as retryable configuration
/// trouble, never as "no receivables".
#[instrument(skip(store), fields(owner_id = %owner_id))]
pub async fn get_receivables(
    store: &dyn InvoiceStore,
    owner_id: Uuid,
) -> Result<Vec<Invoice>, AppError> {
    let mut invoices = store
        .receivables_for(owner_id)
        .await
        .map_err(AppError::from)?;

    invoices.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then_with(|| a.invoice_id.cmp(&b.invoice_id))
    });

    Ok(invoices)
}
