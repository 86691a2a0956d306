//! In-memory document store with per-document revisions.
//!
//! Conditional writes check the revision read by the caller, so racing
//! read-modify-write cycles serialize the way a transactional document
//! store would: the loser sees `WriteConflict` and retries from a fresh
//! read.

use crate::models::{Invoice, InvoiceStatus, Payment, Quote};
use crate::services::store::{InvoiceStore, StoreError, VersionedInvoice, VersionedQuote};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    invoices: HashMap<Uuid, (Invoice, u64)>,
    quotes: HashMap<Uuid, (Quote, u64)>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    composite_index_missing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the receivables composite query fail with `QueryUnavailable`,
    /// simulating a store without the required index.
    pub fn drop_composite_index(&self) {
        self.composite_index_missing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn insert_invoice(&self, invoice: Invoice) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.invoices.insert(invoice.invoice_id, (invoice, 1));
        Ok(())
    }

    async fn fetch_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<VersionedInvoice>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .invoices
            .get(&invoice_id)
            .map(|(invoice, revision)| VersionedInvoice {
                invoice: invoice.clone(),
                revision: *revision,
            }))
    }

    async fn update_invoice(
        &self,
        invoice: Invoice,
        expected_revision: u64,
    ) -> Result<Invoice, StoreError> {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .invoices
            .get_mut(&invoice.invoice_id)
            .ok_or(StoreError::NotFound {
                document_id: invoice.invoice_id,
            })?;

        if entry.1 != expected_revision {
            return Err(StoreError::WriteConflict {
                document_id: invoice.invoice_id,
            });
        }

        entry.0 = invoice;
        entry.1 += 1;
        Ok(entry.0.clone())
    }

    async fn commit_payment(
        &self,
        invoice_id: Uuid,
        expected_revision: u64,
        payment: Payment,
        new_balance: Decimal,
        new_status: InvoiceStatus,
    ) -> Result<Invoice, StoreError> {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .invoices
            .get_mut(&invoice_id)
            .ok_or(StoreError::NotFound {
                document_id: invoice_id,
            })?;

        if entry.1 != expected_revision {
            return Err(StoreError::WriteConflict {
                document_id: invoice_id,
            });
        }

        entry.0.payments.push(payment);
        entry.0.balance_due = new_balance;
        entry.0.status = new_status;
        entry.1 += 1;
        Ok(entry.0.clone())
    }

    async fn receivables_for(&self, owner_id: Uuid) -> Result<Vec<Invoice>, StoreError> {
        if self.composite_index_missing.load(Ordering::SeqCst) {
            return Err(StoreError::QueryUnavailable(
                "composite filter (ownerId equality + balanceDue range) requires an index"
                    .to_string(),
            ));
        }

        let inner = self.inner.lock().await;
        Ok(inner
            .invoices
            .values()
            .filter(|(invoice, _)| {
                invoice.owner_id == owner_id && invoice.balance_due > Decimal::ZERO
            })
            .map(|(invoice, _)| invoice.clone())
            .collect())
    }

    async fn insert_quote(&self, quote: Quote) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        inner.quotes.insert(quote.quote_id, (quote, 1));
        Ok(())
    }

    async fn fetch_quote(&self, quote_id: Uuid) -> Result<Option<VersionedQuote>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .quotes
            .get(&quote_id)
            .map(|(quote, revision)| VersionedQuote {
                quote: quote.clone(),
                revision: *revision,
            }))
    }

    async fn update_quote(
        &self,
        quote: Quote,
        expected_revision: u64,
    ) -> Result<Quote, StoreError> {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .quotes
            .get_mut(&quote.quote_id)
            .ok_or(StoreError::NotFound {
                document_id: quote.quote_id,
            })?;

        if entry.1 != expected_revision {
            return Err(StoreError::WriteConflict {
                document_id: quote.quote_id,
            });
        }

        entry.0 = quote;
        entry.1 += 1;
        Ok(entry.0.clone())
    }

    async fn mark_quote_converted(
        &self,
        quote_id: Uuid,
        expected_revision: u64,
        invoice_id: Uuid,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .quotes
            .get_mut(&quote_id)
            .ok_or(StoreError::NotFound {
                document_id: quote_id,
            })?;

        // The link is write-once: a matching revision implies it is still
        // unset, but the flag is checked as well so a non-bumping store
        // cannot convert twice.
        if entry.1 != expected_revision || entry.0.converted_invoice_id.is_some() {
            return Err(StoreError::WriteConflict {
                document_id: quote_id,
            });
        }

        entry.0.converted_invoice_id = Some(invoice_id);
        entry.1 += 1;
        Ok(())
    }
}
