//! Store collaborator boundary.
//!
//! The persistence engine is external to this core: a document store keyed
//! by id, supporting equality filters, numeric range filters, and a
//! single-document conditional write. Production adapters live with the
//! embedding application; [`super::MemoryStore`] is the in-crate
//! implementation used by tests and embedders.

use crate::models::{Invoice, InvoiceStatus, Payment, Quote};
use async_trait::async_trait;
use facturas_core::AppError;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The conditional write lost against a concurrent writer; the caller
    /// must re-read and retry.
    #[error("conflicting concurrent write on document {document_id}")]
    WriteConflict { document_id: Uuid },

    /// The store cannot execute the required filter shape (e.g. a missing
    /// composite index). Distinct from an empty result.
    #[error("store cannot execute the required query: {0}")]
    QueryUnavailable(String),

    #[error("document {document_id} not found")]
    NotFound { document_id: Uuid },

    #[error("backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::WriteConflict { document_id } => AppError::ConcurrencyConflict {
                document_id: document_id.to_string(),
                attempts: 1,
            },
            StoreError::QueryUnavailable(reason) => AppError::QueryUnavailable(reason),
            StoreError::NotFound { document_id } => AppError::NotFound {
                entity: "document",
                id: document_id.to_string(),
            },
            StoreError::Backend(cause) => AppError::StoreError(cause),
        }
    }
}

/// An invoice read together with the revision a conditional write must match.
#[derive(Debug, Clone)]
pub struct VersionedInvoice {
    pub invoice: Invoice,
    pub revision: u64,
}

/// A quote read together with the revision a conditional write must match.
#[derive(Debug, Clone)]
pub struct VersionedQuote {
    pub quote: Quote,
    pub revision: u64,
}

/// Document store operations this core requires.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn insert_invoice(&self, invoice: Invoice) -> Result<(), StoreError>;

    async fn fetch_invoice(&self, invoice_id: Uuid)
        -> Result<Option<VersionedInvoice>, StoreError>;

    /// Replace the invoice document if its revision still matches.
    async fn update_invoice(
        &self,
        invoice: Invoice,
        expected_revision: u64,
    ) -> Result<Invoice, StoreError>;

    /// Atomically append a payment and write the new balance and status,
    /// conditional on the revision read beforehand. Either everything
    /// applies or nothing does.
    async fn commit_payment(
        &self,
        invoice_id: Uuid,
        expected_revision: u64,
        payment: Payment,
        new_balance: Decimal,
        new_status: InvoiceStatus,
    ) -> Result<Invoice, StoreError>;

    /// Composite filter: owner equality plus positive balance range.
    async fn receivables_for(&self, owner_id: Uuid) -> Result<Vec<Invoice>, StoreError>;

    async fn insert_quote(&self, quote: Quote) -> Result<(), StoreError>;

    async fn fetch_quote(&self, quote_id: Uuid) -> Result<Option<VersionedQuote>, StoreError>;

    /// Replace the quote document if its revision still matches.
    async fn update_quote(
        &self,
        quote: Quote,
        expected_revision: u64,
    ) -> Result<Quote, StoreError>;

    /// Record the one-way quote-to-invoice provenance link, conditional on
    /// the revision read beforehand and on the link still being unset.
    /// A concurrent conversion or edit surfaces as `WriteConflict`.
    async fn mark_quote_converted(
        &self,
        quote_id: Uuid,
        expected_revision: u64,
        invoice_id: Uuid,
    ) -> Result<(), StoreError>;
}
