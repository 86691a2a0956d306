//! Payment ledger: the only writer of invoice balance and status.
//!
//! `apply_payment` is a transactional read-modify-write against the invoice
//! document: read the versioned invoice, compute the new balance and
//! status, then commit conditionally on the revision that was read. A
//! conflicting concurrent write restarts the cycle from a fresh read, up to
//! a configured bound.

use crate::models::{
    CreateInvoice, CreatePayment, CreateQuote, Invoice, InvoiceStatus, Payment, PaymentStatus,
    Quote, UpdateInvoice, UpdateQuote,
};
use crate::money::MONEY_EPSILON;
use crate::services::metrics::{
    INVOICES_TOTAL, INVOICE_AMOUNT_TOTAL, LEDGER_CONFLICTS_TOTAL, PAYMENTS_TOTAL,
    PAYMENT_AMOUNT_TOTAL, STORE_OP_DURATION,
};
use crate::services::store::{InvoiceStore, StoreError, VersionedInvoice, VersionedQuote};
use crate::validation;
use chrono::Utc;
use facturas_core::config::LedgerSettings;
use facturas_core::retry::RetryConfig;
use facturas_core::AppError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Recompute the invoice status from its balance.
///
/// `pendiente` -> `parcial` on a first partial payment, `parcial` ->
/// `pagada` when the balance reaches zero. `pagada` is terminal for the
/// payment sub-flow; no transition moves backward automatically.
fn derive_status(balance_due: Decimal, total: Decimal, has_payments: bool) -> InvoiceStatus {
    if balance_due <= *MONEY_EPSILON {
        InvoiceStatus::Pagada
    } else if has_payments && balance_due < total {
        InvoiceStatus::Parcial
    } else {
        InvoiceStatus::Pendiente
    }
}

pub struct PaymentLedger {
    store: Arc<dyn InvoiceStore>,
    settings: LedgerSettings,
    retry: RetryConfig,
}

impl PaymentLedger {
    pub fn new(store: Arc<dyn InvoiceStore>, settings: LedgerSettings) -> Self {
        let retry = RetryConfig {
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(settings.backoff_initial_ms),
            max_backoff: Duration::from_millis(settings.backoff_max_ms),
            ..RetryConfig::default()
        };
        Self {
            store,
            settings,
            retry,
        }
    }

    /// Bound a store round-trip by the configured timeout. A timed-out
    /// conditional write either fully applied or not at all; nothing
    /// partial is ever committed.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, AppError> {
        match timeout(self.settings.op_timeout(), fut).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::Timeout(self.settings.op_timeout())),
        }
    }

    async fn fetch_versioned(&self, invoice_id: Uuid) -> Result<VersionedInvoice, AppError> {
        self.bounded(self.store.fetch_invoice(invoice_id))
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: "invoice",
                id: invoice_id.to_string(),
            })
    }

    async fn fetch_versioned_quote(&self, quote_id: Uuid) -> Result<VersionedQuote, AppError> {
        self.bounded(self.store.fetch_quote(quote_id))
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: "quote",
                id: quote_id.to_string(),
            })
    }

    /// Build a fresh invoice from a validated payload. The id is assigned
    /// here; the balance starts at the full total and the status at
    /// `pendiente`.
    fn build_invoice(normalized: CreateInvoice) -> Invoice {
        Invoice {
            invoice_id: Uuid::new_v4(),
            owner_id: normalized.owner_id,
            client_id: normalized.client_id,
            client_name: normalized.client_name,
            client_email: normalized.client_email,
            client_address: normalized.client_address,
            issue_date: normalized.issue_date,
            due_date: normalized.due_date,
            items: normalized.items,
            subtotal: normalized.subtotal,
            discount_total: normalized.discount_total,
            itbis: normalized.itbis,
            total: normalized.total,
            currency: normalized.currency,
            balance_due: normalized.total,
            status: InvoiceStatus::Pendiente,
            payments: Vec::new(),
            quote_id: normalized.quote_id,
            include_itbis: normalized.include_itbis,
            created_utc: Utc::now(),
        }
    }

    async fn persist_invoice(&self, invoice: Invoice) -> Result<Invoice, AppError> {
        self.bounded(self.store.insert_invoice(invoice.clone()))
            .await?;

        INVOICES_TOTAL
            .with_label_values(&[invoice.status.as_str()])
            .inc();
        INVOICE_AMOUNT_TOTAL
            .with_label_values(&[invoice.currency.as_str()])
            .inc_by(invoice.total.to_f64().unwrap_or(0.0));

        info!(
            invoice_id = %invoice.invoice_id,
            total = %invoice.total,
            "Invoice created"
        );

        Ok(invoice)
    }

    /// Validate and persist a new invoice.
    #[instrument(skip(self, payload), fields(client = %payload.client_name, currency = %payload.currency))]
    pub async fn create_invoice(&self, payload: CreateInvoice) -> Result<Invoice, AppError> {
        let normalized = validation::validate_invoice_create(&payload)?;
        self.persist_invoice(Self::build_invoice(normalized)).await
    }

    /// Apply a validated update to an existing invoice. Balance and status
    /// are recomputed from the payment history so the ledger invariants
    /// hold; currency is not updatable.
    #[instrument(skip(self, payload), fields(invoice_id = %payload.invoice_id))]
    pub async fn update_invoice(&self, payload: UpdateInvoice) -> Result<Invoice, AppError> {
        let normalized = validation::validate_invoice_update(&payload)?;
        let versioned = self.fetch_versioned(normalized.invoice_id).await?;
        let mut invoice = versioned.invoice;

        let amounts_changed = normalized.subtotal.is_some()
            || normalized.discount_total.is_some()
            || normalized.itbis.is_some()
            || normalized.total.is_some();

        if let Some(name) = normalized.client_name {
            invoice.client_name = name;
        }
        if let Some(email) = normalized.client_email {
            invoice.client_email = email;
        }
        if let Some(address) = normalized.client_address {
            invoice.client_address = Some(address);
        }
        if let Some(issue_date) = normalized.issue_date {
            invoice.issue_date = issue_date;
        }
        if let Some(due_date) = normalized.due_date {
            invoice.due_date = due_date;
        }
        if let Some(items) = normalized.items {
            invoice.items = items;
        }
        if let Some(subtotal) = normalized.subtotal {
            invoice.subtotal = subtotal;
        }
        if normalized.discount_total.is_some() {
            invoice.discount_total = normalized.discount_total;
        }
        if let Some(itbis) = normalized.itbis {
            invoice.itbis = itbis;
        }
        if let Some(total) = normalized.total {
            invoice.total = total;
        }
        if let Some(include_itbis) = normalized.include_itbis {
            invoice.include_itbis = include_itbis;
        }

        // The merged document must still satisfy the totals invariant, and a
        // changed total must cover what has already been paid; otherwise the
        // balance would silently cap at zero and flip the status to pagada.
        let paid: Decimal = invoice.payments.iter().map(|p| p.amount).sum();
        let expected =
            invoice.subtotal - invoice.discount_total.unwrap_or(Decimal::ZERO) + invoice.itbis;
        let mut violations = facturas_core::Violations::default();
        if (expected - invoice.total).abs() > *MONEY_EPSILON {
            violations.push("total", "must equal subtotal - discountTotal + itbis");
        }
        if amounts_changed && invoice.total + *MONEY_EPSILON < paid {
            violations.push("total", "must not be less than the amount already paid");
        }
        if !violations.is_empty() {
            return Err(AppError::Validation(violations));
        }

        invoice.balance_due = (invoice.total - paid).max(Decimal::ZERO);
        invoice.status = derive_status(
            invoice.balance_due,
            invoice.total,
            !invoice.payments.is_empty(),
        );

        let updated = self
            .bounded(self.store.update_invoice(invoice, versioned.revision))
            .await?;

        info!(invoice_id = %updated.invoice_id, "Invoice updated");

        Ok(updated)
    }

    /// Apply a payment to an invoice.
    ///
    /// Overpayment is recorded in full in the payment history but never
    /// credited: the balance is capped at zero and the invoice can never go
    /// negative-due.
    #[instrument(skip(self, input), fields(invoice_id = %input.invoice_id, amount = %input.amount))]
    pub async fn apply_payment(&self, input: CreatePayment) -> Result<Invoice, AppError> {
        if input.amount <= Decimal::ZERO {
            return Err(AppError::InvalidAmount {
                amount: input.amount,
            });
        }

        let timer = STORE_OP_DURATION
            .with_label_values(&["apply_payment"])
            .start_timer();

        let mut attempt: u32 = 0;
        loop {
            let versioned = self.fetch_versioned(input.invoice_id).await?;
            let invoice = versioned.invoice;

            if input.currency != invoice.currency {
                return Err(AppError::CurrencyMismatch {
                    context: format!("invoice {}", invoice.invoice_id),
                    expected: invoice.currency.as_str().to_string(),
                    actual: input.currency.as_str().to_string(),
                });
            }

            if invoice.balance_due <= *MONEY_EPSILON {
                return Err(AppError::AlreadySettled {
                    invoice_id: invoice.invoice_id.to_string(),
                });
            }

            let remaining = invoice.balance_due - input.amount;
            let new_balance = if remaining <= *MONEY_EPSILON {
                Decimal::ZERO
            } else {
                remaining
            };
            let new_status = derive_status(new_balance, invoice.total, true);

            let payment = Payment {
                payment_id: Uuid::new_v4(),
                receipt_number: input.receipt_number.clone(),
                amount: input.amount,
                currency: input.currency,
                payment_date: input.payment_date.clone(),
                method: input.method,
                status: PaymentStatus::Pagado,
                note: input.note.clone(),
                image_url: input.image_url.clone(),
            };

            let commit = timeout(
                self.settings.op_timeout(),
                self.store.commit_payment(
                    invoice.invoice_id,
                    versioned.revision,
                    payment,
                    new_balance,
                    new_status,
                ),
            )
            .await;

            match commit {
                Err(_) => return Err(AppError::Timeout(self.settings.op_timeout())),
                Ok(Ok(updated)) => {
                    timer.observe_duration();
                    PAYMENTS_TOTAL
                        .with_label_values(&[input.method.as_str()])
                        .inc();
                    PAYMENT_AMOUNT_TOTAL
                        .with_label_values(&[input.currency.as_str()])
                        .inc_by(input.amount.to_f64().unwrap_or(0.0));
                    INVOICES_TOTAL
                        .with_label_values(&[updated.status.as_str()])
                        .inc();

                    info!(
                        invoice_id = %updated.invoice_id,
                        balance_due = %updated.balance_due,
                        status = updated.status.as_str(),
                        "Payment applied"
                    );

                    return Ok(updated);
                }
                Ok(Err(StoreError::WriteConflict { .. })) => {
                    LEDGER_CONFLICTS_TOTAL.inc();

                    if attempt >= self.retry.max_retries {
                        warn!(
                            invoice_id = %input.invoice_id,
                            attempts = attempt + 1,
                            "Giving up after conflicting concurrent writes"
                        );
                        return Err(AppError::ConcurrencyConflict {
                            document_id: input.invoice_id.to_string(),
                            attempts: attempt + 1,
                        });
                    }

                    let backoff = self.retry.backoff_duration(attempt);
                    warn!(
                        invoice_id = %input.invoice_id,
                        attempt = attempt + 1,
                        backoff_ms = backoff.as_millis() as u64,
                        "Conflicting concurrent write, retrying read-modify-write"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Ok(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Validate and persist a new quote.
    #[instrument(skip(self, payload), fields(client = %payload.client_name))]
    pub async fn create_quote(&self, payload: CreateQuote) -> Result<Quote, AppError> {
        let normalized = validation::validate_quote_create(&payload)?;

        let quote = Quote {
            quote_id: Uuid::new_v4(),
            owner_id: normalized.owner_id,
            client_id: normalized.client_id,
            client_name: normalized.client_name,
            client_email: normalized.client_email,
            client_address: normalized.client_address,
            issue_date: normalized.issue_date,
            due_date: normalized.due_date,
            items: normalized.items,
            subtotal: normalized.subtotal,
            discount_total: normalized.discount_total,
            itbis: normalized.itbis,
            total: normalized.total,
            currency: normalized.currency,
            include_itbis: normalized.include_itbis,
            notes: normalized.notes,
            converted_invoice_id: None,
            created_utc: Utc::now(),
        };

        self.bounded(self.store.insert_quote(quote.clone())).await?;

        info!(quote_id = %quote.quote_id, total = %quote.total, "Quote created");

        Ok(quote)
    }

    /// Apply a validated update to an existing quote. Converted quotes are
    /// immutable; the write is conditional on the revision read here, so a
    /// conversion landing in between can never be overwritten.
    #[instrument(skip(self, payload), fields(quote_id = %payload.quote_id))]
    pub async fn update_quote(&self, payload: UpdateQuote) -> Result<Quote, AppError> {
        let normalized = validation::validate_quote_update(&payload)?;

        let versioned = self.fetch_versioned_quote(normalized.quote_id).await?;
        let mut quote = versioned.quote;

        if quote.converted_invoice_id.is_some() {
            return Err(AppError::QuoteAlreadyConverted {
                quote_id: quote.quote_id.to_string(),
            });
        }

        if let Some(name) = normalized.client_name {
            quote.client_name = name;
        }
        if let Some(email) = normalized.client_email {
            quote.client_email = email;
        }
        if let Some(address) = normalized.client_address {
            quote.client_address = Some(address);
        }
        if let Some(issue_date) = normalized.issue_date {
            quote.issue_date = issue_date;
        }
        if let Some(due_date) = normalized.due_date {
            quote.due_date = due_date;
        }
        if let Some(items) = normalized.items {
            quote.items = items;
        }
        if let Some(subtotal) = normalized.subtotal {
            quote.subtotal = subtotal;
        }
        if normalized.discount_total.is_some() {
            quote.discount_total = normalized.discount_total;
        }
        if let Some(itbis) = normalized.itbis {
            quote.itbis = itbis;
        }
        if let Some(total) = normalized.total {
            quote.total = total;
        }
        if let Some(include_itbis) = normalized.include_itbis {
            quote.include_itbis = include_itbis;
        }
        if normalized.notes.is_some() {
            quote.notes = normalized.notes;
        }

        let updated = self
            .bounded(self.store.update_quote(quote, versioned.revision))
            .await?;

        info!(quote_id = %updated.quote_id, "Quote updated");

        Ok(updated)
    }

    /// Convert a quote into an invoice. One-way, at most once: the quote is
    /// claimed with a conditional write before the invoice is persisted, so
    /// a racing conversion loses cleanly and creates nothing.
    #[instrument(skip(self), fields(quote_id = %quote_id))]
    pub async fn convert_quote(&self, quote_id: Uuid) -> Result<Invoice, AppError> {
        let versioned = self.fetch_versioned_quote(quote_id).await?;
        let quote = versioned.quote;

        if quote.converted_invoice_id.is_some() {
            return Err(AppError::QuoteAlreadyConverted {
                quote_id: quote_id.to_string(),
            });
        }

        let normalized = validation::validate_invoice_create(&quote.to_invoice_payload())?;
        let invoice = Self::build_invoice(normalized);

        let claim = self
            .bounded(self.store.mark_quote_converted(
                quote_id,
                versioned.revision,
                invoice.invoice_id,
            ))
            .await;
        match claim {
            Ok(()) => {}
            // A concurrent conversion or edit got there first.
            Err(AppError::ConcurrencyConflict { .. }) => {
                return Err(AppError::QuoteAlreadyConverted {
                    quote_id: quote_id.to_string(),
                });
            }
            Err(e) => return Err(e),
        }

        let invoice = self.persist_invoice(invoice).await?;

        info!(
            quote_id = %quote_id,
            invoice_id = %invoice.invoice_id,
            "Quote converted to invoice"
        );

        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn status_follows_balance() {
        let total = dec("1000");
        assert_eq!(derive_status(total, total, false), InvoiceStatus::Pendiente);
        assert_eq!(derive_status(dec("600"), total, true), InvoiceStatus::Parcial);
        assert_eq!(derive_status(Decimal::ZERO, total, true), InvoiceStatus::Pagada);
        // Within epsilon of zero counts as settled.
        assert_eq!(
            derive_status(dec("0.0000005"), total, true),
            InvoiceStatus::Pagada
        );
    }
}
