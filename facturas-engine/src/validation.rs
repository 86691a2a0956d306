//! Structural and semantic validation for invoices, quotes and payments.
//!
//! Each entry point checks every rule in a single pass and returns either a
//! normalized payload or the full list of field violations, so callers can
//! correct their input in one round. Nothing is persisted on failure.

use crate::models::{
    CreateInvoice, CreatePayment, CreateQuote, InvoiceItem, UpdateInvoice, UpdateQuote,
};
use crate::money::MONEY_EPSILON;
use crate::services::metrics::VALIDATION_FAILURES_TOTAL;
use facturas_core::{AppError, Violations};
use rust_decimal::Decimal;
use validator::ValidateEmail;

fn check_client_name(name: &str, violations: &mut Violations) {
    if name.trim().is_empty() {
        violations.push("clientName", "must not be empty");
    }
}

fn check_client_email(email: &str, violations: &mut Violations) {
    if !email.trim().validate_email() {
        violations.push("clientEmail", "must be a well-formed email address");
    }
}

fn check_items(items: &[InvoiceItem], violations: &mut Violations) {
    if items.is_empty() {
        violations.push("items", "at least one item is required");
    }
    for (i, item) in items.iter().enumerate() {
        if item.quantity < Decimal::ZERO {
            violations.push(format!("items[{}].quantity", i), "must be zero or greater");
        }
        if item.unit_price < Decimal::ZERO {
            violations.push(format!("items[{}].unitPrice", i), "must be zero or greater");
        }
    }
}

fn check_non_negative(field: &str, amount: Decimal, violations: &mut Violations) {
    if amount < Decimal::ZERO {
        violations.push(field, "must be zero or greater");
    }
}

/// `total = subtotal - discountTotal + itbis`, within the money epsilon.
fn check_totals(
    subtotal: Decimal,
    discount_total: Option<Decimal>,
    itbis: Decimal,
    total: Decimal,
    violations: &mut Violations,
) {
    let expected = subtotal - discount_total.unwrap_or(Decimal::ZERO) + itbis;
    if (expected - total).abs() > *MONEY_EPSILON {
        violations.push("total", "must equal subtotal - discountTotal + itbis");
    }
}

fn check_amounts(
    subtotal: Decimal,
    discount_total: Option<Decimal>,
    itbis: Decimal,
    total: Decimal,
    violations: &mut Violations,
) {
    check_non_negative("subtotal", subtotal, violations);
    if let Some(discount) = discount_total {
        check_non_negative("discountTotal", discount, violations);
    }
    check_non_negative("itbis", itbis, violations);
    check_non_negative("total", total, violations);
    check_totals(subtotal, discount_total, itbis, total, violations);
}

fn finish<T>(entity: &str, normalized: T, violations: Violations) -> Result<T, AppError> {
    if violations.is_empty() {
        Ok(normalized)
    } else {
        VALIDATION_FAILURES_TOTAL
            .with_label_values(&[entity])
            .inc();
        Err(AppError::Validation(violations))
    }
}

/// Validate an invoice-creation payload and return it normalized
/// (trimmed client name/email).
pub fn validate_invoice_create(payload: &CreateInvoice) -> Result<CreateInvoice, AppError> {
    let mut violations = Violations::default();

    check_client_name(&payload.client_name, &mut violations);
    check_client_email(&payload.client_email, &mut violations);
    check_items(&payload.items, &mut violations);
    check_amounts(
        payload.subtotal,
        payload.discount_total,
        payload.itbis,
        payload.total,
        &mut violations,
    );

    let mut normalized = payload.clone();
    normalized.client_name = payload.client_name.trim().to_string();
    normalized.client_email = payload.client_email.trim().to_string();

    finish("invoice", normalized, violations)
}

/// Validate an invoice-update payload: same rules, applied per present
/// field. The target must reference an existing invoice; that lookup is the
/// ledger's job.
pub fn validate_invoice_update(payload: &UpdateInvoice) -> Result<UpdateInvoice, AppError> {
    let mut violations = Violations::default();

    if let Some(name) = &payload.client_name {
        check_client_name(name, &mut violations);
    }
    if let Some(email) = &payload.client_email {
        check_client_email(email, &mut violations);
    }
    if let Some(items) = &payload.items {
        check_items(items, &mut violations);
    }
    if let Some(subtotal) = payload.subtotal {
        check_non_negative("subtotal", subtotal, &mut violations);
    }
    if let Some(discount) = payload.discount_total {
        check_non_negative("discountTotal", discount, &mut violations);
    }
    if let Some(itbis) = payload.itbis {
        check_non_negative("itbis", itbis, &mut violations);
    }
    if let Some(total) = payload.total {
        check_non_negative("total", total, &mut violations);
    }
    // Consistency is only checkable when the whole total triple is present.
    if let (Some(subtotal), Some(itbis), Some(total)) =
        (payload.subtotal, payload.itbis, payload.total)
    {
        check_totals(subtotal, payload.discount_total, itbis, total, &mut violations);
    }

    let mut normalized = payload.clone();
    normalized.client_name = payload.client_name.as_deref().map(|s| s.trim().to_string());
    normalized.client_email = payload
        .client_email
        .as_deref()
        .map(|s| s.trim().to_string());

    finish("invoice", normalized, violations)
}

/// Validate a quote-creation payload. Quotes share the invoice rule set;
/// they simply carry no balance or status.
pub fn validate_quote_create(payload: &CreateQuote) -> Result<CreateQuote, AppError> {
    let mut violations = Violations::default();

    check_client_name(&payload.client_name, &mut violations);
    check_client_email(&payload.client_email, &mut violations);
    check_items(&payload.items, &mut violations);
    check_amounts(
        payload.subtotal,
        payload.discount_total,
        payload.itbis,
        payload.total,
        &mut violations,
    );

    let mut normalized = payload.clone();
    normalized.client_name = payload.client_name.trim().to_string();
    normalized.client_email = payload.client_email.trim().to_string();

    finish("quote", normalized, violations)
}

/// Validate a quote-update payload.
pub fn validate_quote_update(payload: &UpdateQuote) -> Result<UpdateQuote, AppError> {
    let mut violations = Violations::default();

    if let Some(name) = &payload.client_name {
        check_client_name(name, &mut violations);
    }
    if let Some(email) = &payload.client_email {
        check_client_email(email, &mut violations);
    }
    if let Some(items) = &payload.items {
        check_items(items, &mut violations);
    }
    if let Some(subtotal) = payload.subtotal {
        check_non_negative("subtotal", subtotal, &mut violations);
    }
    if let Some(discount) = payload.discount_total {
        check_non_negative("discountTotal", discount, &mut violations);
    }
    if let Some(itbis) = payload.itbis {
        check_non_negative("itbis", itbis, &mut violations);
    }
    if let Some(total) = payload.total {
        check_non_negative("total", total, &mut violations);
    }
    if let (Some(subtotal), Some(itbis), Some(total)) =
        (payload.subtotal, payload.itbis, payload.total)
    {
        check_totals(subtotal, payload.discount_total, itbis, total, &mut violations);
    }

    let mut normalized = payload.clone();
    normalized.client_name = payload.client_name.as_deref().map(|s| s.trim().to_string());
    normalized.client_email = payload
        .client_email
        .as_deref()
        .map(|s| s.trim().to_string());

    finish("quote", normalized, violations)
}

/// Validate a payment payload. The invoice reference is resolved by the
/// ledger when the payment is applied.
pub fn validate_payment(payload: &CreatePayment) -> Result<CreatePayment, AppError> {
    let mut violations = Violations::default();

    if payload.amount <= Decimal::ZERO {
        violations.push("amount", "must be greater than zero");
    }
    if payload.receipt_number.trim().is_empty() {
        violations.push("receiptNumber", "must not be empty");
    }
    if payload.payment_date.trim().is_empty() {
        violations.push("paymentDate", "must not be empty");
    }

    let mut normalized = payload.clone();
    normalized.receipt_number = payload.receipt_number.trim().to_string();

    finish("payment", normalized, violations)
}
