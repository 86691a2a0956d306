//! Validation tests: every violation is reported in a single pass.

mod common;

use common::{dec, init_tracing, invoice_payload, item, payment};
use facturas_core::AppError;
use facturas_engine::models::{CreateQuote, UpdateInvoice, UpdateQuote};
use facturas_engine::money::Currency;
use facturas_engine::validation::{
    validate_invoice_create, validate_invoice_update, validate_payment, validate_quote_create,
    validate_quote_update,
};
use rust_decimal::Decimal;
use uuid::Uuid;

fn violations_of(err: AppError) -> facturas_core::Violations {
    match err {
        AppError::Validation(v) => v,
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn invoice_create_reports_every_violation_at_once() {
    init_tracing();
    let owner = Uuid::new_v4();

    let mut payload = invoice_payload(owner, "  ", "1000", Currency::Dop);
    payload.client_email = "no-es-un-correo".to_string();
    payload.items.clear();
    payload.subtotal = dec("-5");
    payload.total = dec("123"); // inconsistent with subtotal + itbis

    let violations = violations_of(validate_invoice_create(&payload).unwrap_err());
    assert!(violations.contains_field("clientName"));
    assert!(violations.contains_field("clientEmail"));
    assert!(violations.contains_field("items"));
    assert!(violations.contains_field("subtotal"));
    assert!(violations.contains_field("total"));
    assert_eq!(violations.len(), 5);
}

#[test]
fn item_violations_carry_indexed_field_paths() {
    init_tracing();
    let owner = Uuid::new_v4();

    let mut payload = invoice_payload(owner, "Hotel Sol", "1000", Currency::Dop);
    payload.items = vec![item("Buffet", "2", "500"), item("Brindis", "-1", "-3")];

    let violations = violations_of(validate_invoice_create(&payload).unwrap_err());
    assert!(violations.contains_field("items[1].quantity"));
    assert!(violations.contains_field("items[1].unitPrice"));
    assert!(!violations.contains_field("items[0].quantity"));
}

#[test]
fn totals_are_checked_within_epsilon() {
    init_tracing();
    let owner = Uuid::new_v4();

    let mut payload = invoice_payload(owner, "Hotel Sol", "1000", Currency::Dop);
    payload.subtotal = dec("100");
    payload.itbis = dec("18");
    payload.discount_total = Some(dec("10"));
    payload.total = dec("108.0000004");
    payload.items = vec![item("Servicio", "1", "100")];

    let normalized = validate_invoice_create(&payload).unwrap();
    assert_eq!(normalized.total, dec("108.0000004"));

    payload.total = dec("108.01");
    let violations = violations_of(validate_invoice_create(&payload).unwrap_err());
    assert!(violations.contains_field("total"));
}

#[test]
fn normalization_trims_client_fields() {
    init_tracing();
    let owner = Uuid::new_v4();

    let mut payload = invoice_payload(owner, "  Hotel Sol  ", "1000", Currency::Dop);
    payload.client_email = " cliente@example.com ".to_string();

    let normalized = validate_invoice_create(&payload).unwrap();
    assert_eq!(normalized.client_name, "Hotel Sol");
    assert_eq!(normalized.client_email, "cliente@example.com");
}

#[test]
fn invoice_update_checks_only_present_fields() {
    init_tracing();

    let ok = UpdateInvoice {
        invoice_id: Uuid::new_v4(),
        due_date: Some("2026-10-01".to_string()),
        ..Default::default()
    };
    assert!(validate_invoice_update(&ok).is_ok());

    let bad = UpdateInvoice {
        invoice_id: Uuid::new_v4(),
        client_name: Some("   ".to_string()),
        subtotal: Some(dec("-1")),
        ..Default::default()
    };
    let violations = violations_of(validate_invoice_update(&bad).unwrap_err());
    assert!(violations.contains_field("clientName"));
    assert!(violations.contains_field("subtotal"));
    assert_eq!(violations.len(), 2);
}

#[test]
fn payment_requires_positive_amount_and_reference_fields() {
    init_tracing();

    let mut payload = payment(Uuid::new_v4(), "0", Currency::Dop);
    payload.receipt_number = " ".to_string();
    payload.payment_date = String::new();

    let violations = violations_of(validate_payment(&payload).unwrap_err());
    assert!(violations.contains_field("amount"));
    assert!(violations.contains_field("receiptNumber"));
    assert!(violations.contains_field("paymentDate"));

    let ok = payment(Uuid::new_v4(), "150.75", Currency::Usd);
    assert!(validate_payment(&ok).is_ok());
}

#[test]
fn quote_payloads_share_the_invoice_rule_set() {
    init_tracing();

    let quote = CreateQuote {
        owner_id: Uuid::new_v4(),
        client_id: Uuid::new_v4(),
        client_name: String::new(),
        client_email: "cliente@example.com".to_string(),
        client_address: None,
        issue_date: "2026-08-10".to_string(),
        due_date: "2026-09-10".to_string(),
        items: vec![],
        subtotal: Decimal::ZERO,
        discount_total: None,
        itbis: Decimal::ZERO,
        total: Decimal::ZERO,
        currency: Currency::Dop,
        include_itbis: false,
        notes: Some("ver disponibilidad".to_string()),
    };

    let violations = violations_of(validate_quote_create(&quote).unwrap_err());
    assert!(violations.contains_field("clientName"));
    assert!(violations.contains_field("items"));

    let bad_update = UpdateQuote {
        quote_id: Uuid::new_v4(),
        client_email: Some("tampoco-es-correo".to_string()),
        ..Default::default()
    };
    let violations = violations_of(validate_quote_update(&bad_update).unwrap_err());
    assert!(violations.contains_field("clientEmail"));
}
