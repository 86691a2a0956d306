//! Common fixtures for facturas-engine integration tests.

use facturas_core::config::LedgerSettings;
use facturas_engine::models::{CreateInvoice, CreatePayment, InvoiceItem, PaymentMethod};
use facturas_engine::money::Currency;
use facturas_engine::services::MemoryStore;
use facturas_engine::PaymentLedger;
use rust_decimal::Decimal;
use std::sync::{Arc, Once};
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,facturas_engine=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn item(name: &str, quantity: &str, unit_price: &str) -> InvoiceItem {
    InvoiceItem {
        product_id: Uuid::new_v4(),
        product_name: name.to_string(),
        quantity: dec(quantity),
        unit_price: dec(unit_price),
        unit_cost: None,
        discount: None,
        final_price: None,
        number_of_people: None,
        follow_up_status: Default::default(),
        is_tax_exempt: false,
    }
}

/// Invoice payload with consistent totals and no tax.
pub fn invoice_payload(
    owner_id: Uuid,
    client_name: &str,
    total: &str,
    currency: Currency,
) -> CreateInvoice {
    CreateInvoice {
        owner_id,
        client_id: Uuid::new_v4(),
        client_name: client_name.to_string(),
        client_email: "cliente@example.com".to_string(),
        client_address: None,
        issue_date: "2026-08-10".to_string(),
        due_date: "2026-09-10".to_string(),
        items: vec![item("Servicio", "1", total)],
        subtotal: dec(total),
        discount_total: None,
        itbis: Decimal::ZERO,
        total: dec(total),
        currency,
        include_itbis: false,
        quote_id: None,
    }
}

pub fn payment(invoice_id: Uuid, amount: &str, currency: Currency) -> CreatePayment {
    CreatePayment {
        invoice_id,
        receipt_number: "R-0001".to_string(),
        amount: dec(amount),
        currency,
        payment_date: "2026-08-15".to_string(),
        method: PaymentMethod::Efectivo,
        note: None,
        image_url: None,
    }
}

pub fn ledger(store: Arc<MemoryStore>) -> PaymentLedger {
    init_tracing();
    PaymentLedger::new(store, LedgerSettings::default())
}
