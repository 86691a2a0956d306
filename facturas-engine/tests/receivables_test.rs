//! Receivables selector tests.

mod common;

use common::{dec, invoice_payload, ledger, payment};
use facturas_core::AppError;
use facturas_engine::get_receivables;
use facturas_engine::money::Currency;
use facturas_engine::services::MemoryStore;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn returns_exactly_the_unpaid_subset_in_due_date_order() {
    let store = Arc::new(MemoryStore::new());
    let ledger = ledger(store.clone());
    let owner = Uuid::new_v4();
    let other_owner = Uuid::new_v4();

    let mut late = invoice_payload(owner, "Hotel Sol", "500", Currency::Dop);
    late.due_date = "2026-12-01".to_string();
    let late = ledger.create_invoice(late).await.unwrap();

    let mut soon = invoice_payload(owner, "Colmado Ruiz", "300", Currency::Dop);
    soon.due_date = "2026-09-01".to_string();
    let soon = ledger.create_invoice(soon).await.unwrap();

    let mut settled = invoice_payload(owner, "Panadería Mota", "100", Currency::Dop);
    settled.due_date = "2026-08-01".to_string();
    let settled = ledger.create_invoice(settled).await.unwrap();
    ledger
        .apply_payment(payment(settled.invoice_id, "100", Currency::Dop))
        .await
        .unwrap();

    let foreign = ledger
        .create_invoice(invoice_payload(other_owner, "Otro Negocio", "900", Currency::Dop))
        .await
        .unwrap();

    let receivables = get_receivables(store.as_ref(), owner).await.unwrap();

    let ids: Vec<_> = receivables.iter().map(|i| i.invoice_id).collect();
    assert_eq!(ids, vec![soon.invoice_id, late.invoice_id]);
    assert!(!ids.contains(&settled.invoice_id));
    assert!(!ids.contains(&foreign.invoice_id));
    assert!(receivables.iter().all(|i| i.balance_due > dec("0")));
}

#[tokio::test]
async fn partially_paid_invoices_remain_receivable() {
    let store = Arc::new(MemoryStore::new());
    let ledger = ledger(store.clone());
    let owner = Uuid::new_v4();

    let invoice = ledger
        .create_invoice(invoice_payload(owner, "Hotel Sol", "500", Currency::Usd))
        .await
        .unwrap();
    ledger
        .apply_payment(payment(invoice.invoice_id, "200", Currency::Usd))
        .await
        .unwrap();

    let receivables = get_receivables(store.as_ref(), owner).await.unwrap();
    assert_eq!(receivables.len(), 1);
    assert_eq!(receivables[0].balance_due, dec("300"));
}

#[tokio::test]
async fn no_receivables_yields_an_empty_sequence() {
    let store = Arc::new(MemoryStore::new());
    common::init_tracing();

    let receivables = get_receivables(store.as_ref(), Uuid::new_v4()).await.unwrap();
    assert!(receivables.is_empty());
}

#[tokio::test]
async fn missing_index_is_distinguishable_from_no_results() {
    let store = Arc::new(MemoryStore::new());
    common::init_tracing();
    store.drop_composite_index();

    let err = get_receivables(store.as_ref(), Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QueryUnavailable(_)));
}

#[tokio::test]
async fn due_date_ties_break_on_invoice_id() {
    let store = Arc::new(MemoryStore::new());
    let ledger = ledger(store.clone());
    let owner = Uuid::new_v4();

    let a = ledger
        .create_invoice(invoice_payload(owner, "Cliente A", "100", Currency::Dop))
        .await
        .unwrap();
    let b = ledger
        .create_invoice(invoice_payload(owner, "Cliente B", "100", Currency::Dop))
        .await
        .unwrap();

    // Same due date in the fixture; order must be stable across calls.
    let first = get_receivables(store.as_ref(), owner).await.unwrap();
    let second = get_receivables(store.as_ref(), owner).await.unwrap();
    let first_ids: Vec<_> = first.iter().map(|i| i.invoice_id).collect();
    let second_ids: Vec<_> = second.iter().map(|i| i.invoice_id).collect();

    assert_eq!(first_ids, second_ids);
    let mut expected = vec![a.invoice_id, b.invoice_id];
    expected.sort();
    assert_eq!(first_ids, expected);
}
