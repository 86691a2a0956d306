//! facturas-engine: the invoice/payment ledger and aggregation core.
//!
//! Everything here is a function of its inputs plus the persisted
//! invoice/payment documents: validated payloads flow into the
//! [`ledger::PaymentLedger`], which owns every `balance_due`/`status`
//! mutation; the receivables selector and dashboard aggregator are
//! read-only projections over the same documents.

pub mod dashboard;
pub mod ledger;
pub mod models;
pub mod money;
pub mod receivables;
pub mod services;
pub mod validation;

pub use dashboard::compute_metrics;
pub use ledger::PaymentLedger;
pub use money::{Currency, Money};
pub use receivables::get_receivables;
