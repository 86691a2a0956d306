//! Invoice model and payload types.

use crate::models::Payment;
use crate::money::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Invoice status. Derived from the balance by the payment ledger; callers
/// never set it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pendiente,
    Parcial,
    Pagada,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pendiente => "pendiente",
            InvoiceStatus::Parcial => "parcial",
            InvoiceStatus::Pagada => "pagada",
        }
    }
}

/// Per-item follow-up state for the collections workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpStatus {
    Realizado,
    #[default]
    Pendiente,
}

/// Line item on an invoice.
///
/// Product fields are snapshots taken at invoicing time; the invoice stays
/// valid even if the product is later renamed or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    #[serde(default)]
    pub unit_cost: Option<Decimal>,
    #[serde(default)]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub final_price: Option<Decimal>,
    #[serde(default)]
    pub number_of_people: Option<u32>,
    #[serde(default)]
    pub follow_up_status: FollowUpStatus,
    #[serde(default)]
    pub is_tax_exempt: bool,
}

/// Invoice document.
///
/// The invoice owns its payment history as an ordered sequence; insertion
/// order is application order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub owner_id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    #[serde(default)]
    pub client_address: Option<String>,
    pub issue_date: String,
    pub due_date: String,
    pub items: Vec<InvoiceItem>,
    pub subtotal: Decimal,
    #[serde(default)]
    pub discount_total: Option<Decimal>,
    pub itbis: Decimal,
    pub total: Decimal,
    #[serde(default)]
    pub currency: Currency,
    pub balance_due: Decimal,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub quote_id: Option<Uuid>,
    #[serde(default)]
    pub include_itbis: bool,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub owner_id: Uuid,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub client_address: Option<String>,
    pub issue_date: String,
    pub due_date: String,
    pub items: Vec<InvoiceItem>,
    pub subtotal: Decimal,
    pub discount_total: Option<Decimal>,
    pub itbis: Decimal,
    pub total: Decimal,
    pub currency: Currency,
    pub include_itbis: bool,
    pub quote_id: Option<Uuid>,
}

/// Input for updating an invoice. Every field is optional except the target
/// id; currency, balance and status are never updatable through this path.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoice {
    pub invoice_id: Uuid,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_address: Option<String>,
    pub issue_date: Option<String>,
    pub due_date: Option<String>,
    pub items: Option<Vec<InvoiceItem>>,
    pub subtotal: Option<Decimal>,
    pub discount_total: Option<Decimal>,
    pub itbis: Option<Decimal>,
    pub total: Option<Decimal>,
    pub include_itbis: Option<bool>,
}
