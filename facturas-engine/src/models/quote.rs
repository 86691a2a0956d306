//! Quote model. A quote is an invoice-creation payload without balance or
//! status, plus free-text notes; it converts into at most one invoice.

use crate::models::{CreateInvoice, InvoiceItem};
use crate::money::Currency;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quote document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub quote_id: Uuid,
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
    #[serde(default)]
    pub include_itbis: bool,
    #[serde(default)]
    pub notes: Option<String>,
    /// Set exactly once when the quote is converted; never cleared.
    #[serde(default)]
    pub converted_invoice_id: Option<Uuid>,
    pub created_utc: DateTime<Utc>,
}

impl Quote {
    /// Build the invoice-creation payload for this quote, carrying the
    /// provenance link. Conversion is one-way and never reversed.
    pub fn to_invoice_payload(&self) -> CreateInvoice {
        CreateInvoice {
            owner_id: self.owner_id,
            client_id: self.client_id,
            client_name: self.client_name.clone(),
            client_email: self.client_email.clone(),
            client_address: self.client_address.clone(),
            issue_date: self.issue_date.clone(),
            due_date: self.due_date.clone(),
            items: self.items.clone(),
            subtotal: self.subtotal,
            discount_total: self.discount_total,
            itbis: self.itbis,
            total: self.total,
            currency: self.currency,
            include_itbis: self.include_itbis,
            quote_id: Some(self.quote_id),
        }
    }
}

/// Input for creating a quote.
#[derive(Debug, Clone)]
pub struct CreateQuote {
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
    pub notes: Option<String>,
}

/// Input for updating a quote. Converted quotes are immutable.
#[derive(Debug, Clone, Default)]
pub struct UpdateQuote {
    pub quote_id: Uuid,
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
    pub notes: Option<String>,
}
