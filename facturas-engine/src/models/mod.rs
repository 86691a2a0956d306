//! Domain models for the invoicing core.

mod client;
mod invoice;
mod metrics;
mod payment;
mod product;
mod quote;

pub use client::Client;
pub use invoice::{
    CreateInvoice, FollowUpStatus, Invoice, InvoiceItem, InvoiceStatus, UpdateInvoice,
};
pub use metrics::{ClientRevenue, CurrencyTotals, DashboardMetrics, ProductSales};
pub use payment::{CreatePayment, Payment, PaymentMethod, PaymentStatus};
pub use product::Product;
pub use quote::{CreateQuote, Quote, UpdateQuote};
