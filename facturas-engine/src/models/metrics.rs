//! Derived dashboard metrics. A point-in-time projection over the invoice
//! set; recomputed on demand, never persisted or cached.

use crate::money::Currency;
use rust_decimal::Decimal;
use serde::Serialize;

/// An amount partitioned by currency.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CurrencyTotals {
    pub dop: Decimal,
    pub usd: Decimal,
}

impl CurrencyTotals {
    pub fn add(&mut self, currency: Currency, amount: Decimal) {
        match currency {
            Currency::Dop => self.dop += amount,
            Currency::Usd => self.usd += amount,
        }
    }

    pub fn get(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Dop => self.dop,
            Currency::Usd => self.usd,
        }
    }
}

/// Summed quantity sold for one product name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSales {
    pub product_name: String,
    pub quantity: Decimal,
}

/// Summed invoice totals for one client name within a single currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientRevenue {
    pub client_name: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardMetrics {
    /// Invoice totals issued in the reference calendar month, by currency.
    pub monthly_revenue: CurrencyTotals,
    /// Balance due across all unsettled invoices, by currency.
    pub outstanding_balance: CurrencyTotals,
    /// Top 5 products by summed item quantity, first-encountered order on ties.
    pub top_products: Vec<ProductSales>,
    /// Top 4 DOP clients plus an "Otros" rollup when more groups exist.
    pub top_clients_dop: Vec<ClientRevenue>,
    /// Top 4 USD clients plus an "Otros" rollup when more groups exist.
    pub top_clients_usd: Vec<ClientRevenue>,
    pub client_count: usize,
    pub product_count: usize,
}
