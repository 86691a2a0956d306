//! Dashboard aggregator: pure, read-only projections over the invoice set.

use crate::models::{
    Client, ClientRevenue, CurrencyTotals, DashboardMetrics, Invoice, InvoiceStatus, Product,
    ProductSales,
};
use crate::money::Currency;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

const TOP_PRODUCTS: usize = 5;
const TOP_CLIENTS: usize = 4;
const OTHERS_LABEL: &str = "Otros";

/// Dates are persisted as opaque ISO strings; only the leading
/// `YYYY-MM-DD` is meaningful for calendar bucketing.
fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    s.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

fn top_products(invoices: &[Invoice]) -> Vec<ProductSales> {
    let mut groups: Vec<ProductSales> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for invoice in invoices {
        for item in &invoice.items {
            match index.get(item.product_name.as_str()) {
                Some(&i) => groups[i].quantity += item.quantity,
                None => {
                    index.insert(item.product_name.as_str(), groups.len());
                    groups.push(ProductSales {
                        product_name: item.product_name.clone(),
                        quantity: item.quantity,
                    });
                }
            }
        }
    }

    // Stable sort keeps first-encountered order on equal quantities.
    groups.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    groups.truncate(TOP_PRODUCTS);
    groups
}

fn top_clients(invoices: &[Invoice], currency: Currency) -> Vec<ClientRevenue> {
    let mut groups: Vec<ClientRevenue> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for invoice in invoices {
        if invoice.currency != currency {
            continue;
        }
        match index.get(invoice.client_name.as_str()) {
            Some(&i) => groups[i].total += invoice.total,
            None => {
                index.insert(invoice.client_name.as_str(), groups.len());
                groups.push(ClientRevenue {
                    client_name: invoice.client_name.clone(),
                    total: invoice.total,
                });
            }
        }
    }

    groups.sort_by(|a, b| b.total.cmp(&a.total));

    if groups.len() > TOP_CLIENTS {
        let rest = groups.split_off(TOP_CLIENTS);
        groups.push(ClientRevenue {
            client_name: OTHERS_LABEL.to_string(),
            total: rest.iter().map(|c| c.total).sum(),
        });
    }

    groups
}

/// Derive the dashboard metrics from the full invoice set.
///
/// Pure function, no I/O. Returns `None` while the caller's data is still
/// loading; loading is an explicit flag, never inferred from emptiness, so
/// an empty-but-loaded invoice set yields all-zero metrics. `today` anchors
/// the "current calendar month" revenue bucket.
pub fn compute_metrics(
    invoices: &[Invoice],
    clients: &[Client],
    products: &[Product],
    is_loading: bool,
    today: NaiveDate,
) -> Option<DashboardMetrics> {
    if is_loading {
        return None;
    }

    let mut monthly_revenue = CurrencyTotals::default();
    let mut outstanding_balance = CurrencyTotals::default();

    for invoice in invoices {
        if let Some(issued) = parse_iso_date(&invoice.issue_date) {
            if issued.year() == today.year() && issued.month() == today.month() {
                monthly_revenue.add(invoice.currency, invoice.total);
            }
        }
        if invoice.status != InvoiceStatus::Pagada {
            outstanding_balance.add(invoice.currency, invoice.balance_due);
        }
    }

    Some(DashboardMetrics {
        monthly_revenue,
        outstanding_balance,
        top_products: top_products(invoices),
        top_clients_dop: top_clients(invoices, Currency::Dop),
        top_clients_usd: top_clients(invoices, Currency::Usd),
        client_count: clients.len(),
        product_count: products.len(),
    })
}
