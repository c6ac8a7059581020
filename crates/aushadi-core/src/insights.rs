//! # Insights Engine
//!
//! Pure filter/aggregate pipeline over a materialized list of sales.
//!
//! ## Pipeline
//! ```text
//! all sales ──► date filter ──► payment filter ──► text search ──► sort desc
//!                                                                     │
//!                                                                     ▼
//!                                                                summarize()
//! ```
//!
//! The three filters are independent predicates applied as a conjunction;
//! composition order does not change the result set. `now` is an argument,
//! not a clock read, so every pipeline run is deterministic. Calendar
//! comparisons use the UTC date of the stored timestamps; the host can
//! localize `now` before calling if it wants local-day windows.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{PaymentType, Sale};

// =============================================================================
// Filters
// =============================================================================

/// Date window for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "date")]
pub enum DateFilter {
    /// No date restriction.
    #[default]
    All,
    /// Same calendar day as `now`.
    Day,
    /// Same month and year as `now`.
    Month,
    /// Same year as `now`.
    Year,
    /// Same calendar day as the supplied date.
    Custom(NaiveDate),
}

/// Payment-status restriction for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaymentFilter {
    /// No payment restriction.
    #[default]
    All,
    /// Fully-paid sales.
    FullyPaid,
    /// Partially-paid sales that still carry a balance.
    PartiallyPaid,
    /// Credit sales whose balance has not been resolved.
    Credit,
}

/// Combined filter input for one report run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesFilter {
    pub date: DateFilter,
    pub payment: PaymentFilter,
    /// Case-insensitive substring matched against patient name, any line's
    /// medicine name, or the bill number.
    pub search: Option<String>,
}

impl DateFilter {
    fn matches(&self, sale_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let sale = sale_date.date_naive();
        match self {
            DateFilter::All => true,
            DateFilter::Day => sale == now.date_naive(),
            DateFilter::Month => {
                sale.month() == now.month() && sale.year() == now.year()
            }
            DateFilter::Year => sale.year() == now.year(),
            DateFilter::Custom(date) => sale == *date,
        }
    }
}

impl PaymentFilter {
    fn matches(&self, sale: &Sale) -> bool {
        match self {
            PaymentFilter::All => true,
            PaymentFilter::FullyPaid => sale.payment_type == PaymentType::FullyPaid,
            PaymentFilter::PartiallyPaid => sale.has_partial_balance(),
            PaymentFilter::Credit => sale.is_unresolved_credit(),
        }
    }
}

fn matches_search(sale: &Sale, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    sale.patient.name.to_lowercase().contains(&needle)
        || sale
            .medicines
            .iter()
            .any(|line| line.medicine_name.to_lowercase().contains(&needle))
        || sale.bill_number.to_lowercase().contains(&needle)
}

// =============================================================================
// Pipeline
// =============================================================================

/// Runs the filter pipeline and returns matching sales, newest first.
pub fn filter_sales(sales: &[Sale], filter: &SalesFilter, now: DateTime<Utc>) -> Vec<Sale> {
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let mut filtered: Vec<Sale> = sales
        .iter()
        .filter(|sale| filter.date.matches(sale.sale_date, now))
        .filter(|sale| filter.payment.matches(sale))
        .filter(|sale| search.map_or(true, |needle| matches_search(sale, needle)))
        .cloned()
        .collect();

    filtered.sort_by(|a, b| b.sale_date.cmp(&a.sale_date));
    filtered
}

// =============================================================================
// Aggregates
// =============================================================================

/// Aggregates over a filtered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    /// Number of sales in the set.
    pub count: usize,
    /// Σ total_amount over the set.
    pub total_amount: Money,
    /// Σ total_amount over the unresolved-credit subset.
    pub fully_credit_amount: Money,
    /// Σ credit_amount over the partially-paid-with-balance subset.
    pub partially_credit_amount: Money,
}

/// Computes the standard report aggregates over a set of sales.
pub fn summarize(sales: &[Sale]) -> SalesSummary {
    SalesSummary {
        count: sales.len(),
        total_amount: sales.iter().map(|s| s.total_amount).sum(),
        fully_credit_amount: sales
            .iter()
            .filter(|s| s.is_unresolved_credit())
            .map(|s| s.total_amount)
            .sum(),
        partially_credit_amount: sales
            .iter()
            .filter(|s| s.has_partial_balance())
            .map(|s| s.credit_amount)
            .sum(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
