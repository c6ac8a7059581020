//! # Pricing & Accounting Engine
//!
//! Pure functions computing line totals, bill totals, discount application
//! and the paid/credit split. No side effects; the transaction coordinator
//! in `aushadi-db` calls these inside its commits so every persisted figure
//! is derived here, never trusted from caller input.
//!
//! ## Where the numbers flow
//! ```text
//! price_per_tab × quantity ──► line_total ──► subtotal ──► grand_total
//!                                                 │            │
//!                                            (discount)        ▼
//!                                                        split_payment
//!                                                         │        │
//!                                                         ▼        ▼
//!                                                    paid_amount  credit_amount
//! ```

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{LineItem, PaymentType};

// =============================================================================
// Line & Bill Totals
// =============================================================================

/// Computes one line total: `price_per_tab * quantity`.
///
/// Fails with [`CoreError::InvalidQuantity`] if `quantity <= 0`.
///
/// ## Example
/// ```rust
/// use aushadi_core::{pricing, Money};
///
/// let total = pricing::line_total(Money::from_paisa(1000), 3).unwrap();
/// assert_eq!(total.paisa(), 3000);
/// assert!(pricing::line_total(Money::from_paisa(1000), 0).is_err());
/// ```
pub fn line_total(price_per_tab: Money, quantity: i64) -> CoreResult<Money> {
    if quantity <= 0 {
        return Err(CoreError::InvalidQuantity(quantity));
    }
    Ok(price_per_tab.multiply_quantity(quantity))
}

/// Sums the stored totals of a set of line items.
pub fn subtotal(lines: &[LineItem]) -> Money {
    lines.iter().map(|line| line.total).sum()
}

/// Applies a discount to a subtotal.
///
/// Fails with [`CoreError::InvalidDiscount`] if the discount is negative or
/// exceeds the subtotal - a bill can never go negative.
pub fn grand_total(subtotal: Money, discount: Money) -> CoreResult<Money> {
    if discount.is_negative() || discount > subtotal {
        return Err(CoreError::InvalidDiscount { discount, subtotal });
    }
    Ok(subtotal - discount)
}

// =============================================================================
// Payment Split
// =============================================================================

/// The paid/credit breakdown of a bill total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentSplit {
    pub paid_amount: Money,
    pub credit_amount: Money,
}

/// Splits a bill total into paid and credit portions.
///
/// ## Rules
/// - `FullyPaid`: paid = total, credit = 0. Any caller-supplied paid amount
///   is ignored - the counter collected the whole bill.
/// - `PartiallyPaid`: credit = total - paid. Fails with
///   [`CoreError::InvalidPayment`] if paid < 0 and
///   [`CoreError::OverPayment`] if paid > total.
/// - `Credit`: paid = 0, credit = total.
///
/// ## Example
/// ```rust
/// use aushadi_core::{pricing, Money, PaymentType};
///
/// let split =
///     pricing::split_payment(Money::from_paisa(3000), PaymentType::PartiallyPaid, Money::from_paisa(1000))
///         .unwrap();
/// assert_eq!(split.paid_amount.paisa(), 1000);
/// assert_eq!(split.credit_amount.paisa(), 2000);
/// ```
pub fn split_payment(
    total: Money,
    payment_type: PaymentType,
    paid_amount: Money,
) -> CoreResult<PaymentSplit> {
    match payment_type {
        PaymentType::FullyPaid => Ok(PaymentSplit {
            paid_amount: total,
            credit_amount: Money::zero(),
        }),
        PaymentType::PartiallyPaid => {
            if paid_amount.is_negative() {
                return Err(CoreError::InvalidPayment(paid_amount));
            }
            if paid_amount > total {
                return Err(CoreError::OverPayment { paid: paid_amount, total });
            }
            Ok(PaymentSplit {
                paid_amount,
                credit_amount: total - paid_amount,
            })
        }
        PaymentType::Credit => Ok(PaymentSplit {
            paid_amount: Money::zero(),
            credit_amount: total,
        }),
    }
}

// =============================================================================
// Bill Numbers
// =============================================================================

/// Formats a human-readable bill number: `{prefix}-{YYYYMMDD}-{NNNN}`.
///
/// The 4-digit serial is caller-supplied (the db layer draws it from an
/// RNG and retries on collision against the store's unique index), which
/// keeps this function pure.
///
/// ## Example
/// ```rust
/// use aushadi_core::pricing;
/// use chrono::{TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap();
/// assert_eq!(pricing::bill_number("BILL", now, 4821), "BILL-20260807-4821");
/// ```
pub fn bill_number(prefix: &str, now: DateTime<Utc>, serial: u16) -> String {
    format!("{}-{}-{:04}", prefix, now.format("%Y%m%d"), serial % 10000)
}

// =============================================================================
// Unit Tests
// =============================================================================
