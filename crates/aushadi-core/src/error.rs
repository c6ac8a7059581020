//! # Error Types
//!
//! Domain-specific error types for aushadi-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  aushadi-core errors (this file)                                    │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  aushadi-db errors (separate crate)                                 │
//! │  ├── DbError          - Infrastructure failures                     │
//! │  └── LedgerError      - CoreError ∪ DbError for coordinator calls   │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → LedgerError → host UI          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation and business-rule errors are raised before any I/O happens;
//! the caller can show them directly. Infrastructure errors abort a whole
//! commit and leave no partial state behind.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-facing messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale draft or revision carried no line items.
    #[error("sale has no line items")]
    EmptySale,

    /// Patient name was missing or blank.
    #[error("patient name is required")]
    MissingPatient,

    /// Line quantity was zero or negative.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(i64),

    /// Discount was negative or exceeded the subtotal.
    #[error("invalid discount {discount} against subtotal {subtotal}")]
    InvalidDiscount {
        discount: crate::Money,
        subtotal: crate::Money,
    },

    /// Partially-paid amount exceeded the bill total.
    #[error("paid amount {paid} exceeds total {total}")]
    OverPayment {
        paid: crate::Money,
        total: crate::Money,
    },

    /// Paid amount was negative.
    #[error("invalid paid amount: {0}")]
    InvalidPayment(crate::Money),

    /// A referenced stock lot does not exist.
    #[error("stock item not found: {0}")]
    StockNotFound(String),

    /// Insufficient stock to cover a line item.
    ///
    /// ## When This Occurs
    /// - Selling more tablets than the lot holds
    /// - A return revision increases a quantity past what is left in stock
    #[error("insufficient stock for {medicine}: available {available}, requested {requested}")]
    InsufficientStock {
        medicine: String,
        available: i64,
        requested: i64,
    },

    /// Sale not found.
    #[error("sale not found: {0}")]
    SaleNotFound(String),

    /// More than one sale shares a bill number.
    ///
    /// Bill numbers are human-readable search keys, not primary keys; when a
    /// lookup matches several sales the caller must disambiguate by internal
    /// id.
    #[error("bill number {0} matches more than one sale")]
    AmbiguousBillNumber(String),

    /// The acting user's role does not permit the operation.
    #[error("role {role:?} is not allowed to {action}")]
    Forbidden {
        role: crate::Role,
        action: &'static str,
    },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet format requirements; they are
/// raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., the same stock lot twice on one bill).
    #[error("{field} '{value}' appears more than once")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Money;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            medicine: "Paracetamol".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient stock for Paracetamol: available 3, requested 5"
        );

        let err = CoreError::OverPayment {
            paid: Money::from_paisa(5000),
            total: Money::from_paisa(3000),
        };
        assert_eq!(err.to_string(), "paid amount NPR 50.00 exceeds total NPR 30.00");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "medicineName".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
