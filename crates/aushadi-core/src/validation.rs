//! # Validation Module
//!
//! Input validation for the Aushadi ledger.
//!
//! Two layers, validated before any I/O happens:
//!
//! - field validators (`validate_*`) returning [`ValidationError`] - format
//!   and range checks for stock entry and search input
//! - [`validate_draft`] - the sale-level rules the transaction coordinator
//!   enforces before it opens a transaction (non-empty bill, named patient,
//!   positive quantities, no duplicate lots)
//!
//! The database schema repeats the hard constraints (`CHECK (quantity >= 0)`,
//! NOT NULL, UNIQUE) as a final backstop.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::SaleDraft;
use crate::{MAX_BILL_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a medicine name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_medicine_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "medicineName".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "medicineName".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a brand label. Same shape as medicine names.
pub fn validate_brand(brand: &str) -> ValidationResult<()> {
    let brand = brand.trim();

    if brand.is_empty() {
        return Err(ValidationError::Required {
            field: "brand".to_string(),
        });
    }

    if brand.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "brand".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a free-text search query.
///
/// Empty queries are fine (passthrough filter); very long ones are rejected
/// before they reach a LIKE clause.
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

/// Validates a UUID string.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a unit price for stock entry.
///
/// Prices must be strictly positive - a zero-priced lot is a data-entry
/// mistake, not a free item.
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "pricePerTab".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Draft Validation
// =============================================================================

/// Validates a sale draft (or return revision) before any I/O.
///
/// ## Checks, in order
/// 1. at least one line item ([`CoreError::EmptySale`])
/// 2. patient name present ([`CoreError::MissingPatient`])
/// 3. bill not absurdly large (bounded by [`MAX_BILL_ITEMS`])
/// 4. every quantity positive and within range
/// 5. no stock lot referenced twice - a duplicated lot would make the
///    sufficiency check read the same quantity twice and oversell
///
/// Stock existence and sufficiency are NOT checked here; those need the
/// store and happen inside the commit transaction.
pub fn validate_draft(draft: &SaleDraft) -> CoreResult<()> {
    if draft.lines.is_empty() {
        return Err(CoreError::EmptySale);
    }

    if draft.patient.name.trim().is_empty() {
        return Err(CoreError::MissingPatient);
    }

    if draft.lines.len() > MAX_BILL_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_BILL_ITEMS as i64,
        }
        .into());
    }

    let mut seen = std::collections::HashSet::with_capacity(draft.lines.len());
    for line in &draft.lines {
        if line.quantity <= 0 {
            return Err(CoreError::InvalidQuantity(line.quantity));
        }
        validate_quantity(line.quantity)?;
        if !seen.insert(line.stock_id.as_str()) {
            return Err(ValidationError::Duplicate {
                field: "stockId".to_string(),
                value: line.stock_id.clone(),
            }
            .into());
        }
    }

    if draft.discount.is_negative() {
        return Err(CoreError::InvalidDiscount {
            discount: draft.discount,
            subtotal: Money::zero(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DraftLine, Patient, PaymentMethod, PaymentType};

    fn draft(lines: Vec<DraftLine>) -> SaleDraft {
        SaleDraft {
            patient: Patient::named("Ram"),
            lines,
            discount: Money::zero(),
            payment_type: PaymentType::FullyPaid,
            paid_amount: Money::zero(),
            payment_method: PaymentMethod::Offline,
        }
    }

    #[test]
    fn test_validate_medicine_name() {
        assert!(validate_medicine_name("Cetamol 500mg").is_ok());
        assert!(validate_medicine_name("").is_err());
        assert!(validate_medicine_name("   ").is_err());
        assert!(validate_medicine_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Money::from_paisa(1)).is_ok());
        assert!(validate_price(Money::zero()).is_err());
        assert!(validate_price(Money::from_paisa(-100)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_draft_empty_sale() {
        assert!(matches!(validate_draft(&draft(vec![])), Err(CoreError::EmptySale)));
    }

    #[test]
    fn test_validate_draft_missing_patient() {
        let mut d = draft(vec![DraftLine::new("s1", 1)]);
        d.patient.name = "  ".into();
        assert!(matches!(validate_draft(&d), Err(CoreError::MissingPatient)));
    }

    #[test]
    fn test_validate_draft_bad_quantity() {
        let d = draft(vec![DraftLine::new("s1", 0)]);
        assert!(matches!(validate_draft(&d), Err(CoreError::InvalidQuantity(0))));
    }

    #[test]
    fn test_validate_draft_duplicate_stock_id() {
        let d = draft(vec![DraftLine::new("s1", 1), DraftLine::new("s1", 2)]);
        assert!(matches!(
            validate_draft(&d),
            Err(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));
    }

    #[test]
    fn test_validate_draft_ok() {
        let d = draft(vec![DraftLine::new("s1", 2), DraftLine::new("s2", 5)]);
        assert!(validate_draft(&d).is_ok());
    }
}
