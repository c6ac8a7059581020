//! # aushadi-core: Pure Business Logic for the Aushadi Sales Ledger
//!
//! This crate is the heart of the ledger. It contains all business rules as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                      Aushadi Architecture                          │
//! │                                                                    │
//! │  ┌──────────────────────────────────────────────────────────────┐ │
//! │  │                    Host front-end                            │ │
//! │  │   Stock UI ──► Sale UI ──► Returns UI ──► Insights UI        │ │
//! │  └──────────────────────────────┬───────────────────────────────┘ │
//! │                                 │                                  │
//! │  ┌──────────────────────────────▼───────────────────────────────┐ │
//! │  │               ★ aushadi-core (THIS CRATE) ★                  │ │
//! │  │                                                              │ │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────────────────┐  │ │
//! │  │  │  types  │ │  money  │ │ pricing  │ │     insights     │  │ │
//! │  │  │  Sale   │ │  Money  │ │  totals  │ │ filter/aggregate │  │ │
//! │  │  │  Stock  │ │ (paisa) │ │  splits  │ │     pipeline     │  │ │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └──────────────────┘  │ │
//! │  │                                                              │ │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS           │ │
//! │  └──────────────────────────────┬───────────────────────────────┘ │
//! │                                 │                                  │
//! │  ┌──────────────────────────────▼───────────────────────────────┐ │
//! │  │                aushadi-db (Database Layer)                   │ │
//! │  │      SQLite repositories + SalesLedger transactions          │ │
//! │  └──────────────────────────────────────────────────────────────┘ │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (StockItem, Sale, LineItem, Patient, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Totals, discounts, payment splits, bill numbers
//! - [`insights`] - Pure filter/aggregate pipeline over committed sales
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in paisa (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod insights;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use aushadi_core::Money` instead of
// `use aushadi_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Prefix for pharmacy sale bill numbers (`BILL-YYYYMMDD-NNNN`).
pub const SALE_BILL_PREFIX: &str = "BILL";

/// Prefix for lab receipt bill numbers (`LAB-YYYYMMDD-NNNN`).
pub const LAB_BILL_PREFIX: &str = "LAB";

/// Maximum distinct line items allowed on a single bill.
///
/// Keeps a runaway billing form from producing absurd transactions; also an
/// upper bound on the rows touched by one commit.
pub const MAX_BILL_ITEMS: usize = 100;

/// Maximum quantity of a single medicine on one line item.
///
/// Guards against a mistyped quantity (1000 instead of 10) draining a lot.
pub const MAX_ITEM_QUANTITY: i64 = 999;
