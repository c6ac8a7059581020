//! # aushadi-db: Database Layer for the Aushadi Sales Ledger
//!
//! SQLite persistence via `sqlx`, plus the [`SalesLedger`] transaction
//! coordinator that owns every multi-row mutation of the ledger.
//!
//! ## Architecture Position
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │                       Aushadi Data Flow                            │
//! │                                                                    │
//! │  Host call (commit_sale, report, ...)                              │
//! │       │                                                            │
//! │       ▼                                                            │
//! │  ┌──────────────────────────────────────────────────────────────┐ │
//! │  │                   aushadi-db (THIS CRATE)                    │ │
//! │  │                                                              │ │
//! │  │  ┌────────────┐   ┌──────────────┐   ┌───────────────────┐  │ │
//! │  │  │  Database  │   │ Repositories │   │    SalesLedger    │  │ │
//! │  │  │ (pool.rs)  │◄──│ stock, sale, │◄──│  one transaction  │  │ │
//! │  │  │ SqlitePool │   │ patient, lab │   │  per commit       │  │ │
//! │  │  └────────────┘   └──────────────┘   └───────────────────┘  │ │
//! │  └──────────────────────────────┬───────────────────────────────┘ │
//! │                                 │                                  │
//! │                                 ▼                                  │
//! │                      SQLite database (WAL)                         │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and ledger error types
//! - [`repository`] - Repository implementations (stock, sale, patient, lab)
//! - [`ledger`] - The transaction coordinator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aushadi_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/aushadi.db")).await?;
//!
//! let ledger = db.ledger();
//! let sale = ledger.commit_sale(&actor, &draft).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, LedgerError};
pub use ledger::{SalesLedger, SalesReport};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::lab::LabReceiptRepository;
pub use repository::patient::PatientRepository;
pub use repository::sale::SaleRepository;
pub use repository::stock::StockRepository;
