//! # Domain Types
//!
//! Core domain types for the Aushadi sales ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐      │
//! │  │   StockItem    │   │      Sale      │   │    LineItem    │      │
//! │  │  ────────────  │   │  ────────────  │   │  ────────────  │      │
//! │  │  id (UUID)     │   │  id (UUID)     │   │  stock_id (FK) │      │
//! │  │  medicine_name │   │  bill_number   │   │  name snapshot │      │
//! │  │  quantity ≥ 0  │   │  payment split │   │  price × qty   │      │
//! │  └────────────────┘   └────────────────┘   └────────────────┘      │
//! │                                                                     │
//! │  ┌────────────────┐   ┌────────────────┐   ┌────────────────┐      │
//! │  │  PaymentType   │   │ PaymentMethod  │   │      Role      │      │
//! │  │  fullyPaid     │   │  Offline       │   │  admin         │      │
//! │  │  partiallyPaid │   │  Online        │   │  staff         │      │
//! │  │  credit        │   └────────────────┘   │  lab           │      │
//! │  └────────────────┘                        └────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A sale has:
//! - `id`: UUID v4 - immutable, used for lookups and relations
//! - `bill_number`: human-readable receipt identifier, used for search only
//!
//! Wire names are camelCase to match the document shapes the host UI already
//! speaks (`billNumber`, `pricePerTab`, `creditAmount`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Payment Type
// =============================================================================

/// How a bill was settled at the counter.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "camelCase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum PaymentType {
    /// Paid in full at sale time.
    FullyPaid,
    /// Part paid now, the rest tracked as credit.
    PartiallyPaid,
    /// Nothing paid; the whole amount is credit.
    Credit,
}

// =============================================================================
// Payment Method
// =============================================================================

/// Payment channel. Stored verbatim (`Offline` / `Online`).
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PaymentMethod {
    /// Cash or card at the counter.
    Offline,
    /// Wallet / bank transfer.
    Online,
}

// =============================================================================
// Actor Context
// =============================================================================

/// Role of the acting user, as supplied by the host's auth provider.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Lab,
}

/// Identity of the user performing a ledger operation.
///
/// The ledger never reads ambient session state: the host resolves the
/// current user once and passes this into every call. Authorization checks
/// trust the supplied role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActorContext {
    pub uid: String,
    pub role: Role,
}

impl ActorContext {
    pub fn new(uid: impl Into<String>, role: Role) -> Self {
        ActorContext { uid: uid.into(), role }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Stock Item
// =============================================================================

/// One inventory lot of a medicine, tracked by remaining tablet quantity.
///
/// `quantity` is never negative; it is mutated only by sale commit
/// (decrement) and return/deletion (increment), plus explicit stock edits.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on bills and in search.
    pub medicine_name: String,

    /// Manufacturer / brand label.
    pub brand: String,

    /// Expiry date of the lot, if recorded.
    #[ts(as = "Option<String>")]
    pub expiry_date: Option<DateTime<Utc>>,

    /// Price per tablet in paisa.
    pub price_per_tab: Money,

    /// Remaining tablets in the lot.
    pub quantity: i64,

    /// When the lot was entered into stock.
    #[ts(as = "String")]
    pub stock_add_date: DateTime<Utc>,

    /// Last mutation of any field (sale, return, deletion, edit).
    #[ts(as = "String")]
    pub last_updated: DateTime<Utc>,
}

impl StockItem {
    /// Checks whether this lot can cover a requested quantity.
    #[inline]
    pub fn can_cover(&self, requested: i64) -> bool {
        self.quantity >= requested
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A line on a bill. Snapshot pattern: medicine name, brand and unit price
/// are frozen from the stock lot at commit time so the bill stays stable
/// when stock data changes later.
///
/// `total` is always `price_per_tab * quantity`, recomputed on every write
/// path - it is never taken from caller input.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Stock lot this line draws from.
    pub stock_id: String,
    /// Medicine name at time of sale (frozen).
    pub medicine_name: String,
    /// Brand at time of sale (frozen).
    pub brand: String,
    /// Unit price at time of sale (frozen).
    pub price_per_tab: Money,
    /// Tablets sold.
    pub quantity: i64,
    /// Line total (`price_per_tab * quantity`).
    pub total: Money,
}

// =============================================================================
// Patient
// =============================================================================

/// Patient details embedded in a sale. Only the name is mandatory.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub name: String,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

impl Patient {
    pub fn named(name: impl Into<String>) -> Self {
        Patient { name: name.into(), ..Patient::default() }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One committed point-of-sale transaction.
///
/// ## Invariants
/// - `total_amount = Σ line.total - discount`
/// - `credit_amount = total - paid` when partially paid, else 0
/// - an unresolved credit sale has `payment_type == Credit` and no
///   `credit_resolved_date`; resolution flips it to `FullyPaid` exactly once
///
/// ## Lifecycle
/// Created by sale commit; rewritten only by the return workflow; credit
/// resolution flips payment status; deleted only by explicit bill deletion
/// (which also restores stock).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    /// Human-readable receipt number (`BILL-YYYYMMDD-NNNN`). Unique in the
    /// store, but treated as a search key, not a primary key.
    pub bill_number: String,
    pub patient: Patient,
    pub medicines: Vec<LineItem>,
    pub discount: Money,
    pub payment_type: PaymentType,
    pub paid_amount: Money,
    pub credit_amount: Money,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
    /// Set once, when an outstanding credit is cleared.
    #[ts(as = "Option<String>")]
    pub credit_resolved_date: Option<DateTime<Utc>>,
    /// Set by the return workflow and credit resolution.
    #[ts(as = "Option<String>")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Who rang the sale up.
    pub seller: ActorContext,
}

impl Sale {
    /// A credit sale whose balance has not been cleared yet.
    #[inline]
    pub fn is_unresolved_credit(&self) -> bool {
        self.payment_type == PaymentType::Credit && self.credit_resolved_date.is_none()
    }

    /// A partially-paid sale that still carries a balance.
    #[inline]
    pub fn has_partial_balance(&self) -> bool {
        self.payment_type == PaymentType::PartiallyPaid && self.credit_amount.is_positive()
    }

    /// Anything still owed on this bill.
    #[inline]
    pub fn has_outstanding_balance(&self) -> bool {
        self.is_unresolved_credit() || self.has_partial_balance()
    }
}

// =============================================================================
// Sale Draft
// =============================================================================

/// One requested line on a draft: which lot, how many tablets.
///
/// Name, brand and unit price are NOT part of the draft - they are
/// snapshotted from the stock row at commit time.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DraftLine {
    pub stock_id: String,
    pub quantity: i64,
}

impl DraftLine {
    pub fn new(stock_id: impl Into<String>, quantity: i64) -> Self {
        DraftLine { stock_id: stock_id.into(), quantity }
    }
}

/// Caller input for a sale commit, and equally the full-replacement input
/// for a return (the return workflow rewrites the sale from one of these).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleDraft {
    pub patient: Patient,
    pub lines: Vec<DraftLine>,
    pub discount: Money,
    pub payment_type: PaymentType,
    /// Only meaningful for `PartiallyPaid`; ignored otherwise.
    pub paid_amount: Money,
    pub payment_method: PaymentMethod,
}

// =============================================================================
// Patient Record
// =============================================================================

/// A registered patient (OPD registration), outside the sales ledger proper.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub id: String,
    pub name: String,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    #[ts(as = "Option<String>")]
    pub appointment_date: Option<DateTime<Utc>>,
    /// OPD consultation fee.
    pub opd_price: Money,
    /// Registration slip number.
    pub bill_no: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Lab Receipt
// =============================================================================

/// One ordered test on a lab receipt.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LabTestLine {
    pub test_name: String,
    pub price: Money,
}

/// A committed lab billing receipt (`LAB-YYYYMMDD-NNNN`).
///
/// Simpler than a sale: no stock movement, no credit lifecycle. Totals are
/// still recomputed server-side on insert.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LabReceipt {
    pub id: String,
    pub bill_number: String,
    pub patient: Patient,
    pub tests: Vec<LabTestLine>,
    pub discount: Money,
    pub total_amount: Money,
    #[ts(as = "String")]
    pub receipt_date: DateTime<Utc>,
    pub created_by: ActorContext,
}

// =============================================================================
// Unit Tests
// =============================================================================
