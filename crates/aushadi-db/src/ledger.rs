//! # Sales Ledger Transaction Coordinator
//!
//! Every multi-row mutation of the ledger goes through here, and each one
//! runs inside a single SQLite transaction: the stock reads, the
//! sufficiency checks and the writes are linearized, so two concurrent
//! sales racing on the same low-stock lot cannot both pass the check and
//! jointly oversell.
//!
//! ## Commit Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  commit_sale                                                        │
//! │                                                                     │
//! │  validate draft (no I/O) ── EmptySale / MissingPatient / ...        │
//! │       │                                                             │
//! │       ▼            BEGIN ──────────────────────────────┐            │
//! │  read stock rows        StockNotFound / InsufficientStock           │
//! │       │                                                │            │
//! │  snapshot lines, compute totals + payment split (core) │            │
//! │       │                                                │            │
//! │  reserve unique bill number (redraw on collision)      │            │
//! │       │                                                │            │
//! │  INSERT sale + items, UPDATE each stock quantity       │            │
//! │       │                                                │            │
//! │       ▼            COMMIT ─────────────────────────────┘            │
//! │  all-or-nothing: any failure rolls the whole commit back            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Returns run the same shape in reverse: the original sale is diffed
//! against the revision, stock deltas are applied symmetrically (a removed
//! line restores its full quantity; an increased quantity decrements
//! further and can fail the sufficiency check), and the sale document is
//! rewritten with every derived field recomputed.
//!
//! Once a commit begins it runs to completion or fails outright; there is
//! no cancellation point and never partial state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, LedgerResult};
use crate::repository::sale::{self, SaleRepository};
use crate::repository::stock;
use aushadi_core::insights::{self, SalesFilter, SalesSummary};
use aushadi_core::{
    pricing, validation, ActorContext, CoreError, LineItem, Role, Sale, SaleDraft,
    SALE_BILL_PREFIX,
};

/// Attempts at drawing an unused bill-number serial before giving up.
const BILL_NUMBER_ATTEMPTS: u32 = 8;

// =============================================================================
// Sales Ledger
// =============================================================================

/// The transaction coordinator for the sales ledger.
///
/// Obtained via [`crate::Database::ledger`]; cheap to clone.
#[derive(Debug, Clone)]
pub struct SalesLedger {
    pool: SqlitePool,
}

/// A filtered slice of the ledger plus its aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub sales: Vec<Sale>,
    pub summary: SalesSummary,
}

impl SalesLedger {
    /// Creates a new SalesLedger over a pool.
    pub fn new(pool: SqlitePool) -> Self {
        SalesLedger { pool }
    }

    // -------------------------------------------------------------------------
    // Sale Commit
    // -------------------------------------------------------------------------

    /// Commits a sale: inserts the sale document and decrements every
    /// touched stock lot, atomically.
    ///
    /// ## Failure Modes
    /// - validation (`EmptySale`, `MissingPatient`, `InvalidQuantity`,
    ///   duplicate lot, `InvalidDiscount`, `OverPayment`) - rejected before
    ///   any I/O
    /// - `StockNotFound` / `InsufficientStock` - inside the transaction,
    ///   nothing written
    /// - infrastructure - transaction rolls back, nothing written
    ///
    /// Line snapshots (name, brand, unit price) and every derived figure
    /// come from the stock rows and the pricing engine, never from the
    /// caller.
    pub async fn commit_sale(
        &self,
        actor: &ActorContext,
        draft: &SaleDraft,
    ) -> LedgerResult<Sale> {
        require_staff(actor, "commit sales")?;
        validation::validate_draft(draft)?;

        debug!(uid = %actor.uid, lines = draft.lines.len(), "Committing sale");

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Check-and-snapshot inside the transaction. The draft validator
        // rejected duplicate lots, so each read sees the lot exactly once.
        let mut medicines = Vec::with_capacity(draft.lines.len());
        let mut decrements = Vec::with_capacity(draft.lines.len());
        for line in &draft.lines {
            let lot = stock::fetch_tx(&mut tx, &line.stock_id)
                .await?
                .ok_or_else(|| CoreError::StockNotFound(line.stock_id.clone()))?;

            if !lot.can_cover(line.quantity) {
                return Err(CoreError::InsufficientStock {
                    medicine: lot.medicine_name,
                    available: lot.quantity,
                    requested: line.quantity,
                }
                .into());
            }

            let total = pricing::line_total(lot.price_per_tab, line.quantity)?;
            medicines.push(LineItem {
                stock_id: lot.id.clone(),
                medicine_name: lot.medicine_name.clone(),
                brand: lot.brand.clone(),
                price_per_tab: lot.price_per_tab,
                quantity: line.quantity,
                total,
            });
            decrements.push((lot.id, lot.quantity - line.quantity));
        }

        let subtotal = pricing::subtotal(&medicines);
        let total_amount = pricing::grand_total(subtotal, draft.discount)?;
        let split = pricing::split_payment(total_amount, draft.payment_type, draft.paid_amount)?;

        let bill_number = reserve_bill_number(&mut tx, now).await?;

        let persisted = Sale {
            id: sale::generate_sale_id(),
            bill_number,
            patient: draft.patient.clone(),
            medicines,
            discount: draft.discount,
            payment_type: draft.payment_type,
            paid_amount: split.paid_amount,
            credit_amount: split.credit_amount,
            total_amount,
            payment_method: draft.payment_method,
            sale_date: now,
            credit_resolved_date: None,
            last_updated: None,
            seller: actor.clone(),
        };

        sale::insert_tx(&mut tx, &persisted).await?;
        for (stock_id, new_quantity) in decrements {
            stock::set_quantity_tx(&mut tx, &stock_id, new_quantity, now).await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            id = %persisted.id,
            bill_number = %persisted.bill_number,
            total = %persisted.total_amount,
            items = persisted.medicines.len(),
            "Sale committed"
        );

        Ok(persisted)
    }

    // -------------------------------------------------------------------------
    // Return / Edit
    // -------------------------------------------------------------------------

    /// Processes a return: rewrites the sale from the revision and applies
    /// the compensating stock deltas, atomically. Admin only.
    ///
    /// The sale is addressed by its internal id; use
    /// [`SalesLedger::find_by_bill_number`] / [`SalesLedger::resolve_one_bill`]
    /// to turn a bill number from the counter into an id first.
    ///
    /// ## Quantity Diff
    /// For each lot on the ORIGINAL sale, `returned = original - revised`
    /// (a lot dropped from the revision returns its full quantity). A lot
    /// that only appears in the revision is a plain additional sale of that
    /// lot. Stock moves by `+returned`, which subtracts when the revision
    /// asks for more than before, and any move that would take a lot below
    /// zero fails the whole return with `InsufficientStock`.
    pub async fn commit_return(
        &self,
        actor: &ActorContext,
        sale_id: &str,
        revision: &SaleDraft,
    ) -> LedgerResult<Sale> {
        require_admin(actor, "process returns")?;
        validation::validate_draft(revision)?;

        debug!(uid = %actor.uid, sale_id = %sale_id, "Processing return");

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let original = sale::fetch_tx(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        // Rebuild line items. Lots kept from the original keep their frozen
        // snapshots (the price the patient actually paid); new lots are
        // snapshotted from stock like a fresh sale.
        let mut medicines = Vec::with_capacity(revision.lines.len());
        for line in &revision.lines {
            let snapshot = original
                .medicines
                .iter()
                .find(|orig| orig.stock_id == line.stock_id);

            let (medicine_name, brand, price_per_tab) = match snapshot {
                Some(orig) => (
                    orig.medicine_name.clone(),
                    orig.brand.clone(),
                    orig.price_per_tab,
                ),
                None => {
                    let lot = stock::fetch_tx(&mut tx, &line.stock_id)
                        .await?
                        .ok_or_else(|| CoreError::StockNotFound(line.stock_id.clone()))?;
                    (lot.medicine_name, lot.brand, lot.price_per_tab)
                }
            };

            let total = pricing::line_total(price_per_tab, line.quantity)?;
            medicines.push(LineItem {
                stock_id: line.stock_id.clone(),
                medicine_name,
                brand,
                price_per_tab,
                quantity: line.quantity,
                total,
            });
        }

        // Net stock movement per lot.
        let mut deltas: HashMap<String, i64> = HashMap::new();
        for orig in &original.medicines {
            let revised_quantity = revision
                .lines
                .iter()
                .find(|line| line.stock_id == orig.stock_id)
                .map(|line| line.quantity)
                .unwrap_or(0);
            deltas.insert(orig.stock_id.clone(), orig.quantity - revised_quantity);
        }
        for line in &revision.lines {
            deltas.entry(line.stock_id.clone()).or_insert(-line.quantity);
        }

        for (stock_id, returned) in &deltas {
            if *returned == 0 {
                continue;
            }
            let lot = stock::fetch_tx(&mut tx, stock_id)
                .await?
                .ok_or_else(|| CoreError::StockNotFound(stock_id.clone()))?;

            let new_quantity = lot.quantity + returned;
            if new_quantity < 0 {
                return Err(CoreError::InsufficientStock {
                    medicine: lot.medicine_name,
                    available: lot.quantity,
                    requested: -returned,
                }
                .into());
            }
            stock::set_quantity_tx(&mut tx, stock_id, new_quantity, now).await?;
        }

        let subtotal = pricing::subtotal(&medicines);
        let total_amount = pricing::grand_total(subtotal, revision.discount)?;
        let split =
            pricing::split_payment(total_amount, revision.payment_type, revision.paid_amount)?;

        let updated = Sale {
            id: original.id.clone(),
            bill_number: original.bill_number.clone(),
            patient: revision.patient.clone(),
            medicines,
            discount: revision.discount,
            payment_type: revision.payment_type,
            paid_amount: split.paid_amount,
            credit_amount: split.credit_amount,
            total_amount,
            payment_method: revision.payment_method,
            sale_date: original.sale_date,
            credit_resolved_date: original.credit_resolved_date,
            last_updated: Some(now),
            seller: original.seller.clone(),
        };

        sale::replace_tx(&mut tx, &updated).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(
            id = %updated.id,
            bill_number = %updated.bill_number,
            total = %updated.total_amount,
            "Return committed"
        );

        Ok(updated)
    }

    // -------------------------------------------------------------------------
    // Bill Deletion
    // -------------------------------------------------------------------------

    /// Deletes a bill and restores every line's quantity to stock,
    /// atomically. Admin only.
    pub async fn delete_bill(&self, actor: &ActorContext, sale_id: &str) -> LedgerResult<()> {
        require_admin(actor, "delete bills")?;

        debug!(uid = %actor.uid, sale_id = %sale_id, "Deleting bill");

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let sale = sale::fetch_tx(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        for line in &sale.medicines {
            let lot = stock::fetch_tx(&mut tx, &line.stock_id)
                .await?
                .ok_or_else(|| CoreError::StockNotFound(line.stock_id.clone()))?;
            stock::set_quantity_tx(&mut tx, &line.stock_id, lot.quantity + line.quantity, now)
                .await?;
        }

        sale::delete_tx(&mut tx, sale_id).await?;
        tx.commit().await.map_err(DbError::from)?;

        info!(sale_id = %sale_id, bill_number = %sale.bill_number, "Bill deleted, stock restored");

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Credit Resolution
    // -------------------------------------------------------------------------

    /// Clears an outstanding balance: `payment_type` becomes `FullyPaid`,
    /// `credit_amount` drops to zero and `credit_resolved_date` is stamped.
    ///
    /// Idempotent: a sale with no outstanding balance is returned unchanged.
    /// `paid_amount` keeps the historical figure of what changed hands at
    /// sale time.
    pub async fn resolve_credit(&self, actor: &ActorContext, sale_id: &str) -> LedgerResult<Sale> {
        require_staff(actor, "resolve credits")?;

        let repo = SaleRepository::new(self.pool.clone());
        let sale = repo
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        if !sale.has_outstanding_balance() {
            debug!(sale_id = %sale_id, "Credit already resolved, no-op");
            return Ok(sale);
        }

        let now = Utc::now();
        repo.mark_credit_resolved(sale_id, now).await?;

        let resolved = repo
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        info!(
            sale_id = %sale_id,
            bill_number = %resolved.bill_number,
            cleared = %sale.credit_amount,
            "Credit resolved"
        );

        Ok(resolved)
    }

    // -------------------------------------------------------------------------
    // Lookup & Reporting
    // -------------------------------------------------------------------------

    /// Finds every sale carrying a bill number (zero, one, or - if numbers
    /// collided historically - several).
    pub async fn find_by_bill_number(&self, bill_number: &str) -> LedgerResult<Vec<Sale>> {
        Ok(SaleRepository::new(self.pool.clone())
            .find_by_bill_number(bill_number)
            .await?)
    }

    /// Resolves a bill number to exactly one sale.
    ///
    /// Fails with `SaleNotFound` on zero matches and `AmbiguousBillNumber`
    /// on several - the caller must then disambiguate by internal id.
    pub async fn resolve_one_bill(&self, bill_number: &str) -> LedgerResult<Sale> {
        let mut matches = self.find_by_bill_number(bill_number).await?;
        match matches.len() {
            0 => Err(CoreError::SaleNotFound(bill_number.to_string()).into()),
            1 => Ok(matches.remove(0)),
            _ => Err(CoreError::AmbiguousBillNumber(bill_number.to_string()).into()),
        }
    }

    /// Loads the full ledger, newest first.
    pub async fn list_sales(&self) -> LedgerResult<Vec<Sale>> {
        Ok(SaleRepository::new(self.pool.clone()).list_all().await?)
    }

    /// Materializes the ledger and runs the insights pipeline over it.
    pub async fn report(&self, filter: &SalesFilter) -> LedgerResult<SalesReport> {
        let sales = self.list_sales().await?;
        let filtered = insights::filter_sales(&sales, filter, Utc::now());
        let summary = insights::summarize(&filtered);
        Ok(SalesReport {
            sales: filtered,
            summary,
        })
    }
}

// =============================================================================
// Authorization & Bill Numbers
// =============================================================================

fn require_staff(actor: &ActorContext, action: &'static str) -> Result<(), CoreError> {
    match actor.role {
        Role::Admin | Role::Staff => Ok(()),
        role => Err(CoreError::Forbidden { role, action }),
    }
}

fn require_admin(actor: &ActorContext, action: &'static str) -> Result<(), CoreError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(CoreError::Forbidden {
            role: actor.role,
            action,
        })
    }
}

/// Draws bill-number serials until one is free, probing inside the open
/// transaction. The UNIQUE index on `sales.bill_number` backstops the rare
/// case of two concurrent commits drawing the same serial.
async fn reserve_bill_number(
    conn: &mut SqliteConnection,
    now: DateTime<Utc>,
) -> LedgerResult<String> {
    for attempt in 0..BILL_NUMBER_ATTEMPTS {
        // ThreadRng is not Send, so it must not live across an await
        let serial: u16 = rand::thread_rng().gen_range(1000..10000);
        let candidate = pricing::bill_number(SALE_BILL_PREFIX, now, serial);

        if !sale::bill_number_exists_tx(conn, &candidate).await? {
            return Ok(candidate);
        }
        warn!(attempt, candidate = %candidate, "Bill number collision, redrawing");
    }

    Err(DbError::duplicate("bill_number", "serial space exhausted").into())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::stock::generate_stock_id;
    use aushadi_core::{
        DraftLine, Money, Patient, PaymentMethod, PaymentType, StockItem,
    };

    fn admin() -> ActorContext {
        ActorContext::new("admin-1", Role::Admin)
    }

    fn staff() -> ActorContext {
        ActorContext::new("staff-1", Role::Staff)
    }

    async fn seed_stock(db: &Database, name: &str, price_paisa: i64, quantity: i64) -> StockItem {
        let now = Utc::now();
        let item = StockItem {
            id: generate_stock_id(),
            medicine_name: name.into(),
            brand: "GPL".into(),
            expiry_date: None,
            price_per_tab: Money::from_paisa(price_paisa),
            quantity,
            stock_add_date: now,
            last_updated: now,
        };
        db.stock().insert(&item).await.unwrap();
        item
    }

    fn draft(lines: Vec<DraftLine>, payment_type: PaymentType, paid_paisa: i64) -> SaleDraft {
        SaleDraft {
            patient: Patient::named("Ram Thapa"),
            lines,
            discount: Money::zero(),
            payment_type,
            paid_amount: Money::from_paisa(paid_paisa),
            payment_method: PaymentMethod::Offline,
        }
    }

    #[tokio::test]
    async fn test_commit_sale_decrements_stock_and_derives_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger();
        let lot = seed_stock(&db, "Cetamol", 1000, 100).await;

        let sale = ledger
            .commit_sale(
                &staff(),
                &draft(vec![DraftLine::new(&lot.id, 3)], PaymentType::FullyPaid, 0),
            )
            .await
            .unwrap();

        assert_eq!(sale.total_amount.paisa(), 3000);
        assert_eq!(sale.paid_amount.paisa(), 3000);
        assert_eq!(sale.credit_amount.paisa(), 0);
        assert_eq!(sale.medicines.len(), 1);
        assert_eq!(sale.medicines[0].medicine_name, "Cetamol");
        assert!(sale.bill_number.starts_with("BILL-"));

        let after = db.stock().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 97);
    }

    #[tokio::test]
    async fn test_commit_sale_insufficient_stock_leaves_no_trace() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger();
        let lot = seed_stock(&db, "Cetamol", 1000, 5).await;

        let err = ledger
            .commit_sale(
                &staff(),
                &draft(vec![DraftLine::new(&lot.id, 6)], PaymentType::FullyPaid, 0),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            })
        ));

        // stock untouched, no sale document created
        let after = db.stock().get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 5);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_commit_sale_unknown_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger();

        let err = ledger
            .commit_sale(
                &staff(),
                &draft(vec![DraftLine::new("ghost", 1)], PaymentType::FullyPaid, 0),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Core(CoreError::StockNotFound(id)) if id == "ghost"
        ));
    }

    #[tokio::test]
    async fn test_delete_bill_round_trips_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger();
        let lot = seed_stock(&db, "Cetamol", 1000, 50).await;

        let sale = ledger
            .commit_sale(
                &staff(),
                &draft(vec![DraftLine::new(&lot.id, 8)], PaymentType::FullyPaid, 0),
            )
            .await
            .unwrap();
        assert_eq!(db.stock().get_by_id(&lot.id).await.unwrap().unwrap().quantity, 42);

        ledger.delete_bill(&admin(), &sale.id).await.unwrap();

        // stock back to exactly where it started, sale gone
        assert_eq!(db.stock().get_by_id(&lot.id).await.unwrap().unwrap().quantity, 50);
        assert!(db.sales().get_by_id(&sale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_return_reduced_quantity_restores_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger();
        let lot = seed_stock(&db, "Cetamol", 1000, 100).await;

        let sale = ledger
            .commit_sale(
                &staff(),
                &draft(vec![DraftLine::new(&lot.id, 3)], PaymentType::FullyPaid, 0),
            )
            .await
            .unwrap();
        assert_eq!(db.stock().get_by_id(&lot.id).await.unwrap().unwrap().quantity, 97);

        // patient keeps 1 tablet, returns 2
        let updated = ledger
            .commit_return(
                &admin(),
                &sale.id,
                &draft(vec![DraftLine::new(&lot.id, 1)], PaymentType::FullyPaid, 0),
            )
            .await
            .unwrap();

        assert_eq!(db.stock().get_by_id(&lot.id).await.unwrap().unwrap().quantity, 99);
        assert_eq!(updated.total_amount.paisa(), 1000);
        assert_eq!(updated.bill_number, sale.bill_number);
        assert!(updated.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_return_that_increases_quantity_decrements_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger();
        let lot = seed_stock(&db, "Cetamol", 1000, 10).await;

        let sale = ledger
            .commit_sale(
                &staff(),
                &draft(vec![DraftLine::new(&lot.id, 2)], PaymentType::FullyPaid, 0),
            )
            .await
            .unwrap();
        assert_eq!(db.stock().get_by_id(&lot.id).await.unwrap().unwrap().quantity, 8);

        // revised upward: 2 → 5, so three more tablets leave stock
        ledger
            .commit_return(
                &admin(),
                &sale.id,
                &draft(vec![DraftLine::new(&lot.id, 5)], PaymentType::FullyPaid, 0),
            )
            .await
            .unwrap();
        assert_eq!(db.stock().get_by_id(&lot.id).await.unwrap().unwrap().quantity, 5);

        // revising past what's left fails atomically
        let err = ledger
            .commit_return(
                &admin(),
                &sale.id,
                &draft(vec![DraftLine::new(&lot.id, 99)], PaymentType::FullyPaid, 0),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(db.stock().get_by_id(&lot.id).await.unwrap().unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_return_and_delete_require_admin() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger();
        let lot = seed_stock(&db, "Cetamol", 1000, 10).await;

        let sale = ledger
            .commit_sale(
                &staff(),
                &draft(vec![DraftLine::new(&lot.id, 1)], PaymentType::FullyPaid, 0),
            )
            .await
            .unwrap();

        let err = ledger
            .commit_return(
                &staff(),
                &sale.id,
                &draft(vec![DraftLine::new(&lot.id, 1)], PaymentType::FullyPaid, 0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::Forbidden { .. })));

        let err = ledger.delete_bill(&staff(), &sale.id).await.unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::Forbidden { .. })));
    }

    #[tokio::test]
    async fn test_resolve_credit_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger();
        let lot = seed_stock(&db, "Cetamol", 1000, 10).await;

        let sale = ledger
            .commit_sale(
                &staff(),
                &draft(vec![DraftLine::new(&lot.id, 4)], PaymentType::Credit, 0),
            )
            .await
            .unwrap();
        assert_eq!(sale.credit_amount.paisa(), 4000);
        assert_eq!(sale.paid_amount.paisa(), 0);

        let resolved = ledger.resolve_credit(&staff(), &sale.id).await.unwrap();
        assert_eq!(resolved.payment_type, PaymentType::FullyPaid);
        assert_eq!(resolved.credit_amount.paisa(), 0);
        assert!(resolved.credit_resolved_date.is_some());

        // reapplying changes nothing
        let again = ledger.resolve_credit(&staff(), &sale.id).await.unwrap();
        assert_eq!(again.payment_type, PaymentType::FullyPaid);
        assert_eq!(again.credit_amount.paisa(), 0);
        assert_eq!(again.credit_resolved_date, resolved.credit_resolved_date);
    }

    #[tokio::test]
    async fn test_resolve_one_bill() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger();
        let lot = seed_stock(&db, "Cetamol", 1000, 10).await;

        let sale = ledger
            .commit_sale(
                &staff(),
                &draft(vec![DraftLine::new(&lot.id, 1)], PaymentType::FullyPaid, 0),
            )
            .await
            .unwrap();

        let found = ledger.resolve_one_bill(&sale.bill_number).await.unwrap();
        assert_eq!(found.id, sale.id);

        let err = ledger.resolve_one_bill("BILL-19990101-0000").await.unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::SaleNotFound(_))));
    }
}
