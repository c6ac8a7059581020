//! # Sale Repository
//!
//! Database operations for sales and their line items.
//!
//! Reads are public; every write is a crate-internal transaction helper
//! driven by [`crate::ledger::SalesLedger`], because a sale write is never
//! valid on its own - it always travels with stock mutations.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  1. COMMIT      insert_tx()          sale + items + stock decrement │
//! │  2. RETURN      replace_tx()         rewrite + stock restore        │
//! │  3. RESOLVE     mark_credit_resolved()  status-only flip            │
//! │  4. DELETE      delete_tx()          remove + stock restore         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use aushadi_core::{
    ActorContext, LineItem, Money, Patient, PaymentMethod, PaymentType, Role, Sale,
};

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat row shape for `sales`. Patient fields are stored inline with a
/// `patient_` prefix; line items live in `sale_items`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SaleRow {
    pub id: String,
    pub bill_number: String,
    pub patient_name: String,
    pub patient_age: Option<i64>,
    pub patient_gender: Option<String>,
    pub patient_address: Option<String>,
    pub patient_phone: Option<String>,
    pub discount_paisa: i64,
    pub payment_type: PaymentType,
    pub paid_amount_paisa: i64,
    pub credit_amount_paisa: i64,
    pub total_amount_paisa: i64,
    pub payment_method: PaymentMethod,
    pub sale_date: DateTime<Utc>,
    pub credit_resolved_date: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub seller_uid: String,
    pub seller_role: Role,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SaleItemRow {
    pub sale_id: String,
    pub stock_id: String,
    pub medicine_name: String,
    pub brand: String,
    pub price_per_tab_paisa: i64,
    pub quantity: i64,
    pub total_paisa: i64,
}

impl From<SaleItemRow> for LineItem {
    fn from(row: SaleItemRow) -> Self {
        LineItem {
            stock_id: row.stock_id,
            medicine_name: row.medicine_name,
            brand: row.brand,
            price_per_tab: Money::from_paisa(row.price_per_tab_paisa),
            quantity: row.quantity,
            total: Money::from_paisa(row.total_paisa),
        }
    }
}

fn assemble(row: SaleRow, medicines: Vec<LineItem>) -> Sale {
    Sale {
        id: row.id,
        bill_number: row.bill_number,
        patient: Patient {
            name: row.patient_name,
            age: row.patient_age,
            gender: row.patient_gender,
            address: row.patient_address,
            phone: row.patient_phone,
        },
        medicines,
        discount: Money::from_paisa(row.discount_paisa),
        payment_type: row.payment_type,
        paid_amount: Money::from_paisa(row.paid_amount_paisa),
        credit_amount: Money::from_paisa(row.credit_amount_paisa),
        total_amount: Money::from_paisa(row.total_amount_paisa),
        payment_method: row.payment_method,
        sale_date: row.sale_date,
        credit_resolved_date: row.credit_resolved_date,
        last_updated: row.last_updated,
        seller: ActorContext {
            uid: row.seller_uid,
            role: row.seller_role,
        },
    }
}

const SALE_COLUMNS: &str = "id, bill_number, patient_name, patient_age, patient_gender, \
                            patient_address, patient_phone, discount_paisa, payment_type, \
                            paid_amount_paisa, credit_amount_paisa, total_amount_paisa, \
                            payment_method, sale_date, credit_resolved_date, last_updated, \
                            seller_uid, seller_role";

const ITEM_COLUMNS: &str = "sale_id, stock_id, medicine_name, brand, price_per_tab_paisa, \
                            quantity, total_paisa";

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale (with line items) by its internal ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let row: Option<SaleRow> =
            sqlx::query_as(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Vec<SaleItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY position"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(assemble(
            row,
            items.into_iter().map(LineItem::from).collect(),
        )))
    }

    /// Finds every sale carrying a bill number.
    ///
    /// Bill numbers are a human-readable search aid; the UNIQUE index means
    /// this normally returns zero or one sale, but callers must still
    /// disambiguate by internal id before mutating anything.
    pub async fn find_by_bill_number(&self, bill_number: &str) -> DbResult<Vec<Sale>> {
        debug!(bill_number = %bill_number, "Looking up sales by bill number");

        let rows: Vec<SaleRow> = sqlx::query_as(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE bill_number = ?1 ORDER BY sale_date DESC"
        ))
        .bind(bill_number)
        .fetch_all(&self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// Lists every sale, newest first, with line items attached.
    ///
    /// The insights pipeline runs over this materialized list; at pharmacy
    /// counter volume a full load is cheap and keeps filtering pure.
    pub async fn list_all(&self) -> DbResult<Vec<Sale>> {
        let rows: Vec<SaleRow> = sqlx::query_as(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY sale_date DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        self.attach_items(rows).await
    }

    /// Counts sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Flips an outstanding credit to fully paid. Guarded so a second
    /// application matches zero rows.
    ///
    /// Returns whether a row was updated.
    pub(crate) async fn mark_credit_resolved(
        &self,
        sale_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE sales SET
                payment_type = 'fullyPaid',
                credit_amount_paisa = 0,
                credit_resolved_date = ?2,
                last_updated = ?2
            WHERE id = ?1
              AND (
                    (payment_type = 'credit' AND credit_resolved_date IS NULL)
                 OR (payment_type = 'partiallyPaid' AND credit_amount_paisa > 0)
              )
            "#,
        )
        .bind(sale_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Bulk-attaches line items to a set of sale headers.
    async fn attach_items(&self, rows: Vec<SaleRow>) -> DbResult<Vec<Sale>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let items: Vec<SaleItemRow> = sqlx::query_as(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items ORDER BY sale_id, position"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut by_sale: HashMap<String, Vec<LineItem>> = HashMap::new();
        for item in items {
            by_sale
                .entry(item.sale_id.clone())
                .or_default()
                .push(LineItem::from(item));
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let medicines = by_sale.remove(&row.id).unwrap_or_default();
                assemble(row, medicines)
            })
            .collect())
    }
}

// =============================================================================
// Transaction Helpers (ledger-internal)
// =============================================================================

/// Reads a sale (with items) inside an open transaction.
pub(crate) async fn fetch_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let row: Option<SaleRow> =
        sqlx::query_as(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let items: Vec<SaleItemRow> = sqlx::query_as(&format!(
        "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY position"
    ))
    .bind(id)
    .fetch_all(conn)
    .await?;

    Ok(Some(assemble(
        row,
        items.into_iter().map(LineItem::from).collect(),
    )))
}

/// Probes a bill number inside an open transaction (collision retry loop).
pub(crate) async fn bill_number_exists_tx(
    conn: &mut SqliteConnection,
    bill_number: &str,
) -> DbResult<bool> {
    let exists: i64 =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sales WHERE bill_number = ?1)")
            .bind(bill_number)
            .fetch_one(conn)
            .await?;

    Ok(exists != 0)
}

/// Inserts a sale header and its line items inside an open transaction.
pub(crate) async fn insert_tx(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, bill_number = %sale.bill_number, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, bill_number,
            patient_name, patient_age, patient_gender, patient_address, patient_phone,
            discount_paisa, payment_type, paid_amount_paisa, credit_amount_paisa,
            total_amount_paisa, payment_method, sale_date, credit_resolved_date,
            last_updated, seller_uid, seller_role
        ) VALUES (
            ?1, ?2,
            ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15,
            ?16, ?17, ?18
        )
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.bill_number)
    .bind(&sale.patient.name)
    .bind(sale.patient.age)
    .bind(&sale.patient.gender)
    .bind(&sale.patient.address)
    .bind(&sale.patient.phone)
    .bind(sale.discount.paisa())
    .bind(sale.payment_type)
    .bind(sale.paid_amount.paisa())
    .bind(sale.credit_amount.paisa())
    .bind(sale.total_amount.paisa())
    .bind(sale.payment_method)
    .bind(sale.sale_date)
    .bind(sale.credit_resolved_date)
    .bind(sale.last_updated)
    .bind(&sale.seller.uid)
    .bind(sale.seller.role)
    .execute(&mut *conn)
    .await?;

    insert_items_tx(conn, &sale.id, &sale.medicines).await
}

/// Overwrites a sale header and rewrites its line items (return workflow).
pub(crate) async fn replace_tx(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, bill_number = %sale.bill_number, "Rewriting sale");

    sqlx::query(
        r#"
        UPDATE sales SET
            patient_name = ?2, patient_age = ?3, patient_gender = ?4,
            patient_address = ?5, patient_phone = ?6,
            discount_paisa = ?7, payment_type = ?8, paid_amount_paisa = ?9,
            credit_amount_paisa = ?10, total_amount_paisa = ?11,
            payment_method = ?12, credit_resolved_date = ?13, last_updated = ?14
        WHERE id = ?1
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.patient.name)
    .bind(sale.patient.age)
    .bind(&sale.patient.gender)
    .bind(&sale.patient.address)
    .bind(&sale.patient.phone)
    .bind(sale.discount.paisa())
    .bind(sale.payment_type)
    .bind(sale.paid_amount.paisa())
    .bind(sale.credit_amount.paisa())
    .bind(sale.total_amount.paisa())
    .bind(sale.payment_method)
    .bind(sale.credit_resolved_date)
    .bind(sale.last_updated)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
        .bind(&sale.id)
        .execute(&mut *conn)
        .await?;

    insert_items_tx(conn, &sale.id, &sale.medicines).await
}

/// Deletes a sale inside an open transaction; items cascade.
pub(crate) async fn delete_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

async fn insert_items_tx(
    conn: &mut SqliteConnection,
    sale_id: &str,
    medicines: &[LineItem],
) -> DbResult<()> {
    for (position, line) in medicines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, position, stock_id,
                medicine_name, brand, price_per_tab_paisa, quantity, total_paisa
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(sale_id)
        .bind(position as i64)
        .bind(&line.stock_id)
        .bind(&line.medicine_name)
        .bind(&line.brand)
        .bind(line.price_per_tab.paisa())
        .bind(line.quantity)
        .bind(line.total.paisa())
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Helper to generate a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}
