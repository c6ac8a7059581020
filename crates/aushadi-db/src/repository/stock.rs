//! # Stock Repository
//!
//! Database operations for medicine stock lots.
//!
//! ## Key Operations
//! - CRUD for stock entry and editing
//! - Substring search over name and brand
//! - Expiring-lot listing for the stock table's expiry highlighting
//! - Crate-internal quantity writes used by the ledger inside its
//!   transactions (never exposed directly: a bare quantity write outside a
//!   commit would bypass the sufficiency check)

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use aushadi_core::{Money, StockItem};

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat row shape for `stock_items`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct StockRow {
    pub id: String,
    pub medicine_name: String,
    pub brand: String,
    pub expiry_date: Option<DateTime<Utc>>,
    pub price_per_tab_paisa: i64,
    pub quantity: i64,
    pub stock_add_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<StockRow> for StockItem {
    fn from(row: StockRow) -> Self {
        StockItem {
            id: row.id,
            medicine_name: row.medicine_name,
            brand: row.brand,
            expiry_date: row.expiry_date,
            price_per_tab: Money::from_paisa(row.price_per_tab_paisa),
            quantity: row.quantity,
            stock_add_date: row.stock_add_date,
            last_updated: row.last_updated,
        }
    }
}

const STOCK_COLUMNS: &str = "id, medicine_name, brand, expiry_date, price_per_tab_paisa, \
                             quantity, stock_add_date, last_updated";

// =============================================================================
// Repository
// =============================================================================

/// Repository for stock database operations.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Inserts a new stock lot.
    ///
    /// The caller constructs the full item (id via [`generate_stock_id`],
    /// dates stamped at entry time) and validates it with the core
    /// validators first.
    pub async fn insert(&self, item: &StockItem) -> DbResult<()> {
        debug!(id = %item.id, medicine = %item.medicine_name, "Inserting stock item");

        sqlx::query(
            r#"
            INSERT INTO stock_items (
                id, medicine_name, brand, expiry_date,
                price_per_tab_paisa, quantity, stock_add_date, last_updated
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.medicine_name)
        .bind(&item.brand)
        .bind(item.expiry_date)
        .bind(item.price_per_tab.paisa())
        .bind(item.quantity)
        .bind(item.stock_add_date)
        .bind(item.last_updated)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing stock lot (stock-edit dialog).
    ///
    /// Overwrites every editable field and stamps `last_updated`.
    pub async fn update(&self, item: &StockItem) -> DbResult<()> {
        debug!(id = %item.id, "Updating stock item");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE stock_items SET
                medicine_name = ?2,
                brand = ?3,
                expiry_date = ?4,
                price_per_tab_paisa = ?5,
                quantity = ?6,
                last_updated = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.medicine_name)
        .bind(&item.brand)
        .bind(item.expiry_date)
        .bind(item.price_per_tab.paisa())
        .bind(item.quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockItem", &item.id));
        }

        Ok(())
    }

    /// Gets a stock lot by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StockItem>> {
        let row: Option<StockRow> = sqlx::query_as(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock_items WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StockItem::from))
    }

    /// Lists stock lots sorted by medicine name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<StockItem>> {
        let rows: Vec<StockRow> = sqlx::query_as(&format!(
            "SELECT {STOCK_COLUMNS} FROM stock_items ORDER BY medicine_name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StockItem::from).collect())
    }

    /// Searches stock by medicine name or brand substring.
    ///
    /// Empty queries fall back to the plain listing.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<StockItem>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching stock");

        if query.is_empty() {
            return self.list(limit).await;
        }

        let pattern = format!("%{query}%");
        let rows: Vec<StockRow> = sqlx::query_as(&format!(
            r#"
            SELECT {STOCK_COLUMNS} FROM stock_items
            WHERE medicine_name LIKE ?1 OR brand LIKE ?1
            ORDER BY medicine_name
            LIMIT ?2
            "#
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Stock search returned items");
        Ok(rows.into_iter().map(StockItem::from).collect())
    }

    /// Lists lots expiring on or before the given date, soonest first.
    pub async fn expiring_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<StockItem>> {
        let rows: Vec<StockRow> = sqlx::query_as(&format!(
            r#"
            SELECT {STOCK_COLUMNS} FROM stock_items
            WHERE expiry_date IS NOT NULL AND expiry_date <= ?1
            ORDER BY expiry_date
            LIMIT ?2
            "#
        ))
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(StockItem::from).collect())
    }

    /// Counts stock lots (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction Helpers (ledger-internal)
// =============================================================================

/// Reads one stock row inside an open transaction.
pub(crate) async fn fetch_tx(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<StockItem>> {
    let row: Option<StockRow> = sqlx::query_as(&format!(
        "SELECT {STOCK_COLUMNS} FROM stock_items WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(row.map(StockItem::from))
}

/// Writes an absolute quantity inside an open transaction.
///
/// The ledger computes the new quantity from a row it read in the SAME
/// transaction, so this write is linearized with the sufficiency check.
pub(crate) async fn set_quantity_tx(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE stock_items SET quantity = ?2, last_updated = ?3 WHERE id = ?1",
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("StockItem", id));
    }

    Ok(())
}

/// Helper to generate a new stock lot ID.
pub fn generate_stock_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
