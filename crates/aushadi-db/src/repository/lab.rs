//! # Lab Receipt Repository
//!
//! Lab billing receipts (`LAB-YYYYMMDD-NNNN`). Unlike pharmacy sales these
//! never touch stock and carry no credit lifecycle, so creation is a small
//! self-contained transaction here rather than a ledger operation. Totals
//! are still recomputed from the test prices server-side.

use chrono::Utc;
use rand::Rng;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult, LedgerError, LedgerResult};
use aushadi_core::{
    pricing, ActorContext, CoreError, LabReceipt, LabTestLine, Money, Patient, Role,
    ValidationError, LAB_BILL_PREFIX,
};

/// Attempts at drawing an unused bill-number serial before giving up.
const BILL_NUMBER_ATTEMPTS: u32 = 8;

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct LabReceiptRow {
    id: String,
    bill_number: String,
    patient_name: String,
    patient_age: Option<i64>,
    patient_gender: Option<String>,
    patient_address: Option<String>,
    patient_phone: Option<String>,
    discount_paisa: i64,
    total_amount_paisa: i64,
    receipt_date: chrono::DateTime<Utc>,
    created_by_uid: String,
    created_by_role: Role,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct LabTestRow {
    test_name: String,
    price_paisa: i64,
}

fn assemble(row: LabReceiptRow, tests: Vec<LabTestLine>) -> LabReceipt {
    LabReceipt {
        id: row.id,
        bill_number: row.bill_number,
        patient: Patient {
            name: row.patient_name,
            age: row.patient_age,
            gender: row.patient_gender,
            address: row.patient_address,
            phone: row.patient_phone,
        },
        tests,
        discount: Money::from_paisa(row.discount_paisa),
        total_amount: Money::from_paisa(row.total_amount_paisa),
        receipt_date: row.receipt_date,
        created_by: ActorContext {
            uid: row.created_by_uid,
            role: row.created_by_role,
        },
    }
}

const RECEIPT_COLUMNS: &str = "id, bill_number, patient_name, patient_age, patient_gender, \
                               patient_address, patient_phone, discount_paisa, \
                               total_amount_paisa, receipt_date, created_by_uid, \
                               created_by_role";

// =============================================================================
// Repository
// =============================================================================

/// Repository for lab billing receipts.
#[derive(Debug, Clone)]
pub struct LabReceiptRepository {
    pool: SqlitePool,
}

impl LabReceiptRepository {
    /// Creates a new LabReceiptRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LabReceiptRepository { pool }
    }

    /// Creates a lab receipt.
    ///
    /// ## What This Does
    /// 1. Validates: named patient, at least one test, non-negative prices
    /// 2. Recomputes `total_amount = Σ price - discount` (discount must not
    ///    exceed the test total)
    /// 3. Draws a fresh `LAB-` bill number, re-drawing on collision
    /// 4. Inserts the receipt and its test lines in one transaction
    pub async fn create(
        &self,
        created_by: &ActorContext,
        patient: Patient,
        tests: Vec<LabTestLine>,
        discount: Money,
    ) -> LedgerResult<LabReceipt> {
        if patient.name.trim().is_empty() {
            return Err(CoreError::MissingPatient.into());
        }
        if tests.is_empty() {
            return Err(LedgerError::from(ValidationError::Required {
                field: "tests".to_string(),
            }));
        }
        for test in &tests {
            if test.test_name.trim().is_empty() {
                return Err(LedgerError::from(ValidationError::Required {
                    field: "testName".to_string(),
                }));
            }
            if test.price.is_negative() {
                return Err(LedgerError::from(ValidationError::MustBePositive {
                    field: "price".to_string(),
                }));
            }
        }

        let subtotal: Money = tests.iter().map(|t| t.price).sum();
        let total = pricing::grand_total(subtotal, discount).map_err(LedgerError::from)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let mut bill_number = None;
        for attempt in 0..BILL_NUMBER_ATTEMPTS {
            // ThreadRng is not Send, so it must not live across an await
            let serial: u16 = rand::thread_rng().gen_range(1000..10000);
            let candidate = pricing::bill_number(LAB_BILL_PREFIX, now, serial);
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM lab_receipts WHERE bill_number = ?1)",
            )
            .bind(&candidate)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;

            if exists == 0 {
                bill_number = Some(candidate);
                break;
            }
            warn!(attempt, candidate = %candidate, "Lab bill number collision, redrawing");
        }
        let bill_number = bill_number
            .ok_or_else(|| DbError::duplicate("bill_number", "lab serial space exhausted"))?;

        let receipt = LabReceipt {
            id: Uuid::new_v4().to_string(),
            bill_number,
            patient,
            tests,
            discount,
            total_amount: total,
            receipt_date: now,
            created_by: created_by.clone(),
        };

        sqlx::query(
            r#"
            INSERT INTO lab_receipts (
                id, bill_number, patient_name, patient_age, patient_gender,
                patient_address, patient_phone, discount_paisa, total_amount_paisa,
                receipt_date, created_by_uid, created_by_role
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&receipt.id)
        .bind(&receipt.bill_number)
        .bind(&receipt.patient.name)
        .bind(receipt.patient.age)
        .bind(&receipt.patient.gender)
        .bind(&receipt.patient.address)
        .bind(&receipt.patient.phone)
        .bind(receipt.discount.paisa())
        .bind(receipt.total_amount.paisa())
        .bind(receipt.receipt_date)
        .bind(&receipt.created_by.uid)
        .bind(receipt.created_by.role)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        for (position, test) in receipt.tests.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO lab_receipt_tests (id, receipt_id, position, test_name, price_paisa)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&receipt.id)
            .bind(position as i64)
            .bind(&test.test_name)
            .bind(test.price.paisa())
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            id = %receipt.id,
            bill_number = %receipt.bill_number,
            total = %receipt.total_amount,
            "Lab receipt created"
        );

        Ok(receipt)
    }

    /// Gets a receipt (with tests) by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<LabReceipt>> {
        let row: Option<LabReceiptRow> = sqlx::query_as(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM lab_receipts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let tests = self.tests_for(&row.id).await?;
        Ok(Some(assemble(row, tests)))
    }

    /// Finds receipts by bill number (search aid, like sale bill numbers).
    pub async fn find_by_bill_number(&self, bill_number: &str) -> DbResult<Vec<LabReceipt>> {
        debug!(bill_number = %bill_number, "Looking up lab receipts by bill number");

        let rows: Vec<LabReceiptRow> = sqlx::query_as(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM lab_receipts WHERE bill_number = ?1"
        ))
        .bind(bill_number)
        .fetch_all(&self.pool)
        .await?;

        let mut receipts = Vec::with_capacity(rows.len());
        for row in rows {
            let tests = self.tests_for(&row.id).await?;
            receipts.push(assemble(row, tests));
        }
        Ok(receipts)
    }

    /// Lists receipts, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<LabReceipt>> {
        let rows: Vec<LabReceiptRow> = sqlx::query_as(&format!(
            "SELECT {RECEIPT_COLUMNS} FROM lab_receipts ORDER BY receipt_date DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut receipts = Vec::with_capacity(rows.len());
        for row in rows {
            let tests = self.tests_for(&row.id).await?;
            receipts.push(assemble(row, tests));
        }
        Ok(receipts)
    }

    async fn tests_for(&self, receipt_id: &str) -> DbResult<Vec<LabTestLine>> {
        let rows: Vec<LabTestRow> = sqlx::query_as(
            r#"
            SELECT test_name, price_paisa
            FROM lab_receipt_tests
            WHERE receipt_id = ?1
            ORDER BY position
            "#,
        )
        .bind(receipt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| LabTestLine {
                test_name: row.test_name,
                price: Money::from_paisa(row.price_paisa),
            })
            .collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn actor() -> ActorContext {
        ActorContext::new("lab-user", Role::Lab)
    }

    fn tests_list() -> Vec<LabTestLine> {
        vec![
            LabTestLine {
                test_name: "CBC".into(),
                price: Money::from_paisa(40000),
            },
            LabTestLine {
                test_name: "Lipid Profile".into(),
                price: Money::from_paisa(90000),
            },
        ]
    }

    #[tokio::test]
    async fn test_create_recomputes_total() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.lab();

        let receipt = repo
            .create(
                &actor(),
                Patient::named("Bina Thapa"),
                tests_list(),
                Money::from_paisa(10000),
            )
            .await
            .unwrap();

        assert_eq!(receipt.total_amount.paisa(), 40000 + 90000 - 10000);
        assert!(receipt.bill_number.starts_with("LAB-"));

        let found = repo.get_by_id(&receipt.id).await.unwrap().unwrap();
        assert_eq!(found.tests.len(), 2);
        assert_eq!(found.total_amount, receipt.total_amount);

        let by_bill = repo.find_by_bill_number(&receipt.bill_number).await.unwrap();
        assert_eq!(by_bill.len(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_input() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.lab();

        let err = repo
            .create(&actor(), Patient::named(""), tests_list(), Money::zero())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::MissingPatient)));

        let err = repo
            .create(&actor(), Patient::named("Bina"), vec![], Money::zero())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Core(CoreError::Validation(_))));

        // discount above the test total is rejected before any write
        let err = repo
            .create(
                &actor(),
                Patient::named("Bina"),
                tests_list(),
                Money::from_paisa(1_000_000),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InvalidDiscount { .. })
        ));
        assert_eq!(repo.list(10).await.unwrap().len(), 0);
    }
}
