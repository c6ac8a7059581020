//! # Patient Repository
//!
//! Database operations for OPD patient registrations. Plain CRUD plus the
//! name-prefix search that backs the billing form's autocomplete.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use aushadi_core::{Money, PatientRecord};

// =============================================================================
// Row Mapping
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
struct PatientRow {
    id: String,
    name: String,
    age: Option<i64>,
    gender: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    appointment_date: Option<DateTime<Utc>>,
    opd_price_paisa: i64,
    bill_no: String,
    created_at: DateTime<Utc>,
}

impl From<PatientRow> for PatientRecord {
    fn from(row: PatientRow) -> Self {
        PatientRecord {
            id: row.id,
            name: row.name,
            age: row.age,
            gender: row.gender,
            address: row.address,
            phone: row.phone,
            appointment_date: row.appointment_date,
            opd_price: Money::from_paisa(row.opd_price_paisa),
            bill_no: row.bill_no,
            created_at: row.created_at,
        }
    }
}

const PATIENT_COLUMNS: &str = "id, name, age, gender, address, phone, appointment_date, \
                               opd_price_paisa, bill_no, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for patient registration records.
#[derive(Debug, Clone)]
pub struct PatientRepository {
    pool: SqlitePool,
}

impl PatientRepository {
    /// Creates a new PatientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PatientRepository { pool }
    }

    /// Inserts a registration record.
    pub async fn insert(&self, record: &PatientRecord) -> DbResult<()> {
        debug!(id = %record.id, name = %record.name, "Registering patient");

        sqlx::query(
            r#"
            INSERT INTO patients (
                id, name, age, gender, address, phone,
                appointment_date, opd_price_paisa, bill_no, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(record.age)
        .bind(&record.gender)
        .bind(&record.address)
        .bind(&record.phone)
        .bind(record.appointment_date)
        .bind(record.opd_price.paisa())
        .bind(&record.bill_no)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a registration by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PatientRecord>> {
        let row: Option<PatientRow> = sqlx::query_as(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PatientRecord::from))
    }

    /// Lists registrations, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<PatientRecord>> {
        let rows: Vec<PatientRow> = sqlx::query_as(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY created_at DESC LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PatientRecord::from).collect())
    }

    /// Name-prefix search used by the billing form's autocomplete.
    pub async fn search_by_name(&self, prefix: &str, limit: u32) -> DbResult<Vec<PatientRecord>> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        let pattern = format!("{prefix}%");
        let rows: Vec<PatientRow> = sqlx::query_as(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE name LIKE ?1 ORDER BY name LIMIT ?2"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PatientRecord::from).collect())
    }

    /// Deletes a registration record.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM patients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("PatientRecord", id));
        }

        Ok(())
    }
}

/// Helper to generate a new patient record ID.
pub fn generate_patient_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn record(name: &str) -> PatientRecord {
        PatientRecord {
            id: generate_patient_id(),
            name: name.into(),
            age: Some(42),
            gender: Some("F".into()),
            address: Some("Pokhara".into()),
            phone: Some("9800000000".into()),
            appointment_date: None,
            opd_price: Money::from_paisa(50000),
            bill_no: "BILL-20260807-0001".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_get_delete() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.patients();

        let rec = record("Maya Gurung");
        repo.insert(&rec).await.unwrap();

        let found = repo.get_by_id(&rec.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Maya Gurung");
        assert_eq!(found.opd_price.paisa(), 50000);

        repo.delete(&rec.id).await.unwrap();
        assert!(repo.get_by_id(&rec.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&rec.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_search_by_name_prefix() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.patients();

        repo.insert(&record("Maya Gurung")).await.unwrap();
        repo.insert(&record("Mahesh Karki")).await.unwrap();
        repo.insert(&record("Sita Sharma")).await.unwrap();

        let hits = repo.search_by_name("Ma", 10).await.unwrap();
        assert_eq!(hits.len(), 2);

        // blank prefix returns nothing rather than everything
        assert!(repo.search_by_name("  ", 10).await.unwrap().is_empty());
    }
}
