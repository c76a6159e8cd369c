//! Database repository for flight documents, credentials and badges.
//!
//! Uses prepared statements and transactions for data integrity.

use chrono::Utc;
use serde_json::Value;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Credential, CredentialInfo, UserBadges};

/// Raw flight document tagged with the id it was fetched under.
#[derive(Debug, Clone)]
pub struct FlightDocument {
    pub flight_id: Option<String>,
    pub document: Value,
}

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== FLIGHT RECORD OPERATIONS ====================

    /// Store a batch of raw flight documents in one transaction.
    pub async fn insert_flight_records(
        &self,
        batch_id: Uuid,
        records: &[FlightDocument],
    ) -> Result<usize, AppError> {
        let now = Utc::now().to_rfc3339();
        let batch = batch_id.to_string();

        let mut tx = self.pool.begin().await?;
        for record in records {
            let document = serde_json::to_string(&record.document)?;
            sqlx::query(
                "INSERT INTO flight_records (batch_id, flight_id, document, fetched_at) VALUES (?, ?, ?, ?)",
            )
            .bind(&batch)
            .bind(&record.flight_id)
            .bind(&document)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(records.len())
    }

    /// List every stored raw flight document, oldest first.
    pub async fn list_flight_records(&self) -> Result<Vec<Value>, AppError> {
        let rows = sqlx::query("SELECT document FROM flight_records ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let document: String = row.get("document");
                serde_json::from_str(&document).map_err(AppError::from)
            })
            .collect()
    }

    /// Delete all documents stored under one fetch batch.
    pub async fn delete_flight_batch(&self, batch_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM flight_records WHERE batch_id = ?")
            .bind(batch_id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ==================== CREDENTIAL OPERATIONS ====================

    /// Find the credential for a realm and username.
    pub async fn find_credential(
        &self,
        realm: &str,
        username: &str,
    ) -> Result<Option<Credential>, AppError> {
        let row = sqlx::query(
            "SELECT realm, username, password_hash, created_at FROM credentials WHERE realm = ? AND username = ?",
        )
        .bind(realm)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(credential_from_row))
    }

    /// Whether the username is enrolled in any realm.
    pub async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM credentials WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n > 0)
    }

    /// Insert a new credential. A duplicate key is reported as a conflict.
    pub async fn insert_credential(&self, credential: &Credential) -> Result<(), AppError> {
        let result = sqlx::query(
            "INSERT INTO credentials (realm, username, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&credential.realm)
        .bind(&credential.username)
        .bind(&credential.password_hash)
        .bind(&credential.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::Conflict("Username already is taken!".to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// List enrolled credentials without their hashes.
    pub async fn list_credentials(&self) -> Result<Vec<CredentialInfo>, AppError> {
        let rows = sqlx::query(
            "SELECT realm, username, password_hash, created_at FROM credentials ORDER BY realm, username",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| CredentialInfo::from(&credential_from_row(row)))
            .collect())
    }

    // ==================== BADGE OPERATIONS ====================

    /// Create the badge record for a user if it does not exist yet.
    pub async fn ensure_badge_user(&self, username: &str) -> Result<(), AppError> {
        sqlx::query("INSERT OR IGNORE INTO badge_users (username, created_at) VALUES (?, ?)")
            .bind(username)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Add a badge to the user's set. Returns false when it was already there.
    pub async fn add_badge(&self, username: &str, badge: &str) -> Result<bool, AppError> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO badge_users (username, created_at) VALUES (?, ?)")
            .bind(username)
            .bind(&now)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "INSERT OR IGNORE INTO user_badges (username, badge, awarded_at) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(badge)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected() == 1)
    }

    /// Get the user's badges, creating an empty record on first access.
    pub async fn get_user_badges(&self, username: &str) -> Result<UserBadges, AppError> {
        self.ensure_badge_user(username).await?;

        let rows = sqlx::query(
            "SELECT badge FROM user_badges WHERE username = ? ORDER BY awarded_at, badge",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        Ok(UserBadges {
            username: username.to_string(),
            badges: rows.iter().map(|row| row.get("badge")).collect(),
        })
    }
}

fn credential_from_row(row: &sqlx::sqlite::SqliteRow) -> Credential {
    Credential {
        realm: row.get("realm"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}
