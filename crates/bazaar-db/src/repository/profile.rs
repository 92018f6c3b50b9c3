//! # Profile Repository
//!
//! Buyer and seller profile rows. Account management lives outside this
//! workspace; these rows exist so that orders and products reference a real
//! owner, and their absence surfaces as an integrity violation.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use bazaar_core::Profile;

#[derive(Debug, Clone)]
pub struct ProfileRepository {
    pool: SqlitePool,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProfileRepository { pool }
    }

    /// Inserts a buyer profile and returns its id.
    pub async fn create_buyer(&self, email: &str) -> DbResult<i64> {
        debug!(email = %email, "Creating buyer profile");
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO buyers (email, created_at) VALUES (?1, ?2) RETURNING id",
        )
        .bind(email.trim())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    /// Inserts a seller profile and returns its id.
    pub async fn create_seller(&self, email: &str) -> DbResult<i64> {
        debug!(email = %email, "Creating seller profile");
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO sellers (email, created_at) VALUES (?1, ?2) RETURNING id",
        )
        .bind(email.trim())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn get_buyer(&self, id: i64) -> DbResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, email, created_at FROM buyers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Looks up a seller by registered email.
    pub async fn find_seller_by_email(&self, email: &str) -> DbResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, email, created_at FROM sellers WHERE email = ?1",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn get_seller(&self, id: i64) -> DbResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, email, created_at FROM sellers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }
}
