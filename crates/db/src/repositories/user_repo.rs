//! Repository for the `users` table.
//!
//! Deletion is soft: `deleted_at` is set and the row disappears from every
//! other query.

use sqlx::PgPool;

use hellosvc_core::types::{new_record_id, RecordId};

use crate::models::user::{CreateUser, UpdateUser, User};

/// Column list for `users` queries.
const COLUMNS: &str = "id, first_name, last_name, created_at, updated_at, deleted_at";

pub struct UserRepo;

impl UserRepo {
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (id, first_name, last_name) VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(new_record_id())
            .bind(&input.first_name)
            .bind(&input.last_name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: RecordId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update the provided fields. Absent or empty fields keep their stored
    /// value.
    pub async fn update(pool: &PgPool, input: &UpdateUser) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET \
                first_name = COALESCE(NULLIF($2, ''), first_name), \
                last_name = COALESCE(NULLIF($3, ''), last_name), \
                updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(input.id)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a user. Returns `None` if it was missing or already deleted.
    pub async fn soft_delete(pool: &PgPool, id: RecordId) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
