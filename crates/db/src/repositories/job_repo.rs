//! Repository for the `jobs` table.

use sqlx::PgPool;

use hellosvc_core::status::JobStatus;
use hellosvc_core::types::{new_record_id, RecordId};

use crate::models::job::Job;

/// Column list for `jobs` queries.
const COLUMNS: &str = "id, status, created_at, updated_at, deleted_at";

/// Provides create/read/update for jobs. Jobs are never deleted here.
pub struct JobRepo;

impl JobRepo {
    /// Insert a new job. ID and `New` status are assigned with the insert.
    pub async fn create(pool: &PgPool) -> Result<Job, sqlx::Error> {
        let query = format!(
            "INSERT INTO jobs (id, status) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(new_record_id())
            .bind(JobStatus::New.as_str())
            .fetch_one(pool)
            .await
    }

    /// Find a live (not soft-deleted) job by ID.
    pub async fn find_by_id(pool: &PgPool, id: RecordId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Persist the job's status and refresh `updated_at`.
    ///
    /// Only a live `New` row is writable; `Done` is terminal. Returns `None`
    /// when no such row matched the ID.
    pub async fn update(pool: &PgPool, job: &Job) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL AND status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(job.id)
            .bind(job.status.as_str())
            .bind(JobStatus::New.as_str())
            .fetch_optional(pool)
            .await
    }
}
