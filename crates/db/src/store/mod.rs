//! Store capability traits.
//!
//! The dispatcher, the worker and the HTTP handlers only see these traits,
//! so they run unchanged against [`PgStore`] in production and
//! [`MemoryStore`] in tests.

mod memory;
mod postgres;

use async_trait::async_trait;

use hellosvc_core::types::RecordId;

use crate::models::job::Job;
use crate::models::user::{CreateUser, UpdateUser, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Error returned by every store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The lookup or write matched no live record.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: RecordId },

    /// Any failure of the backing database.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn job_not_found(id: RecordId) -> Self {
        StoreError::NotFound { entity: "job", id }
    }

    pub fn user_not_found(id: RecordId) -> Self {
        StoreError::NotFound { entity: "user", id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Persistence operations the job pipeline needs.
///
/// Implementations must tolerate concurrent calls from many request tasks.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a new job with a fresh ID and status `New`.
    async fn create_job(&self) -> Result<Job, StoreError>;

    /// Load a live job by ID.
    async fn get_job(&self, id: RecordId) -> Result<Job, StoreError>;

    /// Persist the full record. Only a live `New` row is writable; zero
    /// affected rows is [`StoreError::NotFound`].
    async fn update_job(&self, job: &Job) -> Result<Job, StoreError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Persistence operations behind the user record endpoints.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError>;

    async fn get_user(&self, id: RecordId) -> Result<User, StoreError>;

    async fn update_user(&self, input: &UpdateUser) -> Result<User, StoreError>;

    /// Soft-delete and return the deleted record.
    async fn delete_user(&self, id: RecordId) -> Result<User, StoreError>;
}
