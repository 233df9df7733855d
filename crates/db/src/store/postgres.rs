use async_trait::async_trait;

use hellosvc_core::types::RecordId;

use super::{JobStore, StoreError, UserStore};
use crate::models::job::Job;
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::repositories::{JobRepo, UserRepo};
use crate::DbPool;

/// Postgres-backed store. Cheap to clone; the pool is shared.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn create_job(&self) -> Result<Job, StoreError> {
        Ok(JobRepo::create(&self.pool).await?)
    }

    async fn get_job(&self, id: RecordId) -> Result<Job, StoreError> {
        JobRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| StoreError::job_not_found(id))
    }

    async fn update_job(&self, job: &Job) -> Result<Job, StoreError> {
        JobRepo::update(&self.pool, job)
            .await?
            .ok_or_else(|| StoreError::job_not_found(job.id))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(crate::health_check(&self.pool).await?)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }

    async fn get_user(&self, id: RecordId) -> Result<User, StoreError> {
        UserRepo::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    async fn update_user(&self, input: &UpdateUser) -> Result<User, StoreError> {
        UserRepo::update(&self.pool, input)
            .await?
            .ok_or_else(|| StoreError::user_not_found(input.id))
    }

    async fn delete_user(&self, id: RecordId) -> Result<User, StoreError> {
        UserRepo::soft_delete(&self.pool, id)
            .await?
            .ok_or_else(|| StoreError::user_not_found(id))
    }
}
