use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use hellosvc_core::status::JobStatus;
use hellosvc_core::types::{new_record_id, RecordId};

use super::{JobStore, StoreError, UserStore};
use crate::models::job::Job;
use crate::models::user::{CreateUser, UpdateUser, User};

/// In-memory store for tests and local runs without Postgres.
///
/// Mirrors the Postgres semantics: soft-deleted rows are invisible and an
/// update that matches no live row is `NotFound`. Every successful write
/// bumps [`write_count`](Self::write_count).
#[derive(Debug, Default)]
pub struct MemoryStore {
    jobs: RwLock<HashMap<RecordId, Job>>,
    users: RwLock<HashMap<RecordId, User>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a job row as-is.
    pub fn insert_job(&self, job: Job) {
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job.id, job);
    }

    /// Snapshot of a job row, including soft-deleted ones.
    pub fn job(&self, id: RecordId) -> Option<Job> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of successful create/update/delete calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create_job(&self) -> Result<Job, StoreError> {
        let now = Utc::now();
        let job = Job {
            id: new_record_id(),
            status: JobStatus::New,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.insert_job(job.clone());
        self.record_write();
        Ok(job)
    }

    async fn get_job(&self, id: RecordId) -> Result<Job, StoreError> {
        self.job(id)
            .filter(|job| job.deleted_at.is_none())
            .ok_or_else(|| StoreError::job_not_found(id))
    }

    async fn update_job(&self, job: &Job) -> Result<Job, StoreError> {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let stored = jobs
            .get_mut(&job.id)
            .filter(|stored| stored.deleted_at.is_none() && !stored.status.is_terminal())
            .ok_or_else(|| StoreError::job_not_found(job.id))?;

        stored.status = job.status;
        stored.updated_at = Utc::now();
        let updated = stored.clone();
        drop(jobs);

        self.record_write();
        Ok(updated)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, input: &CreateUser) -> Result<User, StoreError> {
        let now = Utc::now();
        let user = User {
            id: new_record_id(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.users
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(user.id, user.clone());
        self.record_write();
        Ok(user)
    }

    async fn get_user(&self, id: RecordId) -> Result<User, StoreError> {
        self.users
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .filter(|user| user.deleted_at.is_none())
            .cloned()
            .ok_or_else(|| StoreError::user_not_found(id))
    }

    async fn update_user(&self, input: &UpdateUser) -> Result<User, StoreError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let stored = users
            .get_mut(&input.id)
            .filter(|user| user.deleted_at.is_none())
            .ok_or_else(|| StoreError::user_not_found(input.id))?;

        // Empty strings count as absent, like NULLIF in the SQL update.
        if let Some(first_name) = input.first_name.as_deref().filter(|v| !v.is_empty()) {
            stored.first_name = Some(first_name.to_owned());
        }
        if let Some(last_name) = input.last_name.as_deref().filter(|v| !v.is_empty()) {
            stored.last_name = Some(last_name.to_owned());
        }
        stored.updated_at = Utc::now();
        let updated = stored.clone();
        drop(users);

        self.record_write();
        Ok(updated)
    }

    async fn delete_user(&self, id: RecordId) -> Result<User, StoreError> {
        let mut users = self.users.write().unwrap_or_else(PoisonError::into_inner);
        let stored = users
            .get_mut(&id)
            .filter(|user| user.deleted_at.is_none())
            .ok_or_else(|| StoreError::user_not_found(id))?;

        let now = Utc::now();
        stored.deleted_at = Some(now);
        stored.updated_at = now;
        let deleted = stored.clone();
        drop(users);

        self.record_write();
        Ok(deleted)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
