//! Job row model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use hellosvc_core::error::CoreError;
use hellosvc_core::status::JobStatus;
use hellosvc_core::types::{RecordId, Timestamp};

/// A row from the `jobs` table. Also the JSON shape returned by `/start`
/// and `/status` and the payload published to the queue.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: RecordId,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

impl Job {
    /// Move the job to `Done`. Fails if it already left `New`.
    pub fn complete(&mut self) -> Result<(), CoreError> {
        self.status = self.status.transition(JobStatus::Done)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Job {
        let now = chrono::Utc::now();
        Job {
            id: hellosvc_core::types::new_record_id(),
            status: JobStatus::New,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let job = sample();
        let json = serde_json::to_value(&job).unwrap();

        assert_eq!(json["id"], job.id.to_string());
        assert_eq!(json["status"], "New");
        assert!(json["createdAt"].is_string());
        assert!(json["updatedAt"].is_string());
        assert!(json["deletedAt"].is_null());
    }

    #[test]
    fn complete_is_one_way() {
        let mut job = sample();
        job.complete().unwrap();
        assert_eq!(job.status, JobStatus::Done);
        assert!(job.complete().is_err());
        assert_eq!(job.status, JobStatus::Done);
    }
}
