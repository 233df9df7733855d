use crate::status::JobStatus;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid job status: {0}")]
    InvalidStatus(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}
