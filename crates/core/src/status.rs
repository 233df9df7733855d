//! Job status state machine.
//!
//! A job is created as [`JobStatus::New`] and moves to [`JobStatus::Done`]
//! exactly once, when the worker finishes it. No other edge exists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle status of a job, stored as a short string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    New,
    Done,
}

impl JobStatus {
    /// The string persisted in the `jobs.status` column and sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::New => "New",
            JobStatus::Done => "Done",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done)
    }

    /// Whether `self -> next` is an edge of the state machine.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!((self, next), (JobStatus::New, JobStatus::Done))
    }

    /// Validate and perform a transition.
    pub fn transition(self, next: JobStatus) -> Result<JobStatus, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition { from: self, to: next })
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "New" => Ok(JobStatus::New),
            "Done" => Ok(JobStatus::Done),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for JobStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_to_done_is_the_only_edge() {
        assert!(JobStatus::New.can_transition_to(JobStatus::Done));
        assert!(!JobStatus::Done.can_transition_to(JobStatus::New));
        assert!(!JobStatus::New.can_transition_to(JobStatus::New));
        assert!(!JobStatus::Done.can_transition_to(JobStatus::Done));
    }

    #[test]
    fn transition_rejects_leaving_done() {
        let err = JobStatus::Done.transition(JobStatus::New).unwrap_err();
        assert_eq!(err.to_string(), "Invalid status transition: Done -> New");
        assert_eq!(JobStatus::New.transition(JobStatus::Done).unwrap(), JobStatus::Done);
    }

    #[test]
    fn parses_stored_strings() {
        assert_eq!("New".parse::<JobStatus>().unwrap(), JobStatus::New);
        assert_eq!(JobStatus::try_from("Done".to_string()).unwrap(), JobStatus::Done);
        assert!("done".parse::<JobStatus>().is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        assert_eq!(serde_json::to_string(&JobStatus::New).unwrap(), "\"New\"");
        let parsed: JobStatus = serde_json::from_str("\"Done\"").unwrap();
        assert_eq!(parsed, JobStatus::Done);
        assert!(JobStatus::Done.is_terminal());
    }
}
