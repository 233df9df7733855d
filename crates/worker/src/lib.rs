//! Job queue consumer.
//!
//! [`Worker`] owns the broker consumer and drives one delivery at a time
//! through [`JobProcessor`]: decode, load, mark `Done`, persist, settle.
//! Every failure drops the message; nothing is retried.

pub mod processor;
pub mod shutdown;
pub mod worker;

pub use processor::{JobMessage, JobProcessor, ProcessError, Processed, Settled};
pub use worker::{Worker, WorkerSummary};
