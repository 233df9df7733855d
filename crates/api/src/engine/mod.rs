//! Job dispatch engine.
//!
//! Holds the per-request start path: create the row, publish it, and wait
//! on that publish's own confirmation.

pub mod dispatcher;

pub use dispatcher::{DispatchError, JobDispatcher};
