//! Domain primitives shared by every hellosvc crate.
//!
//! Holds the identifier and timestamp aliases, the job status state
//! machine, and the domain error type. Has no internal dependencies so
//! both the API and the worker can build on it.

pub mod error;
pub mod status;
pub mod types;
