//! hellosvc API server library.
//!
//! Exposes config, state, error handling, the dispatch engine and routes so
//! integration tests and the binary entrypoint share them.

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod routes;
pub mod state;
