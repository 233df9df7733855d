//! SQL repositories. Each repo is a zero-sized namespace of async functions
//! taking the pool explicitly.

pub mod job_repo;
pub mod user_repo;

pub use job_repo::JobRepo;
pub use user_repo::UserRepo;
