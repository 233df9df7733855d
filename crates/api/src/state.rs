use std::sync::Arc;

use hellosvc_db::{JobStore, UserStore};

use crate::engine::JobDispatcher;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone; everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Job persistence.
    pub jobs: Arc<dyn JobStore>,
    /// User record persistence.
    pub users: Arc<dyn UserStore>,
    /// Create-and-publish path behind `/start`.
    pub dispatcher: Arc<JobDispatcher>,
}
