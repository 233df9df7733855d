pub mod health;

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the root route tree.
///
/// ```text
/// /start                                           create and queue a job (POST)
/// /status                                          job by id (GET, POST)
///
/// /create                                          create user (PUT, POST)
/// /read                                            user by id (PUT, POST)
/// /update                                          partial update (PUT, POST)
/// /delete                                          soft delete (PUT, POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/start", post(handlers::jobs::start))
        .route(
            "/status",
            get(handlers::jobs::status).post(handlers::jobs::status),
        )
        .route(
            "/create",
            put(handlers::users::create).post(handlers::users::create),
        )
        .route(
            "/read",
            put(handlers::users::read).post(handlers::users::read),
        )
        .route(
            "/update",
            put(handlers::users::update).post(handlers::users::update),
        )
        .route(
            "/delete",
            put(handlers::users::delete).post(handlers::users::delete),
        )
}
