//! Handlers for user records.
//!
//! Every endpoint takes its input from a JSON body, including the ID.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use hellosvc_db::models::user::{CreateUser, UpdateUser};
use hellosvc_db::models::RecordRef;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::state::AppState;

/// PUT|POST /create
pub async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateUser>,
) -> AppResult<impl IntoResponse> {
    let user = state.users.create_user(&input).await?;
    tracing::info!(user_id = %user.id, "User created");
    Ok(Json(user))
}

/// PUT|POST /read
pub async fn read(
    State(state): State<AppState>,
    AppJson(input): AppJson<RecordRef>,
) -> AppResult<impl IntoResponse> {
    let user = state.users.get_user(input.id).await?;
    Ok(Json(user))
}

/// PUT|POST /update
///
/// Fields absent from the body keep their stored value.
pub async fn update(
    State(state): State<AppState>,
    AppJson(input): AppJson<UpdateUser>,
) -> AppResult<impl IntoResponse> {
    let user = state.users.update_user(&input).await?;
    tracing::info!(user_id = %user.id, "User updated");
    Ok(Json(user))
}

/// PUT|POST /delete
///
/// Soft delete; the response carries the record with `deletedAt` set.
pub async fn delete(
    State(state): State<AppState>,
    AppJson(input): AppJson<RecordRef>,
) -> AppResult<impl IntoResponse> {
    let user = state.users.delete_user(input.id).await?;
    tracing::info!(user_id = %user.id, "User deleted");
    Ok(Json(user))
}
