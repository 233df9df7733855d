//! Handlers for the job pipeline: `/start` and `/status`.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use hellosvc_db::models::RecordRef;

use crate::error::AppResult;
use crate::extract::AppJson;
use crate::state::AppState;

/// POST /start
///
/// Create a job and queue it. Responds only after the broker confirmed the
/// message; the returned job is still `New`.
pub async fn start(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let job = state.dispatcher.start().await?;
    Ok(Json(job))
}

/// GET|POST /status
///
/// Look up a job by the `id` in the body.
pub async fn status(
    State(state): State<AppState>,
    AppJson(input): AppJson<RecordRef>,
) -> AppResult<impl IntoResponse> {
    let job = state.jobs.get_job(input.id).await?;

    tracing::debug!(job_id = %job.id, status = %job.status, "Job status read");

    Ok(Json(job))
}
