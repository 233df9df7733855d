use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hellosvc_db::StoreError;

use crate::engine::DispatchError;

/// Application-level error type for HTTP handlers.
///
/// Responses are plain text. Malformed input is a 400; every store or broker
/// failure, including a missing record, is a 500 carrying the error's own
/// message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A store failure from `hellosvc_db`.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Starting a job failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The request body could not be decoded.
    #[error("{0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(msg) => {
                tracing::debug!(error = %msg, "Rejected request body");
                StatusCode::BAD_REQUEST
            }
            AppError::Store(err) => {
                tracing::error!(error = %err, "Store error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Dispatch(err) => {
                tracing::error!(error = %err, "Dispatch error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::header::CONTENT_TYPE;
    use hellosvc_broker::PublishOutcome;
    use hellosvc_core::types::new_record_id;
    use http_body_util::BodyExt;

    use super::*;

    async fn text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn not_found_is_a_plain_text_500() {
        let id = new_record_id();
        let response = AppError::from(StoreError::job_not_found(id)).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(text(response).await, format!("job not found: {id}"));
    }

    #[tokio::test]
    async fn unqueued_job_reports_queue_failure() {
        let err = DispatchError::NotQueued(PublishOutcome::Timeout);
        let response = AppError::from(err).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text(response).await, "failed to add job to queue");
    }

    #[tokio::test]
    async fn bad_request_is_400() {
        let response = AppError::BadRequest("bad body".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(text(response).await, "bad body");
    }
}
