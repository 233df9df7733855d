//! Request extractors.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejection is an [`AppError::BadRequest`], so any body
/// that fails to parse (syntax, missing fields, wrong content type) is a
/// plain-text 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
