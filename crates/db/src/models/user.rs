//! User row model and DTOs for the record CRUD endpoints.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use hellosvc_core::types::{RecordId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

/// Body of `/create`. The ID is always assigned server-side.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Body of `/update`. Only fields that are present are changed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub id: RecordId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
