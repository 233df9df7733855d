//! Row models and request DTOs.

pub mod job;
pub mod user;

use serde::Deserialize;

use hellosvc_core::types::RecordId;

/// Request body that only names a record, e.g. `{"id": "..."}`.
///
/// Extra fields are ignored, so a full serialized record is also accepted.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RecordRef {
    pub id: RecordId,
}
