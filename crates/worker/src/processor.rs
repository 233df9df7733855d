//! Per-delivery processing.

use std::sync::Arc;

use serde::Deserialize;

use hellosvc_broker::DeliveryEnvelope;
use hellosvc_core::error::CoreError;
use hellosvc_core::types::RecordId;
use hellosvc_db::models::job::Job;
use hellosvc_db::{JobStore, StoreError};

/// Wire shape the worker reads from a message body.
///
/// Publishers send a full serialized job; only `id` matters here and every
/// other field is ignored.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct JobMessage {
    pub id: RecordId,
}

/// Why a delivery was dropped.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to decode message body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to load job: {0}")]
    Load(#[source] StoreError),

    #[error("failed to complete job: {0}")]
    Transition(#[from] CoreError),

    #[error("failed to update job: {0}")]
    Update(#[source] StoreError),
}

/// Successful processing result.
#[derive(Debug, Clone, PartialEq)]
pub enum Processed {
    /// The job moved from `New` to `Done` and was persisted.
    Completed(Job),
    /// The job was already `Done` (a redelivery); nothing was written.
    AlreadyDone(Job),
}

/// How a delivery was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    Acked,
    Nacked,
    /// The ack or nack itself failed; the broker will redeliver once the
    /// channel is gone.
    Unsettled,
}

/// Applies the `New -> Done` transition for one message at a time.
#[derive(Clone)]
pub struct JobProcessor {
    store: Arc<dyn JobStore>,
}

impl JobProcessor {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    /// Decode `body`, load the job it names, mark it `Done` and persist it.
    ///
    /// Touches nothing in the store unless every earlier step succeeded.
    pub async fn process(&self, body: &[u8]) -> Result<Processed, ProcessError> {
        let message: JobMessage = serde_json::from_slice(body)?;

        let mut job = self
            .store
            .get_job(message.id)
            .await
            .map_err(ProcessError::Load)?;

        if job.status.is_terminal() {
            return Ok(Processed::AlreadyDone(job));
        }

        job.complete()?;

        let job = self
            .store
            .update_job(&job)
            .await
            .map_err(ProcessError::Update)?;

        Ok(Processed::Completed(job))
    }

    /// Process one delivery and settle it: ack on success, nack without
    /// requeue on any failure.
    pub async fn handle(&self, delivery: DeliveryEnvelope) -> Settled {
        let tag = delivery.delivery_tag();
        tracing::debug!(
            delivery_tag = tag,
            redelivered = delivery.redelivered(),
            body = %String::from_utf8_lossy(delivery.data()),
            "Received message",
        );

        match self.process(delivery.data()).await {
            Ok(processed) => {
                match &processed {
                    Processed::Completed(job) => {
                        tracing::info!(job_id = %job.id, delivery_tag = tag, "Job completed");
                    }
                    Processed::AlreadyDone(job) => {
                        tracing::info!(
                            job_id = %job.id,
                            delivery_tag = tag,
                            "Job already done, acknowledging redelivery",
                        );
                    }
                }
                match delivery.ack().await {
                    Ok(()) => Settled::Acked,
                    Err(e) => {
                        tracing::error!(delivery_tag = tag, error = %e, "Failed to ack message");
                        Settled::Unsettled
                    }
                }
            }
            Err(err) => {
                tracing::warn!(delivery_tag = tag, error = %err, "Dropping message");
                match delivery.nack().await {
                    Ok(()) => Settled::Nacked,
                    Err(e) => {
                        tracing::error!(delivery_tag = tag, error = %e, "Failed to nack message");
                        Settled::Unsettled
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
