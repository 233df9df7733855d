//! Job dispatch: persist a new job, publish it, wait for the broker's confirm.

use std::sync::Arc;
use std::time::Duration;

use hellosvc_broker::{BrokerError, PublishOutcome, Publisher};
use hellosvc_db::models::job::Job;
use hellosvc_db::{JobStore, StoreError};

/// Why a job could not be started.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode job: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// The broker refused the message or did not confirm it in time. The job
    /// row stays `New`.
    #[error("failed to add job to queue")]
    NotQueued(PublishOutcome),
}

/// Creates jobs and hands them to the queue.
///
/// Shared by every request task; each call to [`start`](Self::start) waits on
/// the confirmation of its own publish only.
pub struct JobDispatcher {
    store: Arc<dyn JobStore>,
    publisher: Arc<dyn Publisher>,
    confirm_timeout: Duration,
}

impl JobDispatcher {
    pub fn new(
        store: Arc<dyn JobStore>,
        publisher: Arc<dyn Publisher>,
        confirm_timeout: Duration,
    ) -> Self {
        Self {
            store,
            publisher,
            confirm_timeout,
        }
    }

    /// Create a job and publish it, returning the job once the broker has
    /// accepted it.
    ///
    /// A failed publish leaves the created row in place.
    pub async fn start(&self) -> Result<Job, DispatchError> {
        let job = self.store.create_job().await?;
        tracing::debug!(job_id = %job.id, "Job created");

        let payload = serde_json::to_vec(&job)?;

        let outcome = self
            .publisher
            .publish(&payload, self.confirm_timeout)
            .await
            .inspect_err(|e| {
                tracing::error!(job_id = %job.id, error = %e, "Publish failed");
            })?;

        match outcome {
            PublishOutcome::Ack => {
                tracing::info!(job_id = %job.id, "Job queued");
                Ok(job)
            }
            PublishOutcome::Nack => {
                tracing::warn!(job_id = %job.id, "Broker refused job");
                Err(DispatchError::NotQueued(outcome))
            }
            PublishOutcome::Timeout => {
                tracing::warn!(
                    job_id = %job.id,
                    timeout_secs = self.confirm_timeout.as_secs(),
                    "No confirm from broker before deadline",
                );
                Err(DispatchError::NotQueued(outcome))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use hellosvc_broker::{Confirm, ConfirmMode, Consumer, MemoryBroker};
    use hellosvc_core::status::JobStatus;
    use hellosvc_db::MemoryStore;

    use super::*;

    const DEADLINE: Duration = Duration::from_secs(10);

    fn dispatcher(store: &Arc<MemoryStore>, broker: &MemoryBroker) -> JobDispatcher {
        JobDispatcher::new(
            Arc::clone(store) as Arc<dyn JobStore>,
            Arc::new(broker.clone()),
            DEADLINE,
        )
    }

    #[tokio::test]
    async fn confirmed_start_returns_new_job_and_queues_it() {
        let store = Arc::new(MemoryStore::new());
        let broker = MemoryBroker::new();
        let mut consumer = broker.take_consumer().unwrap();

        let job = dispatcher(&store, &broker).start().await.unwrap();

        assert_eq!(job.status, JobStatus::New);
        assert_eq!(store.get_job(job.id).await.unwrap().status, JobStatus::New);

        let delivery = consumer.recv().await.unwrap().unwrap();
        let queued: serde_json::Value = serde_json::from_slice(delivery.data()).unwrap();
        assert_eq!(queued["id"], job.id.to_string());
        assert_eq!(queued["status"], "New");
    }

    #[tokio::test]
    async fn every_start_gets_a_fresh_id() {
        let store = Arc::new(MemoryStore::new());
        let broker = MemoryBroker::new();
        let dispatcher = dispatcher(&store, &broker);

        let first = dispatcher.start().await.unwrap();
        let second = dispatcher.start().await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.job_count(), 2);
    }

    #[tokio::test]
    async fn nack_fails_and_keeps_the_row() {
        let store = Arc::new(MemoryStore::new());
        let broker = MemoryBroker::with_confirm_mode(ConfirmMode::Nack);

        let err = dispatcher(&store, &broker).start().await.unwrap_err();

        assert_matches!(err, DispatchError::NotQueued(PublishOutcome::Nack));
        assert_eq!(err.to_string(), "failed to add job to queue");
        assert_eq!(store.job_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_confirm_times_out_and_job_stays_new() {
        let store = Arc::new(MemoryStore::new());
        let broker = MemoryBroker::with_confirm_mode(ConfirmMode::Never);
        let started = tokio::time::Instant::now();

        let err = dispatcher(&store, &broker).start().await.unwrap_err();

        assert_matches!(err, DispatchError::NotQueued(PublishOutcome::Timeout));
        assert!(started.elapsed() >= DEADLINE);

        // The unconfirmed message still landed; its row was not rolled back.
        let mut consumer = broker.take_consumer().unwrap();
        let delivery = consumer.recv().await.unwrap().unwrap();
        let queued: Job = serde_json::from_slice(delivery.data()).unwrap();
        assert_eq!(store.get_job(queued.id).await.unwrap().status, JobStatus::New);
        assert_eq!(store.job_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_starts_each_get_their_own_confirm() {
        let store = Arc::new(MemoryStore::new());
        let broker = MemoryBroker::with_confirm_mode(ConfirmMode::Manual);
        let mut consumer = broker.take_consumer().unwrap();
        let dispatcher = dispatcher(&store, &broker);

        // Answers out of publish order: third acked, first nacked, second
        // left to time out.
        let answer = async {
            let mut queued = Vec::new();
            for _ in 0..3 {
                let delivery = consumer.recv().await.unwrap().unwrap();
                let job: Job = serde_json::from_slice(delivery.data()).unwrap();
                queued.push((delivery.delivery_tag(), job.id));
            }
            assert!(broker.confirm(queued[2].0, Confirm::Ack));
            assert!(broker.confirm(queued[0].0, Confirm::Nack));
            queued
        };

        let (first, second, third, queued) = tokio::join!(
            dispatcher.start(),
            dispatcher.start(),
            dispatcher.start(),
            answer,
        );

        assert_matches!(first, Err(DispatchError::NotQueued(PublishOutcome::Nack)));
        assert_matches!(second, Err(DispatchError::NotQueued(PublishOutcome::Timeout)));
        let third = third.unwrap();
        assert_eq!(third.id, queued[2].1);

        assert_eq!(store.job_count(), 3);
        for (_, id) in &queued {
            assert_eq!(store.get_job(*id).await.unwrap().status, JobStatus::New);
        }
        // The abandoned publish's slot no longer accepts an answer.
        assert!(!broker.confirm(queued[1].0, Confirm::Ack));
    }

    #[tokio::test]
    async fn closed_broker_surfaces_broker_error() {
        let store = Arc::new(MemoryStore::new());
        let broker = MemoryBroker::new();
        broker.close();

        let err = dispatcher(&store, &broker).start().await.unwrap_err();

        assert_matches!(err, DispatchError::Broker(BrokerError::Closed));
    }
}
