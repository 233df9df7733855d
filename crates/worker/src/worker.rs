use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use hellosvc_broker::Consumer;
use hellosvc_db::JobStore;

use crate::processor::{JobProcessor, Settled};

/// Counts of how deliveries were settled during one [`Worker::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub acked: u64,
    pub nacked: u64,
    /// Deliveries whose ack or nack failed to reach the broker.
    pub unsettled: u64,
}

impl WorkerSummary {
    fn record(&mut self, settled: Settled) {
        match settled {
            Settled::Acked => self.acked += 1,
            Settled::Nacked => self.nacked += 1,
            Settled::Unsettled => self.unsettled += 1,
        }
    }
}

/// Single consumer loop over the job queue.
///
/// Deliveries are handled strictly one after another; the broker's prefetch
/// of one keeps at most a single unsettled message in flight.
pub struct Worker<C: Consumer> {
    consumer: C,
    processor: JobProcessor,
}

impl<C: Consumer> Worker<C> {
    pub fn new(consumer: C, store: Arc<dyn JobStore>) -> Self {
        Self {
            consumer,
            processor: JobProcessor::new(store),
        }
    }

    /// Consume until `cancel` fires or the delivery stream ends.
    ///
    /// A delivery already being processed when `cancel` fires is finished
    /// and settled before returning.
    pub async fn run(mut self, cancel: CancellationToken) -> WorkerSummary {
        let mut summary = WorkerSummary::default();

        tracing::info!("Waiting for messages");

        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!("Stop requested, no longer taking deliveries");
                    break;
                }
                next = self.consumer.recv() => next,
            };

            match next {
                Some(Ok(delivery)) => {
                    let settled = self.processor.handle(delivery).await;
                    summary.record(settled);
                }
                Some(Err(e)) => {
                    tracing::error!(error = %e, "Failed to receive delivery");
                }
                None => {
                    tracing::info!("Delivery stream closed");
                    break;
                }
            }
        }

        tracing::info!(
            acked = summary.acked,
            nacked = summary.nacked,
            unsettled = summary.unsettled,
            "Worker stopped",
        );

        summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
