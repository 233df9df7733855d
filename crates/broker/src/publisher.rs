//! Confirm-tracked publishing.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;

use crate::error::BrokerError;

/// What the broker said about one published message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirm {
    Ack,
    Nack,
}

/// Result of a publish bounded by a deadline.
///
/// Only [`PublishOutcome::Ack`] means the message was accepted. On
/// `Timeout` the message may still land on the queue later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Ack,
    Nack,
    Timeout,
}

/// The confirmation slot for a single publish.
///
/// Resolves at most once. Dropping it (for example when the deadline in
/// [`wait`](Self::wait) elapses) discards any confirmation that arrives
/// afterwards.
pub struct PendingConfirm {
    inner: BoxFuture<'static, Result<Confirm, BrokerError>>,
}

impl PendingConfirm {
    pub fn new<F>(confirm: F) -> Self
    where
        F: Future<Output = Result<Confirm, BrokerError>> + Send + 'static,
    {
        Self {
            inner: confirm.boxed(),
        }
    }

    /// A confirmation that is already known.
    pub fn ready(confirm: Confirm) -> Self {
        Self::new(futures::future::ready(Ok(confirm)))
    }

    /// A confirmation that never arrives.
    pub fn never() -> Self {
        Self::new(futures::future::pending())
    }

    /// Wait up to `deadline` for the broker's answer.
    ///
    /// Errors only if the channel failed before answering.
    pub async fn wait(self, deadline: Duration) -> Result<PublishOutcome, BrokerError> {
        match tokio::time::timeout(deadline, self.inner).await {
            Ok(Ok(Confirm::Ack)) => Ok(PublishOutcome::Ack),
            Ok(Ok(Confirm::Nack)) => Ok(PublishOutcome::Nack),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(PublishOutcome::Timeout),
        }
    }
}

impl std::fmt::Debug for PendingConfirm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingConfirm").finish_non_exhaustive()
    }
}

/// Producer capability: safe to share across request tasks.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Hand `payload` to the broker and return its pending confirmation.
    async fn send(&self, payload: &[u8]) -> Result<PendingConfirm, BrokerError>;

    /// Send and wait for the confirmation, giving up after `deadline`.
    ///
    /// Giving up does not cancel the publish.
    async fn publish(
        &self,
        payload: &[u8],
        deadline: Duration,
    ) -> Result<PublishOutcome, BrokerError> {
        self.send(payload).await?.wait(deadline).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
