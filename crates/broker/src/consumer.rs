//! Manual-ack consumption.

use async_trait::async_trait;

use crate::error::BrokerError;

/// Settles one delivery with the broker.
///
/// Implementations are only ever invoked once per delivery, through
/// [`DeliveryEnvelope`].
#[async_trait]
pub trait Settle: Send + Sync {
    /// Positive acknowledgement.
    async fn ack(&self) -> Result<(), BrokerError>;

    /// Negative acknowledgement without requeue: the message is dropped.
    async fn reject(&self) -> Result<(), BrokerError>;
}

/// A single delivery awaiting settlement.
///
/// `ack` and `nack` take `self`, so a delivery cannot be settled twice.
pub struct DeliveryEnvelope {
    data: Vec<u8>,
    delivery_tag: u64,
    redelivered: bool,
    settle: Box<dyn Settle>,
}

impl DeliveryEnvelope {
    pub fn new(
        data: Vec<u8>,
        delivery_tag: u64,
        redelivered: bool,
        settle: impl Settle + 'static,
    ) -> Self {
        Self {
            data,
            delivery_tag,
            redelivered,
            settle: Box::new(settle),
        }
    }

    /// Raw message body.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn delivery_tag(&self) -> u64 {
        self.delivery_tag
    }

    /// Whether the broker delivered this message before.
    pub fn redelivered(&self) -> bool {
        self.redelivered
    }

    pub async fn ack(self) -> Result<(), BrokerError> {
        self.settle.ack().await
    }

    /// Drop the message. It is never requeued.
    pub async fn nack(self) -> Result<(), BrokerError> {
        self.settle.reject().await
    }
}

impl std::fmt::Debug for DeliveryEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryEnvelope")
            .field("delivery_tag", &self.delivery_tag)
            .field("redelivered", &self.redelivered)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Consumer capability: owned by exactly one loop.
#[async_trait]
pub trait Consumer: Send {
    /// Wait for the next delivery.
    ///
    /// Returns `None` once the underlying channel is closed.
    async fn recv(&mut self) -> Option<Result<DeliveryEnvelope, BrokerError>>;
}
