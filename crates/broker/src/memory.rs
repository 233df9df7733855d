//! In-process broker used by tests and by the end-to-end pipeline harness.
//!
//! Behaves like a single durable queue: published messages are buffered
//! until the (only) consumer takes them, confirmations follow the configured
//! [`ConfirmMode`], and every settlement is recorded for inspection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::consumer::{Consumer, DeliveryEnvelope, Settle};
use crate::error::BrokerError;
use crate::publisher::{Confirm, PendingConfirm, Publisher};

/// How the in-memory broker answers publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmMode {
    /// Enqueue and confirm positively.
    Ack,
    /// Refuse the message and confirm negatively.
    Nack,
    /// Enqueue but never confirm.
    Never,
    /// Enqueue and hold the confirm until [`MemoryBroker::confirm`] answers
    /// that delivery tag.
    Manual,
}

/// How a delivery was settled by the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Ack,
    Nack { requeue: bool },
}

struct Message {
    tag: u64,
    data: Vec<u8>,
}

struct Shared {
    sender: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<Message>>>,
    confirm_mode: Mutex<ConfirmMode>,
    settlements: Mutex<HashMap<u64, Vec<Settlement>>>,
    pending_confirms: Mutex<HashMap<u64, oneshot::Sender<Confirm>>>,
    next_tag: AtomicU64,
}

/// Cloneable handle to an in-memory queue. Acts as the [`Publisher`];
/// [`take_consumer`](Self::take_consumer) yields the single consumer.
#[derive(Clone)]
pub struct MemoryBroker {
    shared: Arc<Shared>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                sender: Mutex::new(Some(sender)),
                receiver: Mutex::new(Some(receiver)),
                confirm_mode: Mutex::new(ConfirmMode::Ack),
                settlements: Mutex::new(HashMap::new()),
                pending_confirms: Mutex::new(HashMap::new()),
                next_tag: AtomicU64::new(1),
            }),
        }
    }

    /// Broker that answers every publish with `mode`.
    pub fn with_confirm_mode(mode: ConfirmMode) -> Self {
        let broker = Self::new();
        broker.set_confirm_mode(mode);
        broker
    }

    pub fn set_confirm_mode(&self, mode: ConfirmMode) {
        *self
            .shared
            .confirm_mode
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = mode;
    }

    /// Take the consumer side. Only the first call returns `Some`.
    pub fn take_consumer(&self) -> Option<MemoryConsumer> {
        self.shared
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .map(|receiver| MemoryConsumer {
                receiver,
                shared: Arc::clone(&self.shared),
            })
    }

    /// Put raw bytes on the queue, bypassing confirms. Returns the delivery
    /// tag, or `None` after [`close`](Self::close).
    pub fn inject(&self, data: impl Into<Vec<u8>>) -> Option<u64> {
        let tag = self.shared.next_tag.fetch_add(1, Ordering::SeqCst);
        self.enqueue(tag, data.into())
    }

    /// Answer the publish that produced delivery `tag`, in any order.
    ///
    /// Returns `false` if no publish is waiting on that tag, for example
    /// because its deadline already elapsed.
    pub fn confirm(&self, tag: u64, confirm: Confirm) -> bool {
        let sender = self
            .shared
            .pending_confirms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&tag);
        sender.is_some_and(|sender| sender.send(confirm).is_ok())
    }

    /// Delivery tags whose publish is still waiting for [`confirm`](Self::confirm).
    pub fn pending_confirms(&self) -> Vec<u64> {
        let mut tags: Vec<u64> = self
            .shared
            .pending_confirms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        tags.sort_unstable();
        tags
    }

    fn enqueue(&self, tag: u64, data: Vec<u8>) -> Option<u64> {
        let sender = self
            .shared
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        sender
            .as_ref()?
            .send(Message { tag, data })
            .ok()?;
        Some(tag)
    }

    /// Stop accepting messages. The consumer drains what is buffered and
    /// then observes the end of the stream.
    pub fn close(&self) {
        self.shared
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    /// Every settlement recorded for the delivery with `tag`.
    pub fn settlements(&self, tag: u64) -> Vec<Settlement> {
        self.shared
            .settlements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tag)
            .cloned()
            .unwrap_or_default()
    }

    /// Total number of settlements across all deliveries.
    pub fn settlement_count(&self) -> usize {
        self.shared
            .settlements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    fn confirm_mode(&self) -> ConfirmMode {
        *self
            .shared
            .confirm_mode
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for MemoryBroker {
    async fn send(&self, payload: &[u8]) -> Result<PendingConfirm, BrokerError> {
        match self.confirm_mode() {
            ConfirmMode::Nack => Ok(PendingConfirm::ready(Confirm::Nack)),
            ConfirmMode::Ack => {
                self.inject(payload).ok_or(BrokerError::Closed)?;
                Ok(PendingConfirm::ready(Confirm::Ack))
            }
            ConfirmMode::Never => {
                self.inject(payload).ok_or(BrokerError::Closed)?;
                Ok(PendingConfirm::never())
            }
            ConfirmMode::Manual => {
                let tag = self.shared.next_tag.fetch_add(1, Ordering::SeqCst);
                let (tx, rx) = oneshot::channel();
                // Registered before the message is visible, so a consumer can
                // answer it as soon as it is received.
                self.shared
                    .pending_confirms
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(tag, tx);
                if self.enqueue(tag, payload.to_vec()).is_none() {
                    self.shared
                        .pending_confirms
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .remove(&tag);
                    return Err(BrokerError::Closed);
                }
                Ok(PendingConfirm::new(async move {
                    rx.await.map_err(|_| BrokerError::Closed)
                }))
            }
        }
    }
}

/// The single consumer of a [`MemoryBroker`].
pub struct MemoryConsumer {
    receiver: mpsc::UnboundedReceiver<Message>,
    shared: Arc<Shared>,
}

#[async_trait]
impl Consumer for MemoryConsumer {
    async fn recv(&mut self) -> Option<Result<DeliveryEnvelope, BrokerError>> {
        let message = self.receiver.recv().await?;
        Some(Ok(DeliveryEnvelope::new(
            message.data,
            message.tag,
            false,
            MemorySettle {
                tag: message.tag,
                shared: Arc::clone(&self.shared),
            },
        )))
    }
}

struct MemorySettle {
    tag: u64,
    shared: Arc<Shared>,
}

impl MemorySettle {
    fn record(&self, settlement: Settlement) {
        self.shared
            .settlements
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(self.tag)
            .or_default()
            .push(settlement);
    }
}

#[async_trait]
impl Settle for MemorySettle {
    async fn ack(&self) -> Result<(), BrokerError> {
        self.record(Settlement::Ack);
        Ok(())
    }

    async fn reject(&self) -> Result<(), BrokerError> {
        self.record(Settlement::Nack { requeue: false });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
