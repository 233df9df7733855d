//! Durable job queue client.
//!
//! One [`BrokerConnection`] is opened per process. It hands out two
//! capability views over the same connection:
//!
//! - [`Publisher`]: cloneable and `Sync`, used concurrently by request
//!   handlers. Every publish returns a [`PendingConfirm`] correlated to that
//!   publish, waited on with a deadline.
//! - [`Consumer`]: single owner, prefetch 1, manual acknowledgement. Each
//!   [`DeliveryEnvelope`] is settled exactly once by consuming it with
//!   [`ack`](DeliveryEnvelope::ack) or [`nack`](DeliveryEnvelope::nack).
//!
//! [`MemoryBroker`] implements both views in-process for tests.

pub mod amqp;
pub mod config;
pub mod consumer;
pub mod error;
pub mod memory;
pub mod publisher;

pub use amqp::{AmqpConsumer, AmqpPublisher, BrokerConnection};
pub use config::BrokerConfig;
pub use consumer::{Consumer, DeliveryEnvelope, Settle};
pub use error::BrokerError;
pub use memory::{ConfirmMode, MemoryBroker, MemoryConsumer, Settlement};
pub use publisher::{Confirm, PendingConfirm, PublishOutcome, Publisher};
