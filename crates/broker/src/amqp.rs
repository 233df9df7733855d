//! AMQP 0-9-1 implementation on top of `lapin`.

use async_trait::async_trait;
use futures::StreamExt;
use lapin::acker::Acker;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicPublishOptions,
    BasicQosOptions, ConfirmSelectOptions, QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};

use crate::config::BrokerConfig;
use crate::consumer::{Consumer, DeliveryEnvelope, Settle};
use crate::error::BrokerError;
use crate::publisher::{Confirm, PendingConfirm, Publisher};

/// AMQP delivery mode for messages that survive a broker restart.
const PERSISTENT: u8 = 2;

/// The process-wide broker connection.
///
/// Open it once at startup with [`connect`](Self::connect), derive the
/// publisher and/or consumer from it, and [`close`](Self::close) it at
/// shutdown.
pub struct BrokerConnection {
    connection: Connection,
    config: BrokerConfig,
}

impl BrokerConnection {
    /// Connect to the broker. Failure here is fatal for the caller.
    pub async fn connect(config: BrokerConfig) -> Result<Self, BrokerError> {
        let connection = Connection::connect(&config.url, ConnectionProperties::default()).await?;

        tracing::info!(queue = %config.queue, "Connected to AMQP broker");

        Ok(Self { connection, config })
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Open a confirm-mode channel for publishing.
    pub async fn publisher(&self) -> Result<AmqpPublisher, BrokerError> {
        let channel = self.connection.create_channel().await?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await?;
        self.declare_queue(&channel).await?;

        tracing::debug!(channel_id = channel.id(), "Publisher channel ready (confirm mode)");

        Ok(AmqpPublisher {
            channel,
            queue: self.config.queue.clone(),
        })
    }

    /// Open a prefetch-limited, manual-ack consumer on the queue.
    pub async fn consumer(&self) -> Result<AmqpConsumer, BrokerError> {
        let channel = self.connection.create_channel().await?;
        channel
            .basic_qos(self.config.prefetch, BasicQosOptions::default())
            .await?;
        self.declare_queue(&channel).await?;

        let consumer = channel
            .basic_consume(
                &self.config.queue,
                &self.config.consumer_tag,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        tracing::debug!(
            channel_id = channel.id(),
            prefetch = self.config.prefetch,
            consumer_tag = %self.config.consumer_tag,
            "Consumer channel ready",
        );

        Ok(AmqpConsumer {
            _channel: channel,
            consumer,
        })
    }

    /// Close the connection and every channel opened on it.
    pub async fn close(&self) -> Result<(), BrokerError> {
        self.connection.close(200, "shutdown").await?;
        tracing::info!("AMQP connection closed");
        Ok(())
    }

    async fn declare_queue(&self, channel: &Channel) -> Result<(), BrokerError> {
        channel
            .queue_declare(
                &self.config.queue,
                QueueDeclareOptions {
                    durable: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// Publishes persistent messages to the default exchange, routed to the
/// job queue. Clones share the same channel.
#[derive(Clone)]
pub struct AmqpPublisher {
    channel: Channel,
    queue: String,
}

#[async_trait]
impl Publisher for AmqpPublisher {
    async fn send(&self, payload: &[u8]) -> Result<PendingConfirm, BrokerError> {
        let confirm = self
            .channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default()
                    .with_content_type("application/json".into())
                    .with_delivery_mode(PERSISTENT),
            )
            .await?;

        Ok(PendingConfirm::new(async move {
            let confirmation = confirm.await?;
            // `NotRequested` only happens without confirm mode; never count it
            // as accepted.
            if confirmation.is_ack() {
                Ok(Confirm::Ack)
            } else {
                Ok(Confirm::Nack)
            }
        }))
    }
}

// ---------------------------------------------------------------------------
// Consumer
// ---------------------------------------------------------------------------

/// Stream of deliveries from the job queue.
pub struct AmqpConsumer {
    // Keeps the consumer channel alive for as long as the stream is read.
    _channel: Channel,
    consumer: lapin::Consumer,
}

#[async_trait]
impl Consumer for AmqpConsumer {
    async fn recv(&mut self) -> Option<Result<DeliveryEnvelope, BrokerError>> {
        let delivery = match self.consumer.next().await? {
            Ok(delivery) => delivery,
            Err(e) => return Some(Err(e.into())),
        };

        Some(Ok(DeliveryEnvelope::new(
            delivery.data,
            delivery.delivery_tag,
            delivery.redelivered,
            AmqpSettle(delivery.acker),
        )))
    }
}

struct AmqpSettle(Acker);

#[async_trait]
impl Settle for AmqpSettle {
    async fn ack(&self) -> Result<(), BrokerError> {
        self.0.ack(BasicAckOptions::default()).await?;
        Ok(())
    }

    async fn reject(&self) -> Result<(), BrokerError> {
        self.0
            .nack(BasicNackOptions {
                multiple: false,
                requeue: false,
            })
            .await?;
        Ok(())
    }
}
