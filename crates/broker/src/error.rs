/// Errors raised by the broker client.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// Protocol or transport failure reported by the AMQP client.
    #[error(transparent)]
    Amqp(#[from] lapin::Error),

    /// The channel or in-process queue has been closed.
    #[error("broker channel closed")]
    Closed,
}
