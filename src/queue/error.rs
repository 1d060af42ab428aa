use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("failed to connect to the broker: {0}")]
    Connect(#[source] lapin::Error),
    #[error("failed to open a channel: {0}")]
    Channel(#[source] lapin::Error),
    #[error("failed to declare queue: {0}")]
    Declare(#[source] lapin::Error),
    #[error("publish was not confirmed: {0}")]
    Publish(#[source] lapin::Error),
    #[error("publish was nacked by the broker")]
    Nacked,
    #[error("failed to serialize job payload: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("consume failed: {0}")]
    Consume(#[source] lapin::Error),
    #[error("ack/nack failed: {0}")]
    Ack(#[source] lapin::Error),
}
