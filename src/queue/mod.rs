mod error;

use futures_util::Stream;
use futures_util::StreamExt;
use lapin::options::BasicAckOptions;
use lapin::options::BasicConsumeOptions;
use lapin::options::BasicNackOptions;
use lapin::options::BasicPublishOptions;
use lapin::options::BasicQosOptions;
use lapin::options::ConfirmSelectOptions;
use lapin::options::QueueDeclareOptions;
use lapin::types::AMQPValue;
use lapin::types::FieldTable;
use lapin::BasicProperties;
use lapin::Channel;
use lapin::Connection;
use lapin::ConnectionProperties;

pub use error::QueueError;

const RETRIES_HEADER: &str = "retries";
const DEFAULT_PREFETCH: u16 = 10;

/// A `retries` count carried on a job's AMQP headers. Reading it tolerates
/// any integer field type the broker hands back, mirroring `headerRetries`
/// in the Go original's worker.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobHeaders {
    pub retries: u32,
}

impl JobHeaders {
    fn from_amqp(headers: &Option<FieldTable>) -> Self {
        let Some(table) = headers.as_ref() else {
            return Self::default();
        };
        let retries = table
            .inner()
            .get(RETRIES_HEADER)
            .and_then(|v| match v {
                AMQPValue::ShortShortInt(n) => u32::try_from(*n).ok(),
                AMQPValue::ShortShortUInt(n) => Some(*n as u32),
                AMQPValue::ShortInt(n) => u32::try_from(*n).ok(),
                AMQPValue::ShortUInt(n) => Some(*n as u32),
                AMQPValue::LongInt(n) => u32::try_from(*n).ok(),
                AMQPValue::LongUInt(n) => Some(*n),
                AMQPValue::LongLongInt(n) => u32::try_from(*n).ok(),
                _ => None,
            })
            .unwrap_or(0);
        Self { retries }
    }

    fn to_amqp(self) -> FieldTable {
        let mut table = FieldTable::default();
        table.insert(RETRIES_HEADER.into(), AMQPValue::LongUInt(self.retries));
        table
    }
}

/// Connection + channel pair bound to one durable queue. Cheap to clone
/// (`lapin::Channel` is internally an `Arc`-backed handle), so the same
/// `QueueHandle` can hand out a `Publisher` to admission and a `Consumer`
/// to the worker.
#[derive(Clone)]
pub struct QueueHandle {
    channel: Channel,
    queue: String,
}

impl QueueHandle {
    #[tracing::instrument(skip(url))]
    pub async fn connect(url: &str, queue: &str) -> Result<Self, QueueError> {
        let connection = Connection::connect(url, ConnectionProperties::default())
            .await
            .map_err(QueueError::Connect)?;
        let channel = connection.create_channel().await.map_err(QueueError::Channel)?;
        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(QueueError::Channel)?;
        channel
            .queue_declare(
                queue,
                QueueDeclareOptions { durable: true, ..Default::default() },
                FieldTable::default(),
            )
            .await
            .map_err(QueueError::Declare)?;
        channel
            .basic_qos(DEFAULT_PREFETCH, BasicQosOptions::default())
            .await
            .map_err(QueueError::Declare)?;
        Ok(Self { channel, queue: queue.to_string() })
    }

    pub fn publisher(&self) -> Publisher {
        Publisher { channel: self.channel.clone(), queue: self.queue.clone() }
    }

    pub fn consumer(&self) -> Consumer {
        Consumer { channel: self.channel.clone(), queue: self.queue.clone() }
    }
}

#[derive(Clone)]
pub struct Publisher {
    channel: Channel,
    queue: String,
}

impl Publisher {
    #[tracing::instrument(skip(self, body))]
    pub async fn publish(&self, body: &[u8], headers: JobHeaders) -> Result<(), QueueError> {
        let properties = BasicProperties::default()
            .with_content_type("application/json".into())
            .with_delivery_mode(2) // persistent
            .with_headers(headers.to_amqp());

        let confirm = self
            .channel
            .basic_publish(
                "",
                &self.queue,
                BasicPublishOptions::default(),
                body,
                properties,
            )
            .await
            .map_err(QueueError::Publish)?
            .await
            .map_err(QueueError::Publish)?;

        if confirm.is_nack() {
            return Err(QueueError::Nacked);
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct Consumer {
    channel: Channel,
    queue: String,
}

impl Consumer {
    pub async fn consume(
        &self,
    ) -> Result<impl Stream<Item = Result<Delivery, QueueError>>, QueueError> {
        let consumer = self
            .channel
            .basic_consume(
                &self.queue,
                "",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(QueueError::Consume)?;

        Ok(consumer.map(|delivery| {
            let delivery = delivery.map_err(QueueError::Consume)?;
            let headers = JobHeaders::from_amqp(&delivery.properties.headers().clone());
            Ok(Delivery { inner: delivery, headers })
        }))
    }
}

/// One unacked message pulled off the queue, along with its parsed retry
/// header. Consuming `ack`/`nack` takes `self` by value so a delivery can't
/// be acked twice.
pub struct Delivery {
    inner: lapin::message::Delivery,
    pub headers: JobHeaders,
}

impl Delivery {
    pub fn body(&self) -> &[u8] { &self.inner.data }

    pub async fn ack(self) -> Result<(), QueueError> {
        self.inner
            .ack(BasicAckOptions::default())
            .await
            .map_err(QueueError::Ack)
    }

    pub async fn nack(self, requeue: bool) -> Result<(), QueueError> {
        self.inner
            .nack(BasicNackOptions { requeue, ..Default::default() })
            .await
            .map_err(QueueError::Ack)
    }
}
