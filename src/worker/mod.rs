mod error;
mod send;

pub use error::WorkerError;
pub use send::simulate_send;
pub use send::SendError;

use std::time::Duration;
use std::time::Instant;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::admission::Job;
use crate::configuration::DB_CALL_DEADLINE;
use crate::configuration::MAX_RETRIES;
use crate::metrics::WorkerMetrics;
use crate::queue::Consumer;
use crate::queue::Delivery;
use crate::queue::JobHeaders;
use crate::queue::Publisher;
use crate::store::Store;

/// `backoff(r) = 0` for `r = 0`, `2^(r-1)` seconds otherwise —
/// `backoff(1) = 1s`, `backoff(2) = 2s`, `backoff(3) = 4s` — mirroring
/// `backoffDelay` in `worker.go`.
pub fn backoff(retries: u32) -> Duration {
    if retries == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs(1 << (retries - 1))
}

/// The shape of `simulate_send`: a plain `fn` pointer rather than a boxed
/// trait object, since the call site never needs to capture state. `run`
/// takes this as a parameter (instead of calling `simulate_send` directly)
/// so tests can swap in a deterministic stand-in without a mock framework.
pub type SendFn = fn(&str, &str) -> Result<(), SendError>;

/// Drives one consumer's delivery stream to completion (stream closed) or
/// until `cancel` fires. Retries are implemented by republishing the
/// original body with an incremented `retries` header and acking the
/// delivery that was just handled, rather than nack-requeuing it — this is
/// the one place the pipeline departs from the Go original's worker, whose
/// `Nack(requeue=true)` discards the in-memory header bump before the
/// broker ever sees it and so never actually converges (see DESIGN.md).
pub async fn run(
    store: Store,
    consumer: Consumer,
    publisher: Publisher,
    metrics: WorkerMetrics,
    cancel: CancellationToken,
) -> Result<(), WorkerError> {
    run_with_send(store, consumer, publisher, metrics, cancel, simulate_send).await
}

/// Same as [`run`], but with the send step injected — `run` is the
/// production entry point and always passes [`simulate_send`]; tests pass a
/// deterministic [`SendFn`] to exercise `handle_delivery`'s ack/nack/republish
/// discipline without depending on `simulate_send`'s 85% success rate.
pub async fn run_with_send(
    store: Store,
    consumer: Consumer,
    publisher: Publisher,
    metrics: WorkerMetrics,
    cancel: CancellationToken,
    send: SendFn,
) -> Result<(), WorkerError> {
    let mut deliveries = Box::pin(consumer.consume().await?);

    loop {
        let delivery = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("worker_stopping");
                return Ok(());
            }
            next = deliveries.next() => next,
        };

        let Some(delivery) = delivery else {
            tracing::warn!("consumer_stream_closed");
            return Ok(());
        };

        let delivery = match delivery {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(error = %e, "consume_error");
                continue;
            }
        };

        handle_delivery(&store, &publisher, &metrics, delivery, &cancel, send).await;
    }
}

async fn handle_delivery(
    store: &Store,
    publisher: &Publisher,
    metrics: &WorkerMetrics,
    delivery: Delivery,
    cancel: &CancellationToken,
    send: SendFn,
) {
    let start = Instant::now();
    metrics.jobs_consumed_total.inc();

    let job: Job = match serde_json::from_slice(delivery.body()) {
        Ok(job) => job,
        Err(e) => {
            tracing::warn!(error = %e, "job_unmarshal_error");
            let _ = delivery.ack().await;
            metrics.job_process_duration_seconds.observe(start.elapsed().as_secs_f64());
            return;
        }
    };
    let headers = delivery.headers;

    let body = match tokio::time::timeout(DB_CALL_DEADLINE, store.get_campaign_body(store.pool(), job.campaign_id)).await {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            tracing::error!(error = %e, campaign_id = job.campaign_id, recipient_id = job.recipient_id, "db_get_campaign_body_error");
            let _ = delivery.nack(true).await;
            metrics.job_process_duration_seconds.observe(start.elapsed().as_secs_f64());
            return;
        }
        Err(_) => {
            tracing::error!(campaign_id = job.campaign_id, recipient_id = job.recipient_id, "db_get_campaign_body_timeout");
            let _ = delivery.nack(true).await;
            metrics.job_process_duration_seconds.observe(start.elapsed().as_secs_f64());
            return;
        }
    };

    match send(&job.address, &body) {
        Ok(()) => {
            let mark = tokio::time::timeout(
                DB_CALL_DEADLINE,
                store.mark_message_sent(store.pool(), job.campaign_id, job.recipient_id),
            )
            .await;
            match mark {
                Ok(Ok(())) => {
                    metrics.jobs_sent_total.inc();
                    tracing::info!(campaign_id = job.campaign_id, recipient_id = job.recipient_id, "send_success");
                    let _ = delivery.ack().await;
                }
                _ => {
                    tracing::error!(campaign_id = job.campaign_id, recipient_id = job.recipient_id, "db_mark_sent_error");
                    let _ = delivery.nack(true).await;
                }
            }
        }
        Err(e) => {
            let mark = tokio::time::timeout(
                DB_CALL_DEADLINE,
                store.mark_message_failed(store.pool(), job.campaign_id, job.recipient_id, &e.to_string()),
            )
            .await;

            match mark {
                Ok(Ok(())) => {
                    metrics.jobs_failed_total.inc();

                    if headers.retries < MAX_RETRIES {
                        let delay = backoff(headers.retries);
                        tracing::info!(
                            campaign_id = job.campaign_id,
                            recipient_id = job.recipient_id,
                            retries = headers.retries + 1,
                            delay_ms = delay.as_millis() as u64,
                            "retry_scheduled"
                        );

                        let interrupted = tokio::select! {
                            _ = cancel.cancelled() => true,
                            _ = tokio::time::sleep(delay) => false,
                        };

                        if interrupted {
                            let _ = delivery.nack(true).await;
                            metrics.job_process_duration_seconds.observe(start.elapsed().as_secs_f64());
                            return;
                        }

                        let next_headers = JobHeaders { retries: headers.retries + 1 };
                        let body_bytes = delivery.body().to_vec();
                        match publisher.publish(&body_bytes, next_headers).await {
                            Ok(()) => {
                                metrics.job_retries_total.inc();
                                let _ = delivery.ack().await;
                            }
                            Err(e) => {
                                tracing::error!(error = %e, "republish_failed");
                                let _ = delivery.nack(true).await;
                            }
                        }
                    } else {
                        tracing::warn!(
                            campaign_id = job.campaign_id,
                            recipient_id = job.recipient_id,
                            retries = headers.retries,
                            "drop_after_retries"
                        );
                        let _ = delivery.ack().await;
                    }
                }
                _ => {
                    tracing::error!(campaign_id = job.campaign_id, recipient_id = job.recipient_id, "db_mark_failed_error");
                    let _ = delivery.nack(true).await;
                }
            }
        }
    }

    metrics.job_process_duration_seconds.observe(start.elapsed().as_secs_f64());
}
