use actix_web::web;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use campaign_pipeline::configuration::get_configuration;
use campaign_pipeline::configuration::get_connection_pool;
use campaign_pipeline::configuration::normalize_bind_addr;
use campaign_pipeline::metrics::WorkerMetrics;
use campaign_pipeline::queue::QueueHandle;
use campaign_pipeline::store::Store;
use campaign_pipeline::telemetry::get_subscriber;
use campaign_pipeline::telemetry::init_subscriber;
use campaign_pipeline::worker;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Entry point for the queue-consumer pool. Mirrors
/// `examples/original_source/services/sender-worker/cmd/sender-worker/main.go`: load config,
/// init telemetry, open store + queue, run `WORKER_CONCURRENCY` consumer
/// loops plus a `/metrics` listener, shut down cleanly on SIGINT/SIGTERM.
#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let settings = get_configuration()?;

    let subscriber = get_subscriber("sender-worker", &settings.log_level, std::io::stdout);
    init_subscriber(subscriber);

    let pool = get_connection_pool(&settings.db_dsn);
    let store = Store::new(pool);

    let queue = QueueHandle::connect(&settings.rmq_url, &settings.queue).await?;
    let publisher = queue.publisher();
    let metrics = WorkerMetrics::new()?;

    let cancel = CancellationToken::new();
    spawn_signal_handler(cancel.clone());

    let metrics_server = run_metrics_server(&settings.metrics_addr, metrics.clone())?;
    let metrics_handle = metrics_server.handle();
    let metrics_shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        metrics_shutdown_cancel.cancelled().await;
        metrics_handle.stop(true).await;
    });

    let concurrency = settings.worker_concurrency.max(1);
    tracing::info!(concurrency, "sender_worker_starting");

    let mut workers = JoinSet::new();
    for worker_id in 0..concurrency {
        let store = store.clone();
        let consumer = queue.consumer();
        let publisher = publisher.clone();
        let metrics = metrics.clone();
        let cancel = cancel.clone();
        workers.spawn(async move {
            if let Err(e) = worker::run(store, consumer, publisher, metrics, cancel).await {
                tracing::error!(worker_id, error = %e, "worker_exited_with_error");
            }
        });
    }

    tokio::select! {
        _ = async { while workers.join_next().await.is_some() {} } => {
            tracing::warn!("all_worker_loops_exited");
        }
        res = metrics_server => { res?; }
    }

    tracing::info!("sender_worker_exited_gracefully");
    Ok(())
}

fn spawn_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        tracing::info!("shutdown_signal_received");
        cancel.cancel();
    });
}

async fn worker_metrics(metrics: web::Data<WorkerMetrics>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics.gather())
}

fn run_metrics_server(
    addr: &str,
    metrics: WorkerMetrics,
) -> Result<actix_web::dev::Server, anyhow::Error> {
    let addr = normalize_bind_addr(addr);
    let metrics = web::Data::new(metrics);
    let server = HttpServer::new(move || {
        App::new()
            .route("/metrics", web::get().to(worker_metrics))
            .app_data(metrics.clone())
    })
    .bind(addr)?
    .shutdown_timeout(5)
    .run();
    Ok(server)
}
