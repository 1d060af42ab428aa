use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::web;
use actix_web::App;
use actix_web::HttpServer;
use actix_web_lab::middleware::from_fn;
use tracing_actix_web::TracingLogger;

use crate::configuration::get_connection_pool;
use crate::configuration::Settings;
use crate::metrics::ApiMetrics;
use crate::middleware::observability;
use crate::queue::Publisher;
use crate::queue::QueueHandle;
use crate::routes::get_campaign_by_id;
use crate::routes::get_campaigns;
use crate::routes::health_check;
use crate::routes::metrics;
use crate::routes::openapi_yaml;
use crate::routes::post_campaign;
use crate::routes::swagger_ui;
use crate::store::Store;

/// Wrapper around actix's `Server` that also exposes the bound port, the
/// way `examples/hejops-ztp/src/startup.rs::Application` does for its own
/// HTTP server. Not to be confused with actix's `App`.
pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Reads `Settings`, opens the DB pool and the AMQP channel, and binds
    /// the `campaign-api` HTTP server. Mirrors
    /// `examples/original_source/services/campaign-api/cmd/campaign-api/main.go`'s startup
    /// sequence: load config, open store, connect queue, serve.
    pub async fn build(settings: Settings) -> Result<Self, anyhow::Error> {
        let addr = format!("0.0.0.0:{}", settings.port);
        let listener = TcpListener::bind(addr)?;
        let port = listener.local_addr()?.port();

        let pool = get_connection_pool(&settings.db_dsn);
        let store = Store::new(pool);

        let queue = QueueHandle::connect(&settings.rmq_url, &settings.queue).await?;
        let publisher = queue.publisher();

        let metrics = ApiMetrics::new()?;

        let server = run(listener, store, publisher, metrics)?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 { self.port }

    /// Consumes `self`; should be the final call (or handed to `tokio::spawn`).
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> { self.server.await }
}

/// Declares every `campaign-api` route, wraps the app in the tracing +
/// request-id/metrics middleware, and binds `listener`. A graceful-shutdown
/// window of 5 seconds matches spec.md §5's "HTTP server begins graceful
/// shutdown with a 5-second drain".
pub fn run(
    listener: TcpListener,
    store: Store,
    publisher: Publisher,
    api_metrics: ApiMetrics,
) -> Result<Server, anyhow::Error> {
    let store = web::Data::new(store);
    let publisher = web::Data::new(publisher);
    let api_metrics = web::Data::new(api_metrics);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .wrap(from_fn(observability))
            .route("/healthz", web::get().to(health_check))
            .route("/metrics", web::get().to(metrics))
            .route("/docs", web::get().to(swagger_ui))
            .route("/docs/campaign-api/openapi.yaml", web::get().to(openapi_yaml))
            .route("/campaigns", web::post().to(post_campaign))
            .route("/campaigns", web::get().to(get_campaigns))
            .route("/campaigns/{id}", web::get().to(get_campaign_by_id))
            .app_data(store.clone())
            .app_data(publisher.clone())
            .app_data(api_metrics.clone())
    })
    .listen(listener)?
    .shutdown_timeout(5)
    .run();

    Ok(server)
}
