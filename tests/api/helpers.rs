use campaign_pipeline::configuration::get_configuration;
use campaign_pipeline::queue::QueueHandle;
use campaign_pipeline::startup::Application;
use campaign_pipeline::telemetry::get_subscriber;
use campaign_pipeline::telemetry::init_subscriber;
use once_cell::sync::Lazy;
use sqlx::Connection;
use sqlx::Executor;
use sqlx::PgConnection;
use sqlx::PgPool;
use uuid::Uuid;

/// Init a static subscriber using the `once_cell` crate, same pattern as
/// `examples/hejops-ztp/tests/api/helpers.rs::TRACING`. Opt in to verbose
/// logging with `TEST_LOG=true cargo test [test_name] | bunyan`.
static TRACING: Lazy<()> = Lazy::new(|| {
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber);
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber);
        }
    };
});

pub struct TestApp {
    pub addr: String,
    pub pool: PgPool,
    /// A handle on the same queue `campaign-api`/`sender-worker` publish to,
    /// so tests can drain it directly instead of standing up a real worker.
    pub queue: QueueHandle,
}

#[derive(serde::Deserialize)]
pub struct CreateCampaignResponse {
    pub id: i64,
}

impl TestApp {
    pub async fn post_campaign(&self, body: &serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/campaigns", self.addr))
            .json(body)
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn list_campaigns(&self, query: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("{}/campaigns{query}", self.addr))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn get_campaign(&self, id: i64) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("{}/campaigns/{id}", self.addr))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn healthz(&self) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("{}/healthz", self.addr))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn metrics(&self) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("{}/metrics", self.addr))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn docs(&self) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("{}/docs", self.addr))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn openapi_yaml(&self) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("{}/docs/campaign-api/openapi.yaml", self.addr))
            .send()
            .await
            .expect("failed to execute request")
    }

    pub async fn message_status(&self, campaign_id: i64, recipient_id: i64) -> String {
        sqlx::query!(
            "SELECT status FROM messages WHERE campaign_id = $1 AND recipient_id = $2",
            campaign_id,
            recipient_id,
        )
        .fetch_one(&self.pool)
        .await
        .expect("message row must exist")
        .status
    }
}

/// Swaps the database name out of a DSN, leaving host/port/creds alone, so
/// each test gets its own throwaway database the way
/// `examples/hejops-ztp/tests/api/helpers.rs::configure_database` does via
/// `DatabaseSettings`. This crate's `Settings` keeps a single DSN string
/// rather than a structured `DatabaseSettings`, so the swap happens here via
/// `url::Url` instead.
fn randomized_dsn(base_dsn: &str) -> (String, String) {
    let mut url = reqwest::Url::parse(base_dsn).expect("DB_DSN must be a valid postgres URL");
    let db_name = Uuid::new_v4().to_string();
    url.set_path(&format!("/{db_name}"));
    (url.to_string(), db_name)
}

/// Connects to the DSN's own server (not a fixed `postgres` maintenance db,
/// since the base DSN may not grant access to one), creates `db_name`, then
/// runs this crate's migrations against it.
async fn configure_database(base_dsn: &str, test_dsn: &str, db_name: &str) -> PgPool {
    let mut conn = PgConnection::connect(base_dsn)
        .await
        .expect("postgres must be running; see DB_DSN");
    conn.execute(format!(r#"CREATE DATABASE "{db_name}";"#).as_str())
        .await
        .expect("failed to create test database");

    let pool = PgPool::connect(test_dsn)
        .await
        .expect("failed to connect to freshly created test database");
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("failed to run migrations against test database");
    pool
}

/// Spawns `campaign-api` against a freshly created database and a
/// randomized queue name, bound to an OS-assigned port. `DB_DSN`/`RMQ_URL`
/// must point at a running Postgres/RabbitMQ (same assumption
/// `examples/hejops-ztp` makes about `DB_DSN` alone — see
/// `scripts/init_db.sh`'s analogue for this crate, run once before `cargo
/// test`).
pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let mut settings = get_configuration()
        .expect("failed to read configuration; DB_DSN and RMQ_URL must be set");
    settings.port = 0;
    settings.queue = format!("test_send_jobs_{}", Uuid::new_v4());

    let (test_dsn, db_name) = randomized_dsn(&settings.db_dsn);
    let pool = configure_database(&settings.db_dsn, &test_dsn, &db_name).await;
    settings.db_dsn = test_dsn;

    let queue = QueueHandle::connect(&settings.rmq_url, &settings.queue)
        .await
        .expect("failed to connect to the test broker");

    let app = Application::build(settings.clone())
        .await
        .expect("failed to build application");
    let addr = format!("http://localhost:{}", app.get_port());
    tokio::spawn(app.run_until_stopped());

    TestApp { addr, pool, queue }
}
