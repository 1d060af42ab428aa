use std::time::Duration;

use config::Config;
use config::ConfigError;
use config::Environment;
use serde::Deserialize;
use serde::Deserializer;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Settings shared by both binaries. Each binary reads only the fields it
/// needs; unused fields are still validated so a missing `DB_DSN` fails
/// startup the same way for `campaign-api` and `sender-worker`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_port")]
    pub port: u16,
    pub db_dsn: String,
    pub rmq_url: String,
    #[serde(default = "default_queue")]
    pub queue: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,
    #[serde(default = "default_worker_concurrency", deserialize_with = "deserialize_from_str")]
    pub worker_concurrency: usize,
}

fn default_port() -> u16 { 8080 }
fn default_queue() -> String { "send_jobs".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_metrics_addr() -> String { ":9090".to_string() }
fn default_worker_concurrency() -> usize { 1 }

fn deserialize_from_str<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    // `config::Environment` hands every value over as a string; let serde
    // coerce it the way the rest of `Settings` relies on `config` to do.
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

/// Loads configuration from the environment (`PORT`, `DB_DSN`, `RMQ_URL`,
/// `QUEUE`, `LOG_LEVEL`, `METRICS_ADDR`, `WORKER_CONCURRENCY`). There is no
/// config file: every knob this system has is environment-driven, mirroring
/// `pkg/config.MustLoadAPI`/`MustLoadWorker` in the Go original.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .add_source(Environment::default())
        .build()?;
    settings.try_deserialize()
}

pub const TRANSACTION_DEADLINE: Duration = Duration::from_secs(10);
pub const PUBLISH_DEADLINE: Duration = Duration::from_secs(5);
pub const DB_CALL_DEADLINE: Duration = Duration::from_secs(5);
pub const DEFAULT_PREFETCH: u16 = 10;
pub const MAX_RETRIES: u32 = 3;

/// `connect_lazy` so handlers that never touch the database (`/healthz`)
/// don't pay for a connection at startup.
pub fn get_connection_pool(dsn: &str) -> PgPool {
    PgPoolOptions::new()
        .connect_lazy(dsn)
        .expect("DB_DSN must be a valid postgres connection string")
}

/// `METRICS_ADDR` follows Go's `net.Listen("tcp", ":9090")` convention of
/// leaving the host empty to mean "all interfaces"; normalize that to the
/// form `TcpListener::bind` accepts.
pub fn normalize_bind_addr(addr: &str) -> String {
    if let Some(port) = addr.strip_prefix(':') {
        format!("0.0.0.0:{port}")
    } else {
        addr.to_string()
    }
}
