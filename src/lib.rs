pub mod admission;
pub mod configuration;
pub mod domain;
pub mod metrics;
pub mod middleware;
pub mod queue;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
pub mod worker;
