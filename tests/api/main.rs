// fn main not required

mod campaigns;
mod docs;
mod health_check;
mod helpers;

// Integration tests live under tests/api rather than as flat tests/*.rs
// files so the whole suite links into a single test binary (compiled once,
// run once) instead of one binary per file — see
// examples/hejops-ztp/tests/api/main.rs for the same layout.
//
// Both `campaign-api` and `sender-worker` need a live Postgres and a live
// RabbitMQ to exercise end to end; `helpers::spawn_app` expects `DB_DSN` and
// `RMQ_URL` in the environment (same assumption the teacher's suite makes of
// `DB_DSN` alone) and creates a fresh randomized database and queue name per
// test so tests can run concurrently without clobbering each other.
