use actix_web::web;
use actix_web::HttpResponse;

use crate::metrics::ApiMetrics;

/// `GET /metrics` — text exposition of the API process's registry.
pub async fn metrics(metrics: web::Data<ApiMetrics>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics.gather())
}
