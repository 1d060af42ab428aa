//! Ambient HTTP middleware for `campaign-api`: a request id on every
//! response and two Prometheus observations per request. Grounded in the
//! `reject_anonymous_users` `from_fn` middleware in
//! `examples/hejops-ztp/src/authentication/middleware.rs` and the Go
//! original's `Observability()` gin middleware
//! (`examples/original_source/services/campaign-api/server/middleware.go`),
//! which stamps a request id and records the same two metrics.

use std::time::Instant;

use actix_web::body::MessageBody;
use actix_web::dev::ServiceRequest;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::HeaderName;
use actix_web::http::header::HeaderValue;
use actix_web::web;
use actix_web_lab::middleware::Next;
use uuid::Uuid;

use crate::metrics::ApiMetrics;

const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Propagates the caller's `X-Request-ID` if present, otherwise mints a
/// fresh one, stamps it onto the response, and records
/// `api_http_requests_total` / `api_http_request_duration_seconds` for the
/// matched route.
pub async fn observability(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = req.method().to_string();
    let path = req.match_pattern().unwrap_or_else(|| req.path().to_string());
    let metrics = req.app_data::<web::Data<ApiMetrics>>().cloned();
    let start = Instant::now();

    let mut response = next.call(req).await?;

    let header_value = HeaderValue::from_str(&request_id)
        .unwrap_or_else(|_| HeaderValue::from_static("invalid-request-id"));
    response
        .headers_mut()
        .insert(HeaderName::from_static("x-request-id"), header_value);

    if let Some(metrics) = metrics {
        let status = response.status().as_u16().to_string();
        metrics
            .http_requests_total
            .with_label_values(&[&method, &path, &status])
            .inc();
        metrics
            .http_request_duration_seconds
            .with_label_values(&[&method, &path])
            .observe(start.elapsed().as_secs_f64());
    }

    Ok(response)
}
