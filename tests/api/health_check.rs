use crate::helpers::spawn_app;

#[tokio::test]
async fn health_check_returns_200_ok() {
    let app = spawn_app().await;

    let resp = app.healthz().await;

    assert!(resp.status().is_success());
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn metrics_exposes_the_http_counters() {
    let app = spawn_app().await;
    app.healthz().await;

    let resp = app.metrics().await;

    assert!(resp.status().is_success());
    let body = resp.text().await.unwrap();
    assert!(body.contains("api_http_requests_total"));
    assert!(body.contains("api_http_request_duration_seconds"));
}
