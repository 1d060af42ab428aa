use crate::helpers::spawn_app;

/// S6 in spec.md §8.
#[tokio::test]
async fn docs_serves_the_swagger_ui_bundle() {
    let app = spawn_app().await;

    let resp = app.docs().await;

    assert!(resp.status().is_success());
    let body = resp.text().await.unwrap();
    assert!(body.contains("SwaggerUIBundle"));
}

/// S6 in spec.md §8.
#[tokio::test]
async fn openapi_yaml_is_served_with_a_yaml_content_type() {
    let app = spawn_app().await;

    let resp = app.openapi_yaml().await;

    assert!(resp.status().is_success());
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.contains("yaml"));

    let body = resp.text().await.unwrap();
    assert!(body.starts_with("openapi: 3.0.3"));
}
