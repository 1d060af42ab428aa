use actix_web::http::header::ContentType;
use actix_web::HttpResponse;

const OPENAPI_YAML: &str = include_str!("../../assets/docs/campaign-api.openapi.yaml");
const SWAGGER_HTML: &str = include_str!("../../assets/docs/swagger.html");

/// `GET /docs` — Rust's `include_str!` analogue of the Go original's
/// `//go:embed` (`examples/original_source/docs/embed.go`).
pub async fn swagger_ui() -> HttpResponse {
    HttpResponse::Ok().content_type(ContentType::html()).body(SWAGGER_HTML)
}

/// `GET /docs/campaign-api/openapi.yaml`
pub async fn openapi_yaml() -> HttpResponse {
    HttpResponse::Ok().content_type("application/yaml").body(OPENAPI_YAML)
}
