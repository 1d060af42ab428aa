use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;

use crate::admission;
use crate::admission::AdmissionError;
use crate::admission::CreateCampaignRequest;
use crate::queue::Publisher;
use crate::routes::error_chain_fmt;
use crate::store::Store;

impl std::fmt::Debug for AdmissionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { error_chain_fmt(self, f) }
}

impl ResponseError for AdmissionError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PublishFailed(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// `POST /campaigns`
#[tracing::instrument(skip(store, publisher, request))]
pub async fn create_campaign(
    request: web::Json<CreateCampaignRequest>,
    store: web::Data<Store>,
    publisher: web::Data<Publisher>,
) -> Result<HttpResponse, AdmissionError> {
    let response = admission::create_campaign(&store, &publisher, request.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}
