use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpResponse;
use actix_web::ResponseError;
use serde::Serialize;

use crate::routes::error_chain_fmt;
use crate::store::Campaign;
use crate::store::CampaignStats;
use crate::store::Store;
use crate::store::StoreError;

#[derive(Serialize)]
struct CampaignDetail {
    #[serde(flatten)]
    campaign: Campaign,
    body: String,
    stats: CampaignStats,
}

impl std::fmt::Debug for StoreError {
    // `thiserror`'s derive already gives every variant a `Display`; this
    // only routes `{:?}` (what actix logs on a 500) through the same
    // chain-printing helper every other route error uses.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { error_chain_fmt(self, f) }
}

impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Timeout | Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `GET /campaigns/{id}`
#[tracing::instrument(skip(store))]
pub async fn get_campaign(
    path: web::Path<i64>,
    store: web::Data<Store>,
) -> Result<HttpResponse, actix_web::Error> {
    let id = path.into_inner();
    if id <= 0 {
        return Err(actix_web::error::ErrorBadRequest("id must be a positive integer"));
    }

    let campaign = store.get_campaign(id).await?;
    let body = store.get_campaign_body(store.pool(), id).await?;
    let stats = store.get_campaign_stats(id).await?;

    Ok(HttpResponse::Ok().json(CampaignDetail { campaign, body, stats }))
}
