use actix_web::web;
use actix_web::HttpResponse;
use serde::Deserialize;
use serde::Serialize;

use crate::store::Campaign;
use crate::store::CampaignStats;
use crate::store::Store;

#[derive(Deserialize)]
pub struct ListQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Serialize)]
struct CampaignSummary {
    #[serde(flatten)]
    campaign: Campaign,
    stats: CampaignStats,
}

/// `GET /campaigns?limit&offset`
#[tracing::instrument(skip(store))]
pub async fn list_campaigns(
    query: web::Query<ListQuery>,
    store: web::Data<Store>,
) -> Result<HttpResponse, actix_web::Error> {
    let rows = store
        .list_campaigns(query.limit, query.offset)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    let body: Vec<CampaignSummary> = rows
        .into_iter()
        .map(|(campaign, stats)| CampaignSummary { campaign, stats })
        .collect();

    Ok(HttpResponse::Ok().json(body))
}
