use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

/// Campaign metadata, minus `body` — the body is fetched separately
/// (`Store::get_campaign_body`) since the list view never needs it and the
/// worker only ever wants the body, never the rest of the row.
#[derive(Debug, Clone, Serialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CampaignStats {
    pub total: i64,
    pub pending: i64,
    pub sent: i64,
    pub failed: i64,
}
