use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub body: String,
    pub scheduled_at: DateTime<Utc>,
    pub recipients: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateCampaignResponse {
    pub id: i64,
}

/// Wire shape of a queued job, mirroring `campaign.JobMessage` in the Go
/// original byte-for-byte (field names are a cross-process contract with
/// the worker).
#[derive(Debug, Serialize, Deserialize)]
pub struct Job {
    pub campaign_id: i64,
    pub recipient_id: i64,
    pub address: String,
}
