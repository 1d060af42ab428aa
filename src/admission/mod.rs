mod error;
mod types;

pub use error::AdmissionError;
pub use types::CreateCampaignRequest;
pub use types::CreateCampaignResponse;
pub use types::Job;

use crate::configuration::PUBLISH_DEADLINE;
use crate::configuration::TRANSACTION_DEADLINE;
use crate::domain::CampaignName;
use crate::domain::RecipientAddress;
use crate::queue::JobHeaders;
use crate::queue::Publisher;
use crate::store::Store;

/// Validates the request, then admits it: one transaction inserts the
/// campaign, its recipients and their pending messages; once committed,
/// one job per recipient is published in request order.
///
/// Grounded in `examples/original_source/services/campaign-api/server/handlers.go`'s
/// `CreateCampaign`. Deviates from it in one place: a publish failure here
/// stops publishing the *remaining* jobs and surfaces `PublishFailed`
/// instead of silently swallowing the error, since the Go handler's
/// publish-loop error is a `TODO` the original never filled in.
#[tracing::instrument(skip_all, fields(campaign_name = %request.name, recipients = request.recipients.len()))]
pub async fn create_campaign(
    store: &Store,
    publisher: &Publisher,
    request: CreateCampaignRequest,
) -> Result<CreateCampaignResponse, AdmissionError> {
    validate(&request)?;

    let (campaign_id, recipients) = insert_and_collect(store, &request).await?;

    for (recipient_id, address) in recipients {
        let job = Job { campaign_id, recipient_id, address };
        let payload = serde_json::to_vec(&job)
            .map_err(|e| AdmissionError::Internal(e.into()))?;

        tokio::time::timeout(
            PUBLISH_DEADLINE,
            publisher.publish(&payload, JobHeaders::default()),
        )
        .await
        .map_err(|_| AdmissionError::PublishFailed(anyhow::anyhow!("publish timed out")))?
        .map_err(|e| AdmissionError::PublishFailed(e.into()))?;
    }

    Ok(CreateCampaignResponse { id: campaign_id })
}

/// Parse-don't-validate: `CampaignName`/`RecipientAddress` can only be
/// constructed non-empty, so a successful parse here is the proof the rest
/// of admission needs. Mirrors the `SubscriberName`/`SubscriberEmail`
/// newtype idiom; see domain::campaign_name, domain::recipient_address.
fn validate(request: &CreateCampaignRequest) -> Result<(), AdmissionError> {
    CampaignName::parse(request.name.clone()).map_err(AdmissionError::BadRequest)?;
    if request.body.trim().is_empty() {
        return Err(AdmissionError::BadRequest("body must not be empty".into()));
    }
    if request.recipients.is_empty() {
        return Err(AdmissionError::BadRequest("recipients must not be empty".into()));
    }
    for address in &request.recipients {
        RecipientAddress::parse(address.clone()).map_err(AdmissionError::BadRequest)?;
    }
    Ok(())
}

/// Inserts the campaign, each recipient, and a `pending` message per
/// recipient inside one transaction. Returns the campaign id plus the
/// `(recipient_id, address)` pairs in request order, for the caller to
/// publish once the transaction has committed.
async fn insert_and_collect(
    store: &Store,
    request: &CreateCampaignRequest,
) -> Result<(i64, Vec<(i64, String)>), AdmissionError> {
    let name = request.name.clone();
    let body = request.body.clone();
    let scheduled_at = request.scheduled_at;
    let recipients = request.recipients.clone();

    store
        .with_transaction(TRANSACTION_DEADLINE, move |tx| {
            Box::pin(async move {
                let campaign_id = store.insert_campaign(tx, &name, &body, scheduled_at).await?;
                let mut collected = Vec::with_capacity(recipients.len());
                for address in recipients {
                    let recipient_id =
                        store.insert_recipient(tx, campaign_id, &address).await?;
                    store.insert_message_pending(tx, campaign_id, recipient_id).await?;
                    collected.push((recipient_id, address));
                }
                Ok((campaign_id, collected))
            })
        })
        .await
        .map_err(AdmissionError::from)
}
