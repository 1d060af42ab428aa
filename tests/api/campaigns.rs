use std::pin::Pin;
use std::time::Duration;

use campaign_pipeline::store::Store;
use futures_util::StreamExt;
use serde_json::json;

use crate::helpers::spawn_app;
use crate::helpers::CreateCampaignResponse;

fn sample_request(recipients: Vec<&str>) -> serde_json::Value {
    json!({
        "name": "Smoke",
        "body": "Hello",
        "scheduled_at": "2025-10-02T12:00:00Z",
        "recipients": recipients,
    })
}

/// S1 in spec.md §8: happy admission persists two recipients and two
/// `pending` messages, and publishes two jobs in request order.
#[tokio::test]
async fn create_campaign_persists_state_and_publishes_jobs_in_order() {
    let app = spawn_app().await;

    let resp = app.post_campaign(&sample_request(vec!["a@x", "b@x"])).await;
    assert_eq!(resp.status().as_u16(), 200);
    let created: CreateCampaignResponse = resp.json().await.unwrap();

    let recipients = sqlx::query!(
        "SELECT id, address FROM recipients WHERE campaign_id = $1 ORDER BY id",
        created.id,
    )
    .fetch_all(&app.pool)
    .await
    .unwrap();
    assert_eq!(recipients.len(), 2);
    assert_eq!(recipients[0].address, "a@x");
    assert_eq!(recipients[1].address, "b@x");

    for recipient in &recipients {
        assert_eq!(app.message_status(created.id, recipient.id).await, "pending");
    }

    let consumer = app.queue.consumer();
    let deliveries = consumer.consume().await.unwrap();
    let mut deliveries: Pin<Box<_>> = Box::pin(deliveries);

    for expected_address in ["a@x", "b@x"] {
        let delivery = tokio::time::timeout(Duration::from_secs(5), deliveries.next())
            .await
            .expect("job must arrive within 5s")
            .expect("delivery stream must not close")
            .expect("delivery must not carry a protocol error");

        let job: serde_json::Value = serde_json::from_slice(delivery.body()).unwrap();
        assert_eq!(job["campaign_id"], created.id);
        assert_eq!(job["address"], expected_address);
        assert_eq!(delivery.headers.retries, 0);

        delivery.ack().await.unwrap();
    }
}

/// S2 in spec.md §8: malformed input is rejected before any side effect.
#[tokio::test]
async fn create_campaign_rejects_malformed_request() {
    let app = spawn_app().await;

    let resp = app.post_campaign(&json!({})).await;
    assert_eq!(resp.status().as_u16(), 400);

    let campaign_count = sqlx::query!(r#"SELECT COUNT(*) AS "count!" FROM campaigns"#)
        .fetch_one(&app.pool)
        .await
        .unwrap()
        .count;
    assert_eq!(campaign_count, 0);
}

#[tokio::test]
async fn create_campaign_rejects_a_blank_recipient() {
    let app = spawn_app().await;

    let resp = app.post_campaign(&sample_request(vec!["a@x", ""])).await;

    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn create_campaign_rejects_an_empty_recipient_list() {
    let app = spawn_app().await;

    let resp = app.post_campaign(&sample_request(vec![])).await;

    assert_eq!(resp.status().as_u16(), 400);
}

/// Property 8 in spec.md §8: `list_campaigns` orders newest-first by id and
/// the stats sequence is index-aligned with the campaigns sequence; property
/// 2: `total = pending + sent + failed` at every observation.
#[tokio::test]
async fn list_campaigns_is_newest_first_with_aligned_stats() {
    let app = spawn_app().await;

    let mut ids = Vec::new();
    for i in 0..3 {
        let resp = app.post_campaign(&sample_request(vec![&format!("r{i}@x")])).await;
        let created: CreateCampaignResponse = resp.json().await.unwrap();
        ids.push(created.id);
    }

    let resp = app.list_campaigns("?limit=10&offset=0").await;
    assert!(resp.status().is_success());
    let rows: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(rows.len(), 3);

    let listed_ids: Vec<i64> = rows.iter().map(|row| row["id"].as_i64().unwrap()).collect();
    let mut expected_ids = ids;
    expected_ids.reverse();
    assert_eq!(listed_ids, expected_ids);

    for row in &rows {
        let stats = &row["stats"];
        let total = stats["total"].as_i64().unwrap();
        let pending = stats["pending"].as_i64().unwrap();
        let sent = stats["sent"].as_i64().unwrap();
        let failed = stats["failed"].as_i64().unwrap();
        assert_eq!(total, pending + sent + failed);
        assert_eq!(total, 1);
    }
}

#[tokio::test]
async fn list_campaigns_clamps_limit_to_the_documented_range() {
    let app = spawn_app().await;
    app.post_campaign(&sample_request(vec!["a@x"])).await;

    let resp = app.list_campaigns("?limit=0").await;
    assert!(resp.status().is_success());
    let rows: Vec<serde_json::Value> = resp.json().await.unwrap();
    // limit=0 clamps up to 1, never down to "return nothing"
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn get_campaign_returns_404_for_unknown_id() {
    let app = spawn_app().await;

    let resp = app.get_campaign(i64::MAX).await;

    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn get_campaign_returns_400_for_non_positive_id() {
    let app = spawn_app().await;

    let resp = app.get_campaign(0).await;

    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn get_campaign_returns_full_detail_with_stats() {
    let app = spawn_app().await;
    let resp = app.post_campaign(&sample_request(vec!["a@x"])).await;
    let created: CreateCampaignResponse = resp.json().await.unwrap();

    let resp = app.get_campaign(created.id).await;

    assert!(resp.status().is_success());
    let detail: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(detail["id"], created.id);
    assert_eq!(detail["name"], "Smoke");
    assert_eq!(detail["body"], "Hello");
    assert_eq!(detail["status"], "queued");
    assert_eq!(detail["stats"]["total"], 1);
    assert_eq!(detail["stats"]["pending"], 1);
}

/// Properties 3 and 4 in spec.md §8, and the allowed transition table in
/// spec.md §3: `pending -> failed -> sent` leaves `sent_at` non-null and
/// `last_error` null, with no trace of the earlier failure.
#[tokio::test]
async fn message_status_transitions_uphold_the_sent_and_failed_invariants() {
    let app = spawn_app().await;
    let resp = app.post_campaign(&sample_request(vec!["a@x", "b@x"])).await;
    let created: CreateCampaignResponse = resp.json().await.unwrap();

    let recipients = sqlx::query!(
        "SELECT id FROM recipients WHERE campaign_id = $1 ORDER BY id",
        created.id,
    )
    .fetch_all(&app.pool)
    .await
    .unwrap();
    let (sent_recipient, failed_recipient) = (recipients[0].id, recipients[1].id);

    let store = Store::new(app.pool.clone());

    store.mark_message_sent(&app.pool, created.id, sent_recipient).await.unwrap();
    let row = sqlx::query!(
        "SELECT status, sent_at, last_error FROM messages WHERE campaign_id = $1 AND recipient_id = $2",
        created.id,
        sent_recipient,
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(row.status, "sent");
    assert!(row.sent_at.is_some());
    assert!(row.last_error.is_none());

    store
        .mark_message_failed(&app.pool, created.id, failed_recipient, "temporary send error")
        .await
        .unwrap();
    let row = sqlx::query!(
        "SELECT status, last_error FROM messages WHERE campaign_id = $1 AND recipient_id = $2",
        created.id,
        failed_recipient,
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(row.status, "failed");
    assert_eq!(row.last_error.as_deref(), Some("temporary send error"));

    // a retry succeeds: failed -> sent clears last_error and sets sent_at
    store.mark_message_sent(&app.pool, created.id, failed_recipient).await.unwrap();
    let row = sqlx::query!(
        "SELECT status, sent_at, last_error FROM messages WHERE campaign_id = $1 AND recipient_id = $2",
        created.id,
        failed_recipient,
    )
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(row.status, "sent");
    assert!(row.sent_at.is_some());
    assert!(row.last_error.is_none());

    let stats = store.get_campaign_stats(created.id).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.sent, 2);
    assert_eq!(stats.pending + stats.failed, 0);
}
