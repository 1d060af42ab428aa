mod error;
mod models;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::DateTime;
use chrono::Utc;
use sqlx::PgExecutor;
use sqlx::PgPool;
use sqlx::Postgres;
use sqlx::Transaction;

pub use error::StoreError;
pub use models::Campaign;
pub use models::CampaignStats;

/// Transactional façade over the campaign/recipient/message tables, mirroring
/// `internal/store.Store` in the Go original: narrow operations, no business
/// logic. Admission and Worker depend only on what's exposed here.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

type PgTx<'a> = Transaction<'a, Postgres>;

impl Store {
    pub fn new(pool: PgPool) -> Self { Self { pool } }

    /// Exposes the pool for callers (the worker) that need a `PgExecutor`
    /// but have no open transaction of their own.
    pub fn pool(&self) -> &PgPool { &self.pool }

    /// Opens a transaction, runs `f`, commits on success, rolls back on any
    /// `Err` or on a panic inside `f` (a dropped, uncommitted
    /// `sqlx::Transaction` rolls back on its own — no manual unwind handling
    /// needed). Bounded by `deadline`.
    pub async fn with_transaction<F, T>(
        &self,
        deadline: Duration,
        f: F,
    ) -> Result<T, StoreError>
    where
        F: for<'a> FnOnce(&'a mut PgTx<'_>) -> Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>
            + Send,
        T: Send,
    {
        tokio::time::timeout(deadline, async {
            let mut tx = self.pool.begin().await?;
            let result = f(&mut tx).await;
            match result {
                Ok(value) => {
                    tx.commit().await?;
                    Ok(value)
                }
                Err(e) => {
                    // explicit for clarity; dropping `tx` here would roll back anyway
                    tx.rollback().await.ok();
                    Err(e)
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    #[tracing::instrument(skip_all)]
    pub async fn insert_campaign(
        &self,
        tx: &mut PgTx<'_>,
        name: &str,
        body: &str,
        scheduled_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query!(
            r#"
            INSERT INTO campaigns (name, body, scheduled_at, status)
            VALUES ($1, $2, $3, 'queued')
            RETURNING id
            "#,
            name,
            body,
            scheduled_at,
        )
        .fetch_one(&mut **tx)
        .await?;
        Ok(row.id)
    }

    #[tracing::instrument(skip_all)]
    pub async fn insert_recipient(
        &self,
        tx: &mut PgTx<'_>,
        campaign_id: i64,
        address: &str,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query!(
            r#"
            INSERT INTO recipients (campaign_id, address)
            VALUES ($1, $2)
            RETURNING id
            "#,
            campaign_id,
            address,
        )
        .fetch_one(&mut **tx)
        .await?;
        Ok(row.id)
    }

    #[tracing::instrument(skip_all)]
    pub async fn insert_message_pending(
        &self,
        tx: &mut PgTx<'_>,
        campaign_id: i64,
        recipient_id: i64,
    ) -> Result<(), StoreError> {
        sqlx::query!(
            r#"
            INSERT INTO messages (campaign_id, recipient_id, status)
            VALUES ($1, $2, 'pending')
            "#,
            campaign_id,
            recipient_id,
        )
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_campaign(&self, id: i64) -> Result<Campaign, StoreError> {
        let row = sqlx::query_as!(
            Campaign,
            r#"
            SELECT id, name, scheduled_at, status, created_at
            FROM campaigns
            WHERE id = $1
            "#,
            id,
        )
        .fetch_optional(&self.pool)
        .await?;
        row.ok_or(StoreError::NotFound)
    }

    /// Generic over any `PgExecutor` so it can be called against the pool
    /// (worker, read routes) or an open transaction (admission, if it ever
    /// needs to read back a body it just inserted).
    #[tracing::instrument(skip(self, executor))]
    pub async fn get_campaign_body<'e, E>(
        &self,
        executor: E,
        id: i64,
    ) -> Result<String, StoreError>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query!("SELECT body FROM campaigns WHERE id = $1", id)
            .fetch_optional(executor)
            .await?;
        row.map(|r| r.body).ok_or(StoreError::NotFound)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_campaign_stats(&self, id: i64) -> Result<CampaignStats, StoreError> {
        let row = sqlx::query!(
            r#"
            SELECT
                COUNT(*) AS "total!",
                COUNT(*) FILTER (WHERE status = 'pending') AS "pending!",
                COUNT(*) FILTER (WHERE status = 'sent') AS "sent!",
                COUNT(*) FILTER (WHERE status = 'failed') AS "failed!"
            FROM messages
            WHERE campaign_id = $1
            "#,
            id,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(CampaignStats {
            total: row.total,
            pending: row.pending,
            sent: row.sent,
            failed: row.failed,
        })
    }

    /// Newest-first by id. `limit` clamped to `(0, 1000]` (default 20),
    /// `offset` clamped to `>= 0` (default 0). The returned stats are
    /// index-aligned with the returned campaigns.
    #[tracing::instrument(skip(self))]
    pub async fn list_campaigns(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<(Campaign, CampaignStats)>, StoreError> {
        let limit = limit.unwrap_or(20).clamp(1, 1000);
        let offset = offset.unwrap_or(0).max(0);

        let campaigns = sqlx::query_as!(
            Campaign,
            r#"
            SELECT id, name, scheduled_at, status, created_at
            FROM campaigns
            ORDER BY id DESC
            LIMIT $1 OFFSET $2
            "#,
            limit,
            offset,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(campaigns.len());
        for campaign in campaigns {
            let stats = self.get_campaign_stats(campaign.id).await?;
            out.push((campaign, stats));
        }
        Ok(out)
    }

    /// Unconditional overwrite: sets `sent`, `sent_at = now()`, clears
    /// `last_error`. Safe to apply more than once to the same row (see
    /// DESIGN.md on the status-update race).
    #[tracing::instrument(skip(self, executor))]
    pub async fn mark_message_sent<'e, E>(
        &self,
        executor: E,
        campaign_id: i64,
        recipient_id: i64,
    ) -> Result<(), StoreError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query!(
            r#"
            UPDATE messages
            SET status = 'sent', sent_at = now(), last_error = NULL
            WHERE campaign_id = $1 AND recipient_id = $2
            "#,
            campaign_id,
            recipient_id,
        )
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Unconditional overwrite: sets `failed`, `last_error`. Does not touch
    /// `sent_at`.
    #[tracing::instrument(skip(self, executor, error))]
    pub async fn mark_message_failed<'e, E>(
        &self,
        executor: E,
        campaign_id: i64,
        recipient_id: i64,
        error: &str,
    ) -> Result<(), StoreError>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query!(
            r#"
            UPDATE messages
            SET status = 'failed', last_error = $1
            WHERE campaign_id = $2 AND recipient_id = $3
            "#,
            error,
            campaign_id,
            recipient_id,
        )
        .execute(executor)
        .await?;
        Ok(())
    }
}
