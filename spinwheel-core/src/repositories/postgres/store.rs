// File: spinwheel-core/src/repositories/postgres/store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use spinwheel_common::error::Error;
use spinwheel_common::models::redemption::{ConsumeOutcome, Redemption};
use spinwheel_common::traits::repository_traits::RedemptionStore;

/// Postgres implementation of the atomic consume-and-record transaction.
#[derive(Clone)]
pub struct PostgresRedemptionStore {
    pool: Pool<Postgres>,
}

impl PostgresRedemptionStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RedemptionStore for PostgresRedemptionStore {
    async fn consume_and_record(
        &self,
        token_id: &str,
        identity: Uuid,
        reward_amount: i32,
        source_ip: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, Error> {
        let mut tx = self.pool.begin().await?;

        // The conditional update is the serialization point: at most one
        // concurrent caller sees rows_affected == 1.
        let updated = sqlx::query(
            r#"
            UPDATE order_tokens
            SET is_used = TRUE, used_at = $2, redeemed_by = $3
            WHERE token_id = $1 AND is_used = FALSE
            "#,
        )
            .bind(token_id)
            .bind(now)
            .bind(identity)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            let row = sqlx::query("SELECT is_used FROM order_tokens WHERE token_id = $1")
                .bind(token_id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;
            return Ok(match row {
                Some(_) => ConsumeOutcome::AlreadyUsed,
                None => ConsumeOutcome::NotFound,
            });
        }

        let redemption = Redemption::new(identity, reward_amount, token_id, source_ip, now);
        sqlx::query(
            r#"
            INSERT INTO redemptions (
                redemption_id, identity, reward_amount, redeemed_at,
                source_ip, token_id, payout_reference
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
            .bind(redemption.redemption_id)
            .bind(redemption.identity)
            .bind(redemption.reward_amount)
            .bind(redemption.redeemed_at)
            .bind(&redemption.source_ip)
            .bind(&redemption.token_id)
            .bind(&redemption.payout_reference)
            .execute(&mut *tx)
            .await?;

        // If the commit fails, the token row reverts to unused and the
        // caller may safely retry the identical request.
        tx.commit().await?;
        Ok(ConsumeOutcome::Committed(redemption))
    }
}
