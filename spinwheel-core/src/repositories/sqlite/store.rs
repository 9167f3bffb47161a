// src/repositories/sqlite/store.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};
use uuid::Uuid;

use spinwheel_common::error::Error;
use spinwheel_common::models::redemption::{ConsumeOutcome, Redemption};
use spinwheel_common::traits::repository_traits::RedemptionStore;

use crate::utils::time::to_epoch;

/// SQLite implementation of the atomic consume-and-record transaction.
#[derive(Clone)]
pub struct SqliteRedemptionStore {
    pub pool: Pool<Sqlite>,
}

impl SqliteRedemptionStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RedemptionStore for SqliteRedemptionStore {
    async fn consume_and_record(
        &self,
        token_id: &str,
        identity: Uuid,
        reward_amount: i32,
        source_ip: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, Error> {
        let mut tx = self.pool.begin().await?;

        // Same serialization point as the Postgres store: the conditional
        // update decides the winner, not any earlier read.
        let updated = sqlx::query(
            r#"
            UPDATE order_tokens
            SET is_used = 1, used_at = ?, redeemed_by = ?
            WHERE token_id = ? AND is_used = 0
            "#,
        )
            .bind(to_epoch(now))
            .bind(identity.to_string())
            .bind(token_id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            let row = sqlx::query("SELECT is_used FROM order_tokens WHERE token_id = ?")
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
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
            .bind(redemption.redemption_id.to_string())
            .bind(redemption.identity.to_string())
            .bind(redemption.reward_amount)
            .bind(to_epoch(redemption.redeemed_at))
            .bind(&redemption.source_ip)
            .bind(&redemption.token_id)
            .bind(&redemption.payout_reference)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(ConsumeOutcome::Committed(redemption))
    }
}
