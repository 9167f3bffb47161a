// File: spinwheel-core/src/repositories/postgres/redemptions.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use spinwheel_common::error::Error;
use spinwheel_common::models::redemption::{IdentitySummary, Redemption, RedemptionStats};
use spinwheel_common::traits::repository_traits::RedemptionRepository;

#[derive(Clone)]
pub struct PostgresRedemptionRepository {
    pool: Pool<Postgres>,
}

impl PostgresRedemptionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn redemption_from_row(r: &sqlx::postgres::PgRow) -> Result<Redemption, Error> {
    Ok(Redemption {
        redemption_id: r.try_get("redemption_id")?,
        identity: r.try_get("identity")?,
        reward_amount: r.try_get("reward_amount")?,
        redeemed_at: r.try_get("redeemed_at")?,
        source_ip: r.try_get("source_ip")?,
        token_id: r.try_get("token_id")?,
        payout_reference: r.try_get("payout_reference")?,
    })
}

#[async_trait]
impl RedemptionRepository for PostgresRedemptionRepository {
    async fn latest_for_identity(&self, identity: Uuid) -> Result<Option<Redemption>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT redemption_id, identity, reward_amount, redeemed_at,
                   source_ip, token_id, payout_reference
            FROM redemptions
            WHERE identity = $1
            ORDER BY redeemed_at DESC
            LIMIT 1
            "#,
        )
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?;

        match row_opt {
            Some(r) => Ok(Some(redemption_from_row(&r)?)),
            None => Ok(None),
        }
    }

    async fn attach_payout(
        &self,
        redemption_id: Uuid,
        payout_reference: &str,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            UPDATE redemptions
            SET payout_reference = $2
            WHERE redemption_id = $1
              AND (payout_reference IS NULL OR payout_reference = '')
            "#,
        )
            .bind(redemption_id)
            .bind(payout_reference)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn stats(&self) -> Result<RedemptionStats, Error> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total_redemptions,
                COUNT(DISTINCT identity) AS distinct_identities,
                COALESCE(SUM(reward_amount), 0) AS total_reward_amount,
                COUNT(*) FILTER (
                    WHERE payout_reference IS NOT NULL AND payout_reference <> ''
                ) AS payout_attached
            FROM redemptions
            "#,
        )
            .fetch_one(&self.pool)
            .await?;

        Ok(RedemptionStats {
            total_redemptions: row.try_get("total_redemptions")?,
            distinct_identities: row.try_get("distinct_identities")?,
            total_reward_amount: row.try_get("total_reward_amount")?,
            payout_attached: row.try_get("payout_attached")?,
        })
    }

    async fn identity_summaries(&self, limit: i64) -> Result<Vec<IdentitySummary>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT identity,
                   COUNT(*) AS redemption_count,
                   COALESCE(SUM(reward_amount), 0) AS total_reward_amount,
                   MAX(redeemed_at) AS last_redeemed_at,
                   STRING_AGG(DISTINCT payout_reference, ',') AS payout_references
            FROM redemptions
            GROUP BY identity
            ORDER BY last_redeemed_at DESC
            LIMIT $1
            "#,
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(IdentitySummary {
                identity: r.try_get("identity")?,
                redemption_count: r.try_get("redemption_count")?,
                total_reward_amount: r.try_get("total_reward_amount")?,
                last_redeemed_at: r.try_get("last_redeemed_at")?,
                payout_references: r.try_get("payout_references")?,
            });
        }
        Ok(list)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Redemption>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT redemption_id, identity, reward_amount, redeemed_at,
                   source_ip, token_id, payout_reference
            FROM redemptions
            ORDER BY redeemed_at DESC
            LIMIT $1
            "#,
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(redemption_from_row(&r)?);
        }
        Ok(list)
    }

    async fn clear(&self) -> Result<(), Error> {
        sqlx::query("DELETE FROM redemptions")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
