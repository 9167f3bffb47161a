// File: spinwheel-core/src/repositories/postgres/tokens.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use spinwheel_common::error::Error;
use spinwheel_common::models::token::{OrderToken, TokenStats};
use spinwheel_common::traits::repository_traits::TokenRepository;

#[derive(Clone)]
pub struct PostgresTokenRepository {
    pool: Pool<Postgres>,
}

impl PostgresTokenRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn token_from_row(r: &sqlx::postgres::PgRow) -> Result<OrderToken, Error> {
    let is_used: bool = r.try_get("is_used")?;
    Ok(OrderToken {
        token_id: r.try_get("token_id")?,
        state: is_used.into(),
        created_at: r.try_get("created_at")?,
        used_at: r.try_get("used_at")?,
        redeemed_by: r.try_get("redeemed_by")?,
    })
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    async fn create_token(&self, token: &OrderToken) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO order_tokens (token_id, redeemed_by, created_at, used_at, is_used)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
            .bind(&token.token_id)
            .bind(token.redeemed_by)
            .bind(token.created_at)
            .bind(token.used_at)
            .bind(token.is_used())
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(Error::TokenExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_token(&self, token_id: &str) -> Result<Option<OrderToken>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT token_id, redeemed_by, created_at, used_at, is_used
            FROM order_tokens
            WHERE token_id = $1
            "#,
        )
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await?;

        match row_opt {
            Some(r) => Ok(Some(token_from_row(&r)?)),
            None => Ok(None),
        }
    }

    async fn token_stats(&self) -> Result<TokenStats, Error> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS issued,
                COUNT(*) FILTER (WHERE is_used) AS used
            FROM order_tokens
            "#,
        )
            .fetch_one(&self.pool)
            .await?;

        let issued: i64 = row.try_get("issued")?;
        let used: i64 = row.try_get("used")?;
        Ok(TokenStats { issued, used, available: issued - used })
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<OrderToken>, Error> {
        let rows = sqlx::query(
            r#"
            SELECT token_id, redeemed_by, created_at, used_at, is_used
            FROM order_tokens
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        let mut list = Vec::new();
        for r in rows {
            list.push(token_from_row(&r)?);
        }
        Ok(list)
    }

    async fn clear(&self) -> Result<(), Error> {
        sqlx::query("DELETE FROM order_tokens")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
