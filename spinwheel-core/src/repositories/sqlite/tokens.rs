// src/repositories/sqlite/tokens.rs

use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use uuid::Uuid;

use spinwheel_common::error::Error;
use spinwheel_common::models::token::{OrderToken, TokenStats};
use spinwheel_common::traits::repository_traits::TokenRepository;

use crate::utils::time::{from_epoch, to_epoch};

#[derive(Clone)]
pub struct SqliteTokenRepository {
    pub pool: Pool<Sqlite>,
}

impl SqliteTokenRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

pub(crate) fn token_from_row(r: &sqlx::sqlite::SqliteRow) -> Result<OrderToken, Error> {
    let is_used: bool = r.try_get("is_used")?;
    let redeemed_by: Option<String> = r.try_get("redeemed_by")?;
    let redeemed_by = match redeemed_by {
        Some(s) => Some(Uuid::parse_str(&s)?),
        None => None,
    };
    let used_at: Option<i64> = r.try_get("used_at")?;
    Ok(OrderToken {
        token_id: r.try_get("token_id")?,
        state: is_used.into(),
        created_at: from_epoch(r.try_get::<i64, _>("created_at")?),
        used_at: used_at.map(from_epoch),
        redeemed_by,
    })
}

#[async_trait]
impl TokenRepository for SqliteTokenRepository {
    async fn create_token(&self, token: &OrderToken) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO order_tokens (token_id, redeemed_by, created_at, used_at, is_used)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
            .bind(&token.token_id)
            .bind(token.redeemed_by.map(|u| u.to_string()))
            .bind(to_epoch(token.created_at))
            .bind(token.used_at.map(to_epoch))
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
        let row = sqlx::query(
            r#"
            SELECT token_id, redeemed_by, created_at, used_at, is_used
            FROM order_tokens
            WHERE token_id = ?
            "#,
        )
            .bind(token_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(token_from_row(&r)?)),
            None => Ok(None),
        }
    }

    async fn token_stats(&self) -> Result<TokenStats, Error> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS issued,
                COALESCE(SUM(CASE WHEN is_used = 1 THEN 1 ELSE 0 END), 0) AS used
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
            LIMIT ?
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
