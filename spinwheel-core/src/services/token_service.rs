// File: src/services/token_service.rs

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use spinwheel_common::error::Error;
use spinwheel_common::models::redemption::{IdentitySummary, Redemption, RedemptionStats};
use spinwheel_common::models::token::{
    OrderToken, TokenStats, normalize_token_id, validate_token_id,
};
use spinwheel_common::traits::repository_traits::{RedemptionRepository, TokenRepository};

/// Administrative surface over the token table and the ledger: issuance,
/// aggregate projections, and the destructive reset.
pub struct TokenService {
    tokens: Arc<dyn TokenRepository>,
    ledger: Arc<dyn RedemptionRepository>,
}

impl TokenService {
    pub fn new(tokens: Arc<dyn TokenRepository>, ledger: Arc<dyn RedemptionRepository>) -> Self {
        Self { tokens, ledger }
    }

    /// Issue a new token. Input is normalized to uppercase before the format
    /// check; the unique key is the final authority on duplicates.
    pub async fn create_token(&self, raw_token: &str) -> Result<OrderToken, Error> {
        let token_id = normalize_token_id(raw_token);
        validate_token_id(&token_id)?;

        if self.tokens.get_token(&token_id).await?.is_some() {
            return Err(Error::TokenExists);
        }

        let token = OrderToken::new(token_id, Utc::now());
        self.tokens.create_token(&token).await?;
        info!(token_id = %token.token_id, "order token issued");
        Ok(token)
    }

    pub async fn token_stats(&self) -> Result<TokenStats, Error> {
        self.tokens.token_stats().await
    }

    pub async fn redemption_stats(&self) -> Result<RedemptionStats, Error> {
        self.ledger.stats().await
    }

    pub async fn identity_summaries(&self, limit: i64) -> Result<Vec<IdentitySummary>, Error> {
        self.ledger.identity_summaries(limit).await
    }

    pub async fn recent_tokens(&self, limit: i64) -> Result<Vec<OrderToken>, Error> {
        self.tokens.list_recent(limit).await
    }

    pub async fn recent_redemptions(&self, limit: i64) -> Result<Vec<Redemption>, Error> {
        self.ledger.list_recent(limit).await
    }

    /// Irreversible wipe of both relations, intended for test/reset
    /// environments.
    pub async fn clear_all(&self) -> Result<(), Error> {
        warn!("clearing all order tokens and redemption records");
        self.ledger.clear().await?;
        self.tokens.clear().await?;
        Ok(())
    }
}
