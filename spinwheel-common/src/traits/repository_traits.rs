// File: spinwheel-common/src/traits/repository_traits.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Error;
use crate::models::redemption::{ConsumeOutcome, IdentitySummary, Redemption, RedemptionStats};
use crate::models::token::{OrderToken, TokenStats};

/// Durable table of issued order tokens. Implementations exist for Postgres
/// and SQLite; callers never special-case the backend.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Inserts a freshly issued token. Duplicate canonical ids fail with
    /// `Error::TokenExists` (the unique key is the authority, not any
    /// earlier lookup).
    async fn create_token(&self, token: &OrderToken) -> Result<(), Error>;

    /// Read-only lookup; never mutates state.
    async fn get_token(&self, token_id: &str) -> Result<Option<OrderToken>, Error>;

    async fn token_stats(&self) -> Result<TokenStats, Error>;

    async fn list_recent(&self, limit: i64) -> Result<Vec<OrderToken>, Error>;

    /// Destructive wipe of the whole table.
    async fn clear(&self) -> Result<(), Error>;
}

/// The redemption ledger: append-mostly audit rows, mutable only through the
/// one-time payout reference write.
#[async_trait]
pub trait RedemptionRepository: Send + Sync {
    async fn latest_for_identity(&self, identity: Uuid) -> Result<Option<Redemption>, Error>;

    /// Conditional one-time write: succeeds (returns `true`) only if the
    /// record does not already carry a non-empty payout reference.
    async fn attach_payout(
        &self,
        redemption_id: Uuid,
        payout_reference: &str,
    ) -> Result<bool, Error>;

    async fn stats(&self) -> Result<RedemptionStats, Error>;

    async fn identity_summaries(&self, limit: i64) -> Result<Vec<IdentitySummary>, Error>;

    async fn list_recent(&self, limit: i64) -> Result<Vec<Redemption>, Error>;

    /// Destructive wipe of the whole table.
    async fn clear(&self) -> Result<(), Error>;
}

/// The transactional boundary of the redemption engine: consume a token and
/// append its ledger row as one durable unit. The conditional update on the
/// token row is the serialization point under concurrency; if the
/// transaction cannot commit, the token stays unused.
#[async_trait]
pub trait RedemptionStore: Send + Sync {
    async fn consume_and_record(
        &self,
        token_id: &str,
        identity: Uuid,
        reward_amount: i32,
        source_ip: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ConsumeOutcome, Error>;
}
