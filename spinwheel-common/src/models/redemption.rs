// File: spinwheel-common/src/models/redemption.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One successful spin, as recorded in the ledger. Immutable except for the
/// one-time assignment of `payout_reference`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Redemption {
    pub redemption_id: Uuid,
    pub identity: Uuid,
    pub reward_amount: i32,
    pub redeemed_at: DateTime<Utc>,
    /// Best-effort network origin, advisory only.
    pub source_ip: Option<String>,
    /// Null only for legacy rows recorded before tokens became mandatory.
    pub token_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_reference: Option<String>,
}

impl Redemption {
    pub fn new(
        identity: Uuid,
        reward_amount: i32,
        token_id: &str,
        source_ip: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            redemption_id: Uuid::new_v4(),
            identity,
            reward_amount,
            redeemed_at: now,
            source_ip: source_ip.map(String::from),
            token_id: Some(token_id.to_string()),
            payout_reference: None,
        }
    }
}

/// Outcome of the atomic consume-and-record transaction. At most one
/// concurrent caller per token observes `Committed`.
#[derive(Debug, Clone)]
pub enum ConsumeOutcome {
    Committed(Redemption),
    AlreadyUsed,
    NotFound,
}

/// Aggregate projection over the ledger for the admin view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RedemptionStats {
    pub total_redemptions: i64,
    pub distinct_identities: i64,
    pub total_reward_amount: i64,
    pub payout_attached: i64,
}

/// Per-identity grouping of ledger rows, most recently active first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub identity: Uuid,
    pub redemption_count: i64,
    pub total_reward_amount: i64,
    pub last_redeemed_at: DateTime<Utc>,
    pub payout_references: Option<String>,
}
