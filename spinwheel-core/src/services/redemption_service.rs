// File: src/services/redemption_service.rs

use std::sync::Arc;

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};
use uuid::Uuid;

use spinwheel_common::error::Error;
use spinwheel_common::models::redemption::{ConsumeOutcome, Redemption};
use spinwheel_common::models::token::{TokenValidation, normalize_token_id};
use spinwheel_common::traits::repository_traits::{
    RedemptionRepository, RedemptionStore, TokenRepository,
};

use crate::services::reward_selector::RewardSelector;

static PAYOUT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9.\-_]{2,256}@[a-zA-Z]{2,64}$").unwrap());

/// Structural check for a payout reference, with the specific guidance
/// messages checked first so the user learns what exactly is wrong.
pub fn validate_payout_reference(raw: &str) -> Result<String, Error> {
    let reference = raw.trim();
    if reference.is_empty() {
        return Err(Error::InvalidInput("A payout reference is required".to_string()));
    }
    if !reference.contains('@') {
        return Err(Error::InvalidInput(
            "Invalid payout reference. Must include @ symbol (e.g., yourname@provider)"
                .to_string(),
        ));
    }
    let mut parts = reference.splitn(2, '@');
    let local = parts.next().unwrap_or("").trim();
    let provider = parts.next().unwrap_or("").trim();
    if local.len() < 2 {
        return Err(Error::InvalidInput(
            "Invalid payout reference. Must be at least 2 characters before @".to_string(),
        ));
    }
    if provider.len() < 2 {
        return Err(Error::InvalidInput(
            "Invalid payout reference. Must include a provider name after @".to_string(),
        ));
    }
    if !PAYOUT_PATTERN.is_match(reference) {
        return Err(Error::InvalidInput(
            "Invalid payout reference format. Only letters, numbers, dots, hyphens and underscores are allowed"
                .to_string(),
        ));
    }
    Ok(reference.to_string())
}

/// The redemption engine: validates eligibility, delegates the atomic
/// consume-and-record step to the store, and exposes the payout reference
/// write. All mutation funnels through `RedemptionStore` and the ledger's
/// conditional update.
pub struct RedemptionService {
    tokens: Arc<dyn TokenRepository>,
    ledger: Arc<dyn RedemptionRepository>,
    store: Arc<dyn RedemptionStore>,
    selector: Arc<RewardSelector>,
}

impl RedemptionService {
    pub fn new(
        tokens: Arc<dyn TokenRepository>,
        ledger: Arc<dyn RedemptionRepository>,
        store: Arc<dyn RedemptionStore>,
        selector: Arc<RewardSelector>,
    ) -> Self {
        Self { tokens, ledger, store, selector }
    }

    /// Read-only pre-check for the UI. Never mutates token state.
    pub async fn validate_token(&self, raw_token: &str) -> Result<TokenValidation, Error> {
        let token_id = normalize_token_id(raw_token);
        if token_id.is_empty() {
            return Ok(TokenValidation::invalid("Please enter an order token"));
        }

        match self.tokens.get_token(&token_id).await? {
            None => Ok(TokenValidation::invalid(
                "Invalid order token. Please check and try again.",
            )),
            Some(t) if t.is_used() => {
                Ok(TokenValidation::invalid("This order token has already been used."))
            }
            Some(_) => Ok(TokenValidation::valid()),
        }
    }

    /// Consume a token and return the sampled reward. The token lookup is an
    /// optimization only; the store's conditional update is the authority,
    /// so a race lost after the lookup still fails as `AlreadyUsed`.
    pub async fn redeem(
        &self,
        identity: Uuid,
        raw_token: &str,
        source_ip: Option<&str>,
    ) -> Result<Redemption, Error> {
        let token_id = normalize_token_id(raw_token);
        if token_id.is_empty() {
            return Err(Error::InvalidInput(
                "An order token is required to spin".to_string(),
            ));
        }

        match self.tokens.get_token(&token_id).await? {
            None => return Err(Error::InvalidToken),
            Some(t) if t.is_used() => return Err(Error::AlreadyUsed),
            Some(_) => {}
        }

        let reward_amount = self.selector.sample()?;
        let now = Utc::now();

        match self
            .store
            .consume_and_record(&token_id, identity, reward_amount, source_ip, now)
            .await?
        {
            ConsumeOutcome::Committed(redemption) => {
                info!(
                    token_id = %token_id,
                    identity = %identity,
                    reward = reward_amount,
                    "token redeemed"
                );
                Ok(redemption)
            }
            ConsumeOutcome::AlreadyUsed => {
                debug!(token_id = %token_id, "lost consume race, token already used");
                Err(Error::AlreadyUsed)
            }
            ConsumeOutcome::NotFound => Err(Error::InvalidToken),
        }
    }

    /// One-time payout reference write against the identity's most recent
    /// redemption. The conditional update in the ledger is the authority for
    /// "at most once", mirroring the consume path.
    pub async fn attach_payout(&self, identity: Uuid, raw_reference: &str) -> Result<(), Error> {
        let reference = validate_payout_reference(raw_reference)?;

        let latest = self
            .ledger
            .latest_for_identity(identity)
            .await?
            .ok_or(Error::NoRedemptionFound)?;

        if latest
            .payout_reference
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty())
        {
            return Err(Error::AlreadyAttached);
        }

        if !self.ledger.attach_payout(latest.redemption_id, &reference).await? {
            return Err(Error::AlreadyAttached);
        }

        info!(identity = %identity, "payout reference attached");
        Ok(())
    }

    /// The identity's most recent redemption, if any (the check-status view).
    pub async fn latest_redemption(&self, identity: Uuid) -> Result<Option<Redemption>, Error> {
        self.ledger.latest_for_identity(identity).await
    }
}
