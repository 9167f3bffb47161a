// File: spinwheel-common/src/models/token.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Minimum / maximum length of a canonical token id.
pub const TOKEN_ID_MIN_LEN: usize = 4;
pub const TOKEN_ID_MAX_LEN: usize = 20;

/// A token moves from `Unused` to `Used` exactly once; there is no other
/// transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenState {
    Unused,
    Used,
}

impl From<bool> for TokenState {
    fn from(is_used: bool) -> Self {
        if is_used { TokenState::Used } else { TokenState::Unused }
    }
}

/// One issued redemption right, keyed by its canonical token id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderToken {
    pub token_id: String,
    pub state: TokenState,
    pub created_at: DateTime<Utc>,
    /// Present iff `state == Used`.
    pub used_at: Option<DateTime<Utc>>,
    /// Identity of the consumer, present iff `state == Used`.
    pub redeemed_by: Option<Uuid>,
}

impl OrderToken {
    /// A freshly issued, unused token. `token_id` must already be canonical.
    pub fn new(token_id: String, now: DateTime<Utc>) -> Self {
        Self {
            token_id,
            state: TokenState::Unused,
            created_at: now,
            used_at: None,
            redeemed_by: None,
        }
    }

    pub fn is_used(&self) -> bool {
        self.state == TokenState::Used
    }
}

/// Canonical form: surrounding whitespace stripped, uppercased.
pub fn normalize_token_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Format constraint for newly issued ids: 4-20 characters, letters,
/// digits, dash and underscore only. Expects canonical input.
pub fn validate_token_id(token_id: &str) -> Result<(), Error> {
    let len_ok = (TOKEN_ID_MIN_LEN..=TOKEN_ID_MAX_LEN).contains(&token_id.len());
    let chars_ok = token_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !len_ok || !chars_ok {
        return Err(Error::InvalidInput(
            "Order token must be 4-20 characters (letters, numbers, dash, underscore only)"
                .to_string(),
        ));
    }
    Ok(())
}

/// Result of the read-only pre-check exposed to the UI before a spin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenValidation {
    pub valid: bool,
    pub reason: Option<String>,
}

impl TokenValidation {
    pub fn valid() -> Self {
        Self { valid: true, reason: None }
    }

    pub fn invalid(reason: &str) -> Self {
        Self { valid: false, reason: Some(reason.to_string()) }
    }
}

/// Issuance / usage counts over the token table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenStats {
    pub issued: i64,
    pub used: i64,
    pub available: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_uppercases_and_trims() {
        assert_eq!(normalize_token_id("  valid-code_01 "), "VALID-CODE_01");
        assert_eq!(normalize_token_id(""), "");
    }

    #[test]
    fn validation_enforces_length_and_charset() {
        assert!(validate_token_id("AB").is_err());
        assert!(validate_token_id("VALID-CODE_01").is_ok());
        assert!(validate_token_id("ABCD").is_ok());
        assert!(validate_token_id(&"X".repeat(21)).is_err());
        assert!(validate_token_id("AB CD").is_err());
        assert!(validate_token_id("AB$D").is_err());
        assert!(validate_token_id("").is_err());
    }

    #[test]
    fn new_token_starts_unused() {
        let t = OrderToken::new("ABCD".to_string(), Utc::now());
        assert_eq!(t.state, TokenState::Unused);
        assert!(!t.is_used());
        assert!(t.used_at.is_none());
        assert!(t.redeemed_by.is_none());
    }
}
