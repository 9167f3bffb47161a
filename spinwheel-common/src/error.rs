// ================================================================
// File: spinwheel-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed user input: bad token format, bad payout reference, etc.
    /// The message is user-facing.
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid order token. This code does not exist in our system.")]
    InvalidToken,

    #[error("This order token has already been used.")]
    AlreadyUsed,

    #[error("This order token already exists.")]
    TokenExists,

    #[error("No redemption found for this user.")]
    NoRedemptionFound,

    #[error("A payout reference has already been submitted for this redemption.")]
    AlreadyAttached,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}

impl From<uuid::Error> for Error {
    fn from(err: uuid::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

impl From<chrono::format::ParseError> for Error {
    fn from(err: chrono::format::ParseError) -> Self {
        Error::Parse(err.to_string())
    }
}
