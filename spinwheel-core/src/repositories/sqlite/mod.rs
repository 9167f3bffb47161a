// src/repositories/sqlite/mod.rs

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use spinwheel_common::error::Error;

pub mod redemptions;
pub mod store;
pub mod tokens;

pub use redemptions::SqliteRedemptionRepository;
pub use store::SqliteRedemptionStore;
pub use tokens::SqliteTokenRepository;

/// Open (and create if missing) a SQLite database. WAL plus a busy timeout
/// lets concurrent writers on the pool serialize instead of erroring.
pub async fn connect(database_url: &str) -> Result<Pool<Sqlite>, Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Single-connection in-memory database, mainly for tests. One connection
/// because every `:memory:` connection is its own database.
pub async fn connect_in_memory() -> Result<Pool<Sqlite>, Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// Create the two relations. Timestamps are epoch seconds, ids are TEXT.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS order_tokens (
            token_id TEXT PRIMARY KEY,
            redeemed_by TEXT,
            created_at INTEGER NOT NULL,
            used_at INTEGER,
            is_used INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS redemptions (
            redemption_id TEXT PRIMARY KEY,
            identity TEXT NOT NULL,
            reward_amount INTEGER NOT NULL,
            redeemed_at INTEGER NOT NULL,
            source_ip TEXT,
            token_id TEXT,
            payout_reference TEXT
        )
        "#,
    )
        .execute(pool)
        .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_redemptions_identity_time
        ON redemptions (identity, redeemed_at DESC)
        "#,
    )
        .execute(pool)
        .await?;

    Ok(())
}
