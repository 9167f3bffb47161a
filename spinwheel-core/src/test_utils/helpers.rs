// File: spinwheel-core/src/test_utils/helpers.rs

use std::path::Path;
use std::sync::Arc;

use sqlx::{Pool, Sqlite};

use spinwheel_common::models::reward::RewardDistribution;

use crate::Error;
use crate::repositories::sqlite::{
    self, SqliteRedemptionRepository, SqliteRedemptionStore, SqliteTokenRepository,
};
use crate::services::{RedemptionService, RewardSelector, TokenService};

/// In-memory SQLite database with the schema applied, for serial tests.
pub async fn create_memory_pool() -> Result<Pool<Sqlite>, Error> {
    let pool = sqlite::connect_in_memory().await?;
    sqlite::run_migrations(&pool).await?;
    Ok(pool)
}

/// File-backed SQLite database with the schema applied. Use this for tests
/// that need several connections hitting the same database concurrently.
pub async fn create_file_pool(path: &Path) -> Result<Pool<Sqlite>, Error> {
    let url = format!("sqlite://{}", path.display());
    let pool = sqlite::connect(&url).await?;
    sqlite::run_migrations(&pool).await?;
    Ok(pool)
}

/// Fully wired SQLite-backed services for a test.
pub struct SqliteHarness {
    pub redemption: Arc<RedemptionService>,
    pub tokens: Arc<TokenService>,
    pub selector: Arc<RewardSelector>,
}

pub fn build_services(
    pool: &Pool<Sqlite>,
    distribution: RewardDistribution,
) -> Result<SqliteHarness, Error> {
    let token_repo = Arc::new(SqliteTokenRepository::new(pool.clone()));
    let ledger = Arc::new(SqliteRedemptionRepository::new(pool.clone()));
    let store = Arc::new(SqliteRedemptionStore::new(pool.clone()));
    let selector = Arc::new(RewardSelector::new(distribution)?);

    let redemption = Arc::new(RedemptionService::new(
        token_repo.clone(),
        ledger.clone(),
        store,
        selector.clone(),
    ));
    let tokens = Arc::new(TokenService::new(token_repo, ledger));

    Ok(SqliteHarness { redemption, tokens, selector })
}
