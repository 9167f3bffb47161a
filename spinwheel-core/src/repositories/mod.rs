// src/repositories/mod.rs

pub mod postgres;
pub mod sqlite;

pub use spinwheel_common::traits::repository_traits::{
    RedemptionRepository, RedemptionStore, TokenRepository,
};

pub use postgres::redemptions::PostgresRedemptionRepository;
pub use postgres::store::PostgresRedemptionStore;
pub use postgres::tokens::PostgresTokenRepository;

pub use sqlite::redemptions::SqliteRedemptionRepository;
pub use sqlite::store::SqliteRedemptionStore;
pub use sqlite::tokens::SqliteTokenRepository;
