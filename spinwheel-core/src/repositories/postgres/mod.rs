// src/repositories/postgres/mod.rs

pub mod redemptions;
pub mod store;
pub mod tokens;

pub use redemptions::PostgresRedemptionRepository;
pub use store::PostgresRedemptionStore;
pub use tokens::PostgresTokenRepository;
