// File: spinwheel-common/src/models/mod.rs
pub mod redemption;
pub mod reward;
pub mod token;

pub use redemption::{ConsumeOutcome, IdentitySummary, Redemption, RedemptionStats};
pub use reward::{RewardDistribution, RewardTier};
pub use token::{OrderToken, TokenState, TokenStats, TokenValidation};
