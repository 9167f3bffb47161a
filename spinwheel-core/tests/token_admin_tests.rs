// tests/token_admin_tests.rs

use uuid::Uuid;

use spinwheel_common::Error;
use spinwheel_common::models::reward::{RewardDistribution, RewardTier};
use spinwheel_common::models::token::TokenState;
use spinwheel_core::test_utils::{SqliteHarness, build_services, create_memory_pool};

async fn harness_with_fixed_reward() -> SqliteHarness {
    let pool = create_memory_pool().await.expect("memory pool");
    let dist = RewardDistribution::new(vec![RewardTier { amount: 5, weight: 1 }]);
    build_services(&pool, dist).expect("services")
}

#[tokio::test]
async fn create_token_enforces_format() {
    let h = harness_with_fixed_reward().await;

    let too_long = "X".repeat(21);
    for bad in ["AB", "", "A B C", "TOO!BAD", too_long.as_str()] {
        let err = h.tokens.create_token(bad).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)), "{bad:?} should be rejected");
    }

    let token = h.tokens.create_token("valid-code_01").await.unwrap();
    assert_eq!(token.token_id, "VALID-CODE_01");
    assert_eq!(token.state, TokenState::Unused);
}

#[tokio::test]
async fn duplicate_token_ids_are_rejected_case_insensitively() {
    let h = harness_with_fixed_reward().await;

    h.tokens.create_token("VALID-CODE_01").await.unwrap();
    let err = h.tokens.create_token("valid-code_01").await.unwrap_err();
    assert!(matches!(err, Error::TokenExists));
}

#[tokio::test]
async fn recent_tokens_reflect_issuance_and_usage() {
    let h = harness_with_fixed_reward().await;

    h.tokens.create_token("ORDER-0001").await.unwrap();
    h.tokens.create_token("ORDER-0002").await.unwrap();
    let identity = Uuid::new_v4();
    h.redemption.redeem(identity, "ORDER-0001", None).await.unwrap();

    let listed = h.tokens.recent_tokens(10).await.unwrap();
    assert_eq!(listed.len(), 2);

    let used = listed.iter().find(|t| t.token_id == "ORDER-0001").unwrap();
    assert!(used.is_used());
    assert_eq!(used.redeemed_by, Some(identity));
    assert!(used.used_at.is_some());

    let unused = listed.iter().find(|t| t.token_id == "ORDER-0002").unwrap();
    assert!(!unused.is_used());
    assert!(unused.used_at.is_none());
}

#[tokio::test]
async fn aggregate_stats_project_the_ledger() {
    let h = harness_with_fixed_reward().await;

    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    for code in ["STAT-0001", "STAT-0002", "STAT-0003"] {
        h.tokens.create_token(code).await.unwrap();
    }
    h.redemption.redeem(alice, "STAT-0001", None).await.unwrap();
    h.redemption.redeem(alice, "STAT-0002", None).await.unwrap();
    h.redemption.redeem(bob, "STAT-0003", None).await.unwrap();
    h.redemption.attach_payout(bob, "bob@bank").await.unwrap();

    let stats = h.tokens.redemption_stats().await.unwrap();
    assert_eq!(stats.total_redemptions, 3);
    assert_eq!(stats.distinct_identities, 2);
    assert_eq!(stats.total_reward_amount, 15);
    assert_eq!(stats.payout_attached, 1);

    let token_stats = h.tokens.token_stats().await.unwrap();
    assert_eq!(token_stats.issued, 3);
    assert_eq!(token_stats.used, 3);
    assert_eq!(token_stats.available, 0);

    let summaries = h.tokens.identity_summaries(10).await.unwrap();
    assert_eq!(summaries.len(), 2);
    let alice_row = summaries.iter().find(|s| s.identity == alice).unwrap();
    assert_eq!(alice_row.redemption_count, 2);
    assert_eq!(alice_row.total_reward_amount, 10);
    assert!(alice_row.payout_references.is_none());
    let bob_row = summaries.iter().find(|s| s.identity == bob).unwrap();
    assert_eq!(bob_row.redemption_count, 1);
    assert_eq!(bob_row.payout_references.as_deref(), Some("bob@bank"));

    let recent = h.tokens.recent_redemptions(2).await.unwrap();
    assert_eq!(recent.len(), 2);
}
