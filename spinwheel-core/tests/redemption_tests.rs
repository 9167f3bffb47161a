// tests/redemption_tests.rs

use futures_util::future::join_all;
use uuid::Uuid;

use spinwheel_common::Error;
use spinwheel_common::models::reward::{RewardDistribution, RewardTier};
use spinwheel_core::test_utils::{SqliteHarness, build_services, create_file_pool, create_memory_pool};

async fn harness() -> SqliteHarness {
    let pool = create_memory_pool().await.expect("memory pool");
    build_services(&pool, RewardDistribution::default()).expect("services")
}

#[tokio::test]
async fn redeeming_unknown_token_fails_invalid_token() {
    let h = harness().await;
    let err = h
        .redemption
        .redeem(Uuid::new_v4(), "NO-SUCH-CODE", None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidToken));
}

#[tokio::test]
async fn empty_token_is_an_input_error() {
    let h = harness().await;
    let err = h.redemption.redeem(Uuid::new_v4(), "   ", None).await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));
}

#[tokio::test]
async fn token_redeems_exactly_once() {
    let h = harness().await;
    let identity = Uuid::new_v4();

    h.tokens.create_token("spin-0001").await.unwrap();

    // Lowercase input reaches the same canonical token.
    let record = h
        .redemption
        .redeem(identity, "spin-0001", Some("10.1.2.3"))
        .await
        .unwrap();
    assert!(matches!(record.reward_amount, 1 | 5 | 10));
    assert_eq!(record.token_id.as_deref(), Some("SPIN-0001"));
    assert_eq!(record.identity, identity);
    assert_eq!(record.source_ip.as_deref(), Some("10.1.2.3"));

    // Replays fail indefinitely, for any identity.
    for _ in 0..3 {
        let err = h
            .redemption
            .redeem(Uuid::new_v4(), "SPIN-0001", None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyUsed));
    }

    let stats = h.tokens.token_stats().await.unwrap();
    assert_eq!(stats.issued, 1);
    assert_eq!(stats.used, 1);
    assert_eq!(stats.available, 0);
}

#[tokio::test]
async fn validate_token_never_mutates() {
    let h = harness().await;
    h.tokens.create_token("CHECK-ME-01").await.unwrap();

    for _ in 0..3 {
        let v = h.redemption.validate_token("check-me-01").await.unwrap();
        assert!(v.valid);
    }

    // Still redeemable after repeated validation.
    h.redemption
        .redeem(Uuid::new_v4(), "CHECK-ME-01", None)
        .await
        .unwrap();

    let v = h.redemption.validate_token("CHECK-ME-01").await.unwrap();
    assert!(!v.valid);
    assert_eq!(
        v.reason.as_deref(),
        Some("This order token has already been used.")
    );

    let unknown = h.redemption.validate_token("WHO-DIS-99").await.unwrap();
    assert!(!unknown.valid);
    assert_eq!(
        unknown.reason.as_deref(),
        Some("Invalid order token. Please check and try again.")
    );
}

#[tokio::test]
async fn concurrent_redeems_have_a_single_winner() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_file_pool(&dir.path().join("spins.db")).await.unwrap();
    let h = build_services(&pool, RewardDistribution::default()).unwrap();

    h.tokens.create_token("RACE-TOKEN-01").await.unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let svc = h.redemption.clone();
            tokio::spawn(async move { svc.redeem(Uuid::new_v4(), "RACE-TOKEN-01", None).await })
        })
        .collect();

    let mut winners = 0;
    let mut losers = 0;
    for joined in join_all(tasks).await {
        match joined.unwrap() {
            Ok(_) => winners += 1,
            Err(Error::AlreadyUsed) => losers += 1,
            Err(e) => panic!("unexpected error under contention: {e}"),
        }
    }
    assert_eq!(winners, 1, "exactly one concurrent redeem may win");
    assert_eq!(losers, 7);

    let stats = h.tokens.redemption_stats().await.unwrap();
    assert_eq!(stats.total_redemptions, 1);
}

#[tokio::test]
async fn payout_reference_attaches_exactly_once() {
    let h = harness().await;
    let identity = Uuid::new_v4();

    let err = h.redemption.attach_payout(identity, "ab@cd").await.unwrap_err();
    assert!(matches!(err, Error::NoRedemptionFound));

    h.tokens.create_token("PAYME-001").await.unwrap();
    h.redemption.redeem(identity, "PAYME-001", None).await.unwrap();

    let err = h.redemption.attach_payout(identity, "abc").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    h.redemption.attach_payout(identity, "ab@cd").await.unwrap();
    let latest = h.redemption.latest_redemption(identity).await.unwrap().unwrap();
    assert_eq!(latest.payout_reference.as_deref(), Some("ab@cd"));

    let err = h
        .redemption
        .attach_payout(identity, "other@provider")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyAttached));
}

#[tokio::test]
async fn payout_targets_the_most_recent_redemption() {
    let h = harness().await;
    let identity = Uuid::new_v4();

    h.tokens.create_token("FIRST-SPIN-1").await.unwrap();
    h.tokens.create_token("SECOND-SPIN-2").await.unwrap();
    h.redemption.redeem(identity, "FIRST-SPIN-1", None).await.unwrap();
    h.redemption.redeem(identity, "SECOND-SPIN-2", None).await.unwrap();

    h.redemption.attach_payout(identity, "late.spender@bank").await.unwrap();

    for r in h.tokens.recent_redemptions(10).await.unwrap() {
        match r.token_id.as_deref() {
            Some("SECOND-SPIN-2") => {
                assert_eq!(r.payout_reference.as_deref(), Some("late.spender@bank"))
            }
            Some("FIRST-SPIN-1") => assert!(r.payout_reference.is_none()),
            other => panic!("unexpected token in ledger: {other:?}"),
        }
    }
}

#[tokio::test]
async fn latest_redemption_reports_check_status() {
    let h = harness().await;
    let identity = Uuid::new_v4();

    assert!(h.redemption.latest_redemption(identity).await.unwrap().is_none());

    h.tokens.create_token("STATUS-01").await.unwrap();
    let record = h.redemption.redeem(identity, "STATUS-01", None).await.unwrap();

    let latest = h.redemption.latest_redemption(identity).await.unwrap().unwrap();
    assert_eq!(latest.redemption_id, record.redemption_id);
    assert_eq!(latest.reward_amount, record.reward_amount);
}

#[tokio::test]
async fn clear_all_wipes_both_relations() {
    let h = harness().await;
    let identity = Uuid::new_v4();

    h.tokens.create_token("WIPE-ME-01").await.unwrap();
    h.tokens.create_token("WIPE-ME-02").await.unwrap();
    h.redemption.redeem(identity, "WIPE-ME-01", None).await.unwrap();

    h.tokens.clear_all().await.unwrap();

    let t = h.tokens.token_stats().await.unwrap();
    assert_eq!(t.issued, 0);
    let r = h.tokens.redemption_stats().await.unwrap();
    assert_eq!(r.total_redemptions, 0);

    // Previously issued tokens are gone entirely.
    let v = h.redemption.validate_token("WIPE-ME-02").await.unwrap();
    assert!(!v.valid);
}

#[tokio::test]
async fn single_tier_distribution_pays_that_tier() {
    let pool = create_memory_pool().await.unwrap();
    let dist = RewardDistribution::new(vec![
        RewardTier { amount: 30, weight: 3 },
        RewardTier { amount: 100, weight: 0 },
    ]);
    let h = build_services(&pool, dist).unwrap();

    h.tokens.create_token("JACKPOT-1").await.unwrap();
    let record = h
        .redemption
        .redeem(Uuid::new_v4(), "JACKPOT-1", None)
        .await
        .unwrap();
    assert_eq!(record.reward_amount, 30);
}
