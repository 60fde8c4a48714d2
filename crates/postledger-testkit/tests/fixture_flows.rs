//! Ledger flows driven through the shared fixtures.

use postledger::{ErrorKind, LedgerConfig, Notification};
use postledger_testkit::fixtures::FIXTURE_EPOCH;
use postledger_testkit::{random_actor, ManualClock, TestFixture};

#[tokio::test]
async fn fixture_clock_timestamps_posts_and_likes() {
    let fixture = TestFixture::new().await;
    let alice = fixture.actor("alice");
    let bob = random_actor();

    let id = fixture
        .ledger
        .create_post(&fixture.ctx(alice), "hello")
        .await
        .unwrap();
    fixture.clock.advance(1_000);
    let count = fixture
        .ledger
        .like_post(&fixture.ctx(bob), &alice, id)
        .await
        .unwrap();
    assert_eq!(count, 1);

    let events = fixture.ledger.events_since(0).await.unwrap();
    assert_eq!(events[0].recorded_at, FIXTURE_EPOCH);
    assert_eq!(events[1].recorded_at, FIXTURE_EPOCH + 1 + 1_000);
    assert_eq!(
        events[1].notification,
        Notification::PostLiked {
            liker: bob,
            author: alice,
            index: 0,
            like_count: 1,
        }
    );
    assert_eq!(fixture.clock.peek(), FIXTURE_EPOCH + 2 + 1_000);
}

#[tokio::test]
async fn fixture_admin_owns_the_bound() {
    let config = LedgerConfig {
        default_max_post_length: 8,
        ..LedgerConfig::default()
    };
    let fixture = TestFixture::with_config(config).await;
    let stranger = random_actor();

    let err = fixture
        .ledger
        .set_max_post_length(&fixture.ctx(stranger), 100)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    fixture
        .ledger
        .set_max_post_length(&fixture.admin_ctx(), 2)
        .await
        .unwrap();
    let err = fixture
        .ledger
        .create_post(&fixture.ctx(stranger), "abc")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(fixture.ledger.log_head().await.unwrap().is_none());
}

#[test]
fn random_actors_are_distinct() {
    assert_ne!(random_actor(), random_actor());
    let clock = ManualClock::starting_at(-3);
    assert_eq!(clock.tick(), -3);
}
