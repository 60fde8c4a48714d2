//! Property tests: random operation sequences against the reference model.

use proptest::prelude::*;

use postledger::{ErrorKind, LedgerConfig, PostLedger};
use postledger_store::MemoryStore;
use postledger_testkit::fixtures::{multi_party_actors, FIXTURE_EPOCH};
use postledger_testkit::generators::{body, ledger_ops};
use postledger_testkit::model::{apply_to_ledger, ModelLedger};
use postledger_testkit::{LedgerOp, Outcome};

const ACTORS: usize = 4;
const START_BOUND: u32 = 12;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn config() -> LedgerConfig {
    LedgerConfig {
        default_max_post_length: START_BOUND,
        ..LedgerConfig::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ledger_matches_model(ops in ledger_ops(ACTORS, 48)) {
        let actors = multi_party_actors(ACTORS);
        let admin = actors[0];

        runtime().block_on(async {
            let ledger = PostLedger::init(MemoryStore::new(), admin, config()).await.unwrap();
            let mut model = ModelLedger::new(admin, START_BOUND);

            for (i, op) in ops.iter().enumerate() {
                let count_before = match op {
                    LedgerOp::Create { caller, .. } => Some(ledger.post_count(&actors[*caller]).await.unwrap()),
                    _ => None,
                };
                let bound_before = ledger.max_post_length().await.unwrap();
                let events_before = ledger.events_since(0).await.unwrap().len();

                let expected = model.apply(op, &actors);
                let actual = apply_to_ledger(&ledger, op, &actors, FIXTURE_EPOCH + i as i64)
                    .await
                    .unwrap();
                prop_assert_eq!(actual, expected, "op {} = {:?}", i, op);

                if let (Outcome::Created(id), Some(before)) = (actual, count_before) {
                    prop_assert_eq!(id, before);
                }

                let events_after = ledger.events_since(0).await.unwrap().len();
                let emitted = events_after - events_before;
                prop_assert_eq!(emitted, usize::from(actual.emits_notification()));

                if actual == Outcome::Rejected(ErrorKind::Unauthorized) {
                    prop_assert_eq!(ledger.max_post_length().await.unwrap(), bound_before);
                }
            }

            for author in &actors {
                let posts = ledger.get_all_posts(author).await.unwrap();
                let expected: Vec<u64> = model.likes.get(author).cloned().unwrap_or_default();
                let actual: Vec<u64> = posts.iter().map(|p| p.like_count).collect();
                prop_assert_eq!(actual, expected);
                for (i, post) in posts.iter().enumerate() {
                    prop_assert_eq!(post.id, i as u64);
                    prop_assert_eq!(post.author, *author);
                }
            }

            prop_assert_eq!(ledger.max_post_length().await.unwrap(), model.max_post_length);
            prop_assert_eq!(ledger.verify_event_log().await.unwrap(), model.notifications);
            Ok(())
        })?;
    }

    #[test]
    fn body_bound_counts_bytes(text in body(16), bound in 0u32..40) {
        let actors = multi_party_actors(2);

        runtime().block_on(async {
            let config = LedgerConfig { default_max_post_length: bound, ..LedgerConfig::default() };
            let ledger = PostLedger::init(MemoryStore::new(), actors[0], config).await.unwrap();
            let ctx = postledger::CallContext::new(actors[1], FIXTURE_EPOCH);

            let result = ledger.create_post(&ctx, &text).await;
            if text.len() as u64 <= u64::from(bound) {
                prop_assert_eq!(result.unwrap(), 0);
                prop_assert_eq!(ledger.get_post(&actors[1], 0).await.unwrap().body, text);
            } else {
                prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidArgument);
                prop_assert_eq!(ledger.post_count(&actors[1]).await.unwrap(), 0);
            }
            Ok(())
        })?;
    }
}
