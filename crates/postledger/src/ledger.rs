//! The ledger: every operation on posts, likes and settings.
//!
//! Mutating calls run under one commit lock, so validation and the store
//! commit form a single step and calls are applied in a strict global order.
//! Reads go straight to the store, which only exposes committed state.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use postledger_core::{
    verify_chain, Actor, EventDigest, EventRecord, LedgerSettings, Notification, Post, PostId,
};
use postledger_store::{InitResult, Store};

use crate::config::LedgerConfig;
use crate::context::CallContext;
use crate::error::{LedgerError, Result};

/// State guarded by the commit lock.
#[derive(Debug, Default)]
struct CommitState {
    /// Latest host time seen on a mutating call.
    last_seen_at: Option<i64>,
}

impl CommitState {
    fn observe(&mut self, now: i64) {
        match self.last_seen_at {
            Some(last) if now < last => {
                warn!(now, last, "host timestamp went backwards");
            }
            Some(last) if now == last => {}
            _ => self.last_seen_at = Some(now),
        }
    }
}

/// An append-only post ledger over a [`Store`].
pub struct PostLedger<S: Store> {
    store: S,
    config: LedgerConfig,
    /// Fixed at initialization.
    administrator: Actor,
    commit_lock: Mutex<CommitState>,
}

impl<S: Store> PostLedger<S> {
    /// Initialize a new ledger on an empty store.
    ///
    /// `initializer` becomes the administrator for the ledger's lifetime.
    /// Fails with `InvalidState` if the store already holds a ledger.
    pub async fn init(store: S, initializer: Actor, config: LedgerConfig) -> Result<Self> {
        let settings = LedgerSettings::new(initializer, config.default_max_post_length);

        match store.init_settings(&settings).await? {
            InitResult::Initialized => {
                info!(
                    administrator = %initializer,
                    max_post_length = settings.max_post_length,
                    "ledger initialized"
                );
            }
            InitResult::AlreadyInitialized(existing) => {
                return Err(LedgerError::InvalidState(format!(
                    "ledger already initialized with administrator {}",
                    existing.administrator
                )));
            }
        }

        Ok(Self::from_parts(store, initializer, config))
    }

    /// Reopen a ledger that was initialized earlier on this store.
    pub async fn open(store: S, config: LedgerConfig) -> Result<Self> {
        let settings = store
            .load_settings()
            .await?
            .ok_or_else(|| LedgerError::InvalidState("ledger not initialized".into()))?;

        if config.verify_log_on_open {
            let events = store.events_since(0).await?;
            verify_chain(&events).map_err(|e| {
                LedgerError::InvalidState(format!("event log failed verification: {}", e))
            })?;
            debug!(events = events.len(), "event log verified");
        }

        info!(
            administrator = %settings.administrator,
            max_post_length = settings.max_post_length,
            "ledger opened"
        );
        Ok(Self::from_parts(store, settings.administrator, config))
    }

    fn from_parts(store: S, administrator: Actor, config: LedgerConfig) -> Self {
        Self {
            store,
            config,
            administrator,
            commit_lock: Mutex::new(CommitState::default()),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The identity allowed to change the post length bound.
    pub fn administrator(&self) -> Actor {
        self.administrator
    }

    /// The post length bound currently in force (bytes).
    pub async fn max_post_length(&self) -> Result<u32> {
        Ok(self.settings().await?.max_post_length)
    }

    async fn settings(&self) -> Result<LedgerSettings> {
        self.store
            .load_settings()
            .await?
            .ok_or_else(|| LedgerError::InvalidState("ledger not initialized".into()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admin
    // ─────────────────────────────────────────────────────────────────────────

    /// Replace the post length bound. Administrator only.
    ///
    /// Existing posts are unaffected. Emits no notification.
    pub async fn set_max_post_length(&self, ctx: &CallContext, new_length: u32) -> Result<()> {
        let mut state = self.commit_lock.lock().await;
        state.observe(ctx.now);

        let settings = self.settings().await?;
        if !settings.is_administrator(&ctx.actor) {
            warn!(caller = %ctx.actor, "rejected max post length change from non-administrator");
            return Err(LedgerError::Unauthorized(format!(
                "{} is not the administrator",
                ctx.actor
            )));
        }

        self.store.set_max_post_length(new_length).await?;
        info!(previous = settings.max_post_length, new_length, "max post length changed");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Posts
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a post to the caller's list.
    ///
    /// Returns the new post's id, which equals the number of posts the caller
    /// had before this call.
    pub async fn create_post(&self, ctx: &CallContext, body: &str) -> Result<PostId> {
        let mut state = self.commit_lock.lock().await;
        state.observe(ctx.now);

        let settings = self.settings().await?;
        if !settings.admits(body.len()) {
            return Err(LedgerError::InvalidArgument(format!(
                "post too long: {} bytes exceeds limit of {}",
                body.len(),
                settings.max_post_length
            )));
        }

        let id = self.store.post_count(&ctx.actor).await?;
        let post = Post::new(id, ctx.actor, body, ctx.now);
        let notification = Notification::PostCreated {
            id,
            author: ctx.actor,
            body: post.body.clone(),
            created_at: ctx.now,
        };

        let record = self.store.append_post(&post, ctx.now, notification).await?;
        debug!(author = %ctx.actor, id, seq = record.seq, "post created");
        Ok(id)
    }

    /// Snapshot of the post at `index` in `author`'s list.
    pub async fn get_post(&self, author: &Actor, index: PostId) -> Result<Post> {
        let post = self
            .store
            .get_post(author, index)
            .await?
            .ok_or_else(|| not_found(author, index))?;
        debug_assert!(post.is_at(index), "stored post id must equal its position");
        Ok(post)
    }

    /// `author`'s whole list in creation order; empty if they never posted.
    pub async fn get_all_posts(&self, author: &Actor) -> Result<Vec<Post>> {
        let posts = self.store.get_posts(author).await?;
        debug_assert!(
            posts.iter().enumerate().all(|(i, p)| p.is_at(i as PostId)),
            "stored post ids must equal their positions"
        );
        Ok(posts)
    }

    /// Number of posts `author` has published.
    pub async fn post_count(&self, author: &Actor) -> Result<u64> {
        Ok(self.store.post_count(author).await?)
    }

    /// Every author with at least one post.
    pub async fn authors(&self) -> Result<Vec<Actor>> {
        Ok(self.store.list_authors().await?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Likes
    // ─────────────────────────────────────────────────────────────────────────

    /// Add one like to `author`'s post at `index`; returns the new count.
    ///
    /// Likes are counted, not deduplicated: the same caller may like a post
    /// any number of times.
    pub async fn like_post(&self, ctx: &CallContext, author: &Actor, index: PostId) -> Result<u64> {
        let mut state = self.commit_lock.lock().await;
        state.observe(ctx.now);

        // Range check first, then the existence re-check on the fetched post.
        let count = self.store.post_count(author).await?;
        if index >= count {
            return Err(LedgerError::NotFound(format!(
                "index {} out of range for author {} with {} posts",
                index, author, count
            )));
        }
        let post = self.existing_post(author, index).await?;

        let like_count = post
            .like_count
            .checked_add(1)
            .ok_or_else(|| LedgerError::InvalidState("like count overflow".into()))?;

        let notification = Notification::PostLiked {
            liker: ctx.actor,
            author: *author,
            index,
            like_count,
        };
        let record = self
            .store
            .set_like_count(author, index, post.like_count, like_count, ctx.now, notification)
            .await?;

        debug!(liker = %ctx.actor, %author, index, like_count, seq = record.seq, "post liked");
        Ok(like_count)
    }

    /// Remove one like from `author`'s post at `index`; returns the new count.
    pub async fn unlike_post(
        &self,
        ctx: &CallContext,
        author: &Actor,
        index: PostId,
    ) -> Result<u64> {
        let mut state = self.commit_lock.lock().await;
        state.observe(ctx.now);

        let post = self.existing_post(author, index).await?;
        if post.like_count == 0 {
            return Err(LedgerError::InvalidState("no likes to remove".into()));
        }
        let like_count = post.like_count - 1;

        let notification = Notification::PostUnliked {
            unliker: ctx.actor,
            author: *author,
            index,
            like_count,
        };
        let record = self
            .store
            .set_like_count(author, index, post.like_count, like_count, ctx.now, notification)
            .await?;

        debug!(unliker = %ctx.actor, %author, index, like_count, seq = record.seq, "post unliked");
        Ok(like_count)
    }

    /// The post at `index`, if one exists there whose id matches.
    async fn existing_post(&self, author: &Actor, index: PostId) -> Result<Post> {
        self.store
            .get_post(author, index)
            .await?
            .filter(|post| post.is_at(index))
            .ok_or_else(|| not_found(author, index))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event log
    // ─────────────────────────────────────────────────────────────────────────

    /// Committed notifications with `seq > after_seq`, in commit order.
    pub async fn events_since(&self, after_seq: u64) -> Result<Vec<EventRecord>> {
        Ok(self.store.events_since(after_seq).await?)
    }

    /// `(seq, digest)` of the latest notification, or `None` before the first.
    ///
    /// A subscriber that stored this pair can later detect a rewritten log by
    /// comparing it with the record at the same `seq`.
    pub async fn log_head(&self) -> Result<Option<(u64, EventDigest)>> {
        Ok(self.store.event_head().await?)
    }

    /// Walk the whole event log and check its hash chain.
    ///
    /// Returns the number of records verified.
    pub async fn verify_event_log(&self) -> Result<u64> {
        let events = self.store.events_since(0).await?;
        verify_chain(&events)?;
        Ok(events.len() as u64)
    }
}

fn not_found(author: &Actor, index: PostId) -> LedgerError {
    LedgerError::NotFound(format!("no post at index {} for author {}", index, author))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use postledger_store::MemoryStore;

    async fn ledger() -> (PostLedger<MemoryStore>, Actor) {
        let admin = Actor::derive("admin");
        let ledger = PostLedger::init(MemoryStore::new(), admin, LedgerConfig::default())
            .await
            .unwrap();
        (ledger, admin)
    }

    #[tokio::test]
    async fn test_init_sets_administrator_and_default_bound() {
        let (ledger, admin) = ledger().await;
        assert_eq!(ledger.administrator(), admin);
        assert_eq!(ledger.max_post_length().await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_init_twice_fails() {
        let store = MemoryStore::new();
        let settings = LedgerSettings::new(Actor::derive("first"), 500);
        store.init_settings(&settings).await.unwrap();

        let err = PostLedger::init(store, Actor::derive("second"), LedgerConfig::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_open_uninitialized_fails() {
        let err = PostLedger::open(MemoryStore::new(), LedgerConfig::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_ids_follow_positions_per_author() {
        let (ledger, _) = ledger().await;
        let u = Actor::derive("u");
        let v = Actor::derive("v");

        assert_eq!(ledger.create_post(&CallContext::new(u, 1), "a").await.unwrap(), 0);
        assert_eq!(ledger.create_post(&CallContext::new(v, 2), "b").await.unwrap(), 0);
        assert_eq!(ledger.create_post(&CallContext::new(u, 3), "c").await.unwrap(), 1);

        let posts = ledger.get_all_posts(&u).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].body, "c");
        assert_eq!(posts[1].created_at, 3);
        assert_eq!(ledger.authors().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_all_posts_empty_for_unknown_author() {
        let (ledger, _) = ledger().await;
        assert!(ledger.get_all_posts(&Actor::derive("nobody")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_post_missing_is_not_found() {
        let (ledger, _) = ledger().await;
        let err = ledger.get_post(&Actor::derive("nobody"), 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_get_post_at_list_length_is_not_found() {
        let (ledger, _) = ledger().await;
        let u = Actor::derive("u");
        ledger.create_post(&CallContext::new(u, 1), "first").await.unwrap();
        ledger.create_post(&CallContext::new(u, 2), "second").await.unwrap();

        assert_eq!(ledger.get_post(&u, 1).await.unwrap().body, "second");
        let err = ledger.get_post(&u, 2).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            ledger.get_post(&u, u64::MAX).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_regressed_timestamp_is_stored_verbatim() {
        let (ledger, _) = ledger().await;
        let u = Actor::derive("u");
        let v = Actor::derive("v");
        ledger.create_post(&CallContext::new(u, 5_000), "later").await.unwrap();
        ledger.create_post(&CallContext::new(u, 1_000), "earlier").await.unwrap();
        ledger.like_post(&CallContext::new(v, 500), &u, 1).await.unwrap();

        let posts = ledger.get_all_posts(&u).await.unwrap();
        assert_eq!(posts[0].created_at, 5_000);
        assert_eq!(posts[1].created_at, 1_000);

        let recorded: Vec<i64> = ledger
            .events_since(0)
            .await
            .unwrap()
            .iter()
            .map(|r| r.recorded_at)
            .collect();
        assert_eq!(recorded, vec![5_000, 1_000, 500]);
        assert_eq!(ledger.verify_event_log().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_returned_post_is_a_snapshot() {
        let (ledger, _) = ledger().await;
        let u = Actor::derive("u");
        ledger.create_post(&CallContext::new(u, 1), "hello").await.unwrap();

        let mut copy = ledger.get_post(&u, 0).await.unwrap();
        copy.like_count = 99;
        copy.body.push_str(" world");

        let stored = ledger.get_post(&u, 0).await.unwrap();
        assert_eq!(stored.like_count, 0);
        assert_eq!(stored.body, "hello");
    }

    #[tokio::test]
    async fn test_like_index_equal_to_length_is_rejected() {
        let (ledger, _) = ledger().await;
        let u = Actor::derive("u");
        let v = CallContext::new(Actor::derive("v"), 2);
        ledger.create_post(&CallContext::new(u, 1), "only").await.unwrap();

        let err = ledger.like_post(&v, &u, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(ledger.events_since(0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unlike_missing_post_is_not_found() {
        let (ledger, _) = ledger().await;
        let v = CallContext::new(Actor::derive("v"), 2);
        let err = ledger.unlike_post(&v, &Actor::derive("u"), 0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_repeat_likes_are_counted() {
        let (ledger, _) = ledger().await;
        let u = Actor::derive("u");
        let v = CallContext::new(Actor::derive("v"), 2);
        ledger.create_post(&CallContext::new(u, 1), "hi").await.unwrap();

        for expected in 1..=3 {
            assert_eq!(ledger.like_post(&v, &u, 0).await.unwrap(), expected);
        }
        assert_eq!(ledger.get_post(&u, 0).await.unwrap().like_count, 3);
    }

    #[tokio::test]
    async fn test_set_max_post_length_by_admin() {
        let (ledger, admin) = ledger().await;
        let u = CallContext::new(Actor::derive("u"), 2);
        ledger.create_post(&u, "a longer post").await.unwrap();

        ledger
            .set_max_post_length(&CallContext::new(admin, 1), 3)
            .await
            .unwrap();
        assert_eq!(ledger.max_post_length().await.unwrap(), 3);

        // Earlier posts stay valid; new ones obey the new bound.
        assert_eq!(ledger.get_post(&u.actor, 0).await.unwrap().body, "a longer post");
        assert_eq!(
            ledger.create_post(&u, "four").await.unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(ledger.create_post(&u, "abc").await.unwrap(), 1);

        // No notification for the admin call.
        assert_eq!(ledger.events_since(0).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_set_bound() {
        let (ledger, _) = ledger().await;
        let err = ledger
            .set_max_post_length(&CallContext::new(Actor::derive("mallory"), 1), 10)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(ledger.max_post_length().await.unwrap(), 500);
    }

    #[tokio::test]
    async fn test_body_length_is_measured_in_bytes() {
        let (ledger, admin) = ledger().await;
        ledger
            .set_max_post_length(&CallContext::new(admin, 1), 4)
            .await
            .unwrap();
        let u = CallContext::new(Actor::derive("u"), 2);

        // Two 2-byte characters fit, a third does not.
        assert!(ledger.create_post(&u, "éé").await.is_ok());
        assert_eq!(
            ledger.create_post(&u, "ééé").await.unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[tokio::test]
    async fn test_verify_event_log_counts_records() {
        let (ledger, _) = ledger().await;
        let u = Actor::derive("u");
        let v = CallContext::new(Actor::derive("v"), 3);
        ledger.create_post(&CallContext::new(u, 1), "x").await.unwrap();
        ledger.like_post(&v, &u, 0).await.unwrap();
        ledger.unlike_post(&v, &u, 0).await.unwrap();

        assert_eq!(ledger.verify_event_log().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_log_head_follows_commits() {
        let (ledger, admin) = ledger().await;
        assert_eq!(ledger.log_head().await.unwrap(), None);

        let u = Actor::derive("u");
        ledger.create_post(&CallContext::new(u, 1), "x").await.unwrap();
        ledger.like_post(&CallContext::new(admin, 2), &u, 0).await.unwrap();

        let events = ledger.events_since(0).await.unwrap();
        let head = ledger.log_head().await.unwrap();
        assert_eq!(head, Some(events[1].head()));

        // Rejected calls and bound changes leave the head alone.
        ledger.like_post(&CallContext::new(admin, 3), &u, 7).await.unwrap_err();
        ledger
            .set_max_post_length(&CallContext::new(admin, 4), 10)
            .await
            .unwrap();
        assert_eq!(ledger.log_head().await.unwrap(), head);
    }

    #[test]
    fn test_commit_state_tracks_latest_time() {
        let mut state = CommitState::default();
        state.observe(10);
        state.observe(5);
        assert_eq!(state.last_seen_at, Some(10));
        state.observe(20);
        assert_eq!(state.last_seen_at, Some(20));
    }
}
