//! In-memory implementation of the Store trait.
//!
//! Same semantics as SQLite but everything lives in memory with no
//! persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use postledger_core::{
    Actor, EventDigest, EventRecord, LedgerSettings, Notification, Post, PostId,
};

use crate::error::{Result, StoreError};
use crate::traits::{InitResult, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via a single
/// RwLock, so every commit is applied as one step.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    settings: Option<LedgerSettings>,

    /// Author ledgers. BTreeMap keeps `list_authors` ordered.
    posts: BTreeMap<Actor, Vec<Post>>,

    /// Event log; `events[i].seq == i + 1`.
    events: Vec<EventRecord>,
}

impl MemoryStoreInner {
    fn push_event(&mut self, recorded_at: i64, notification: Notification) -> EventRecord {
        let prev = self.events.last().map(EventRecord::head);
        let record = EventRecord::next(prev, recorded_at, notification);
        self.events.push(record.clone());
        record
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Internal(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Internal(format!("lock poisoned: {}", e)))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_settings(&self) -> Result<Option<LedgerSettings>> {
        Ok(self.read()?.settings)
    }

    async fn init_settings(&self, settings: &LedgerSettings) -> Result<InitResult> {
        let mut inner = self.write()?;
        if let Some(existing) = inner.settings {
            return Ok(InitResult::AlreadyInitialized(existing));
        }
        inner.settings = Some(*settings);
        Ok(InitResult::Initialized)
    }

    async fn set_max_post_length(&self, max_post_length: u32) -> Result<()> {
        let mut inner = self.write()?;
        let settings = inner.settings.as_mut().ok_or(StoreError::NotInitialized)?;
        settings.max_post_length = max_post_length;
        Ok(())
    }

    async fn post_count(&self, author: &Actor) -> Result<u64> {
        let inner = self.read()?;
        Ok(inner.posts.get(author).map(|p| p.len() as u64).unwrap_or(0))
    }

    async fn get_post(&self, author: &Actor, index: PostId) -> Result<Option<Post>> {
        let inner = self.read()?;
        let post = usize::try_from(index)
            .ok()
            .and_then(|i| inner.posts.get(author).and_then(|posts| posts.get(i)));
        Ok(post.cloned())
    }

    async fn get_posts(&self, author: &Actor) -> Result<Vec<Post>> {
        let inner = self.read()?;
        Ok(inner.posts.get(author).cloned().unwrap_or_default())
    }

    async fn list_authors(&self) -> Result<Vec<Actor>> {
        let inner = self.read()?;
        Ok(inner.posts.keys().copied().collect())
    }

    async fn append_post(
        &self,
        post: &Post,
        recorded_at: i64,
        notification: Notification,
    ) -> Result<EventRecord> {
        let mut inner = self.write()?;

        let expected = inner.posts.get(&post.author).map(|p| p.len() as u64).unwrap_or(0);
        if post.id != expected {
            return Err(StoreError::PositionConflict {
                author: post.author,
                expected,
                got: post.id,
            });
        }

        inner.posts.entry(post.author).or_default().push(post.clone());
        Ok(inner.push_event(recorded_at, notification))
    }

    async fn set_like_count(
        &self,
        author: &Actor,
        index: PostId,
        expected: u64,
        like_count: u64,
        recorded_at: i64,
        notification: Notification,
    ) -> Result<EventRecord> {
        let mut inner = self.write()?;

        let post = usize::try_from(index)
            .ok()
            .and_then(|i| inner.posts.get_mut(author).and_then(|posts| posts.get_mut(i)))
            .ok_or(StoreError::PostNotFound {
                author: *author,
                index,
            })?;
        if post.like_count != expected {
            return Err(StoreError::LikeCountConflict {
                author: *author,
                index,
                expected,
                found: post.like_count,
            });
        }
        post.like_count = like_count;

        Ok(inner.push_event(recorded_at, notification))
    }

    async fn events_since(&self, after_seq: u64) -> Result<Vec<EventRecord>> {
        let inner = self.read()?;
        // seq n lives at position n - 1
        let start = usize::try_from(after_seq)
            .unwrap_or(usize::MAX)
            .min(inner.events.len());
        Ok(inner.events[start..].to_vec())
    }

    async fn event_head(&self) -> Result<Option<(u64, EventDigest)>> {
        let inner = self.read()?;
        Ok(inner.events.last().map(EventRecord::head))
    }
}
