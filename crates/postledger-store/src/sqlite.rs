//! SQLite implementation of the Store trait.
//!
//! This is the durable storage backend for the Post Ledger. It uses rusqlite
//! with bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use postledger_core::{
    canonical_notification_bytes, decode_notification, Actor, EventDigest, EventRecord,
    LedgerSettings, Notification, Post, PostId,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{InitResult, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking to
/// avoid blocking the async runtime, and every mutation runs in a
/// transaction.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Internal(format!("mutex poisoned: {}", e)))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Internal(format!("spawn_blocking failed: {}", e)))?
    }
}

fn to_i64(n: u64, field: &str) -> Result<i64> {
    i64::try_from(n).map_err(|_| StoreError::InvalidData(format!("{} {} exceeds i64", field, n)))
}

fn to_u64(n: i64, field: &str) -> Result<u64> {
    u64::try_from(n).map_err(|_| StoreError::InvalidData(format!("negative {}: {}", field, n)))
}

fn to_actor(bytes: &[u8], field: &str) -> Result<Actor> {
    Actor::try_from(bytes).map_err(|_| StoreError::InvalidData(format!("invalid {} length", field)))
}

fn to_digest(bytes: &[u8], field: &str) -> Result<EventDigest> {
    EventDigest::try_from(bytes)
        .map_err(|_| StoreError::InvalidData(format!("invalid {} length", field)))
}

/// Raw post columns, converted outside the rusqlite row closure.
struct PostRow {
    author: Vec<u8>,
    idx: i64,
    body: String,
    created_at: i64,
    like_count: i64,
}

impl PostRow {
    const COLUMNS: &'static str = "author, idx, body, created_at, like_count";

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            author: row.get(0)?,
            idx: row.get(1)?,
            body: row.get(2)?,
            created_at: row.get(3)?,
            like_count: row.get(4)?,
        })
    }

    fn into_post(self) -> Result<Post> {
        Ok(Post {
            id: to_u64(self.idx, "idx")?,
            author: to_actor(&self.author, "author")?,
            body: self.body,
            created_at: self.created_at,
            like_count: to_u64(self.like_count, "like_count")?,
        })
    }
}

/// Raw event columns.
struct EventRow {
    seq: i64,
    recorded_at: i64,
    notification: Vec<u8>,
    prev_digest: Vec<u8>,
    digest: Vec<u8>,
}

impl EventRow {
    const COLUMNS: &'static str = "seq, recorded_at, notification, prev_digest, digest";

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            seq: row.get(0)?,
            recorded_at: row.get(1)?,
            notification: row.get(2)?,
            prev_digest: row.get(3)?,
            digest: row.get(4)?,
        })
    }

    fn into_record(self) -> Result<EventRecord> {
        Ok(EventRecord {
            seq: to_u64(self.seq, "seq")?,
            recorded_at: self.recorded_at,
            prev_digest: to_digest(&self.prev_digest, "prev_digest")?,
            digest: to_digest(&self.digest, "digest")?,
            notification: decode_notification(&self.notification)?,
        })
    }
}

/// Read the log head inside an open connection or transaction.
fn read_event_head(conn: &Connection) -> Result<Option<(u64, EventDigest)>> {
    let row: Option<(i64, Vec<u8>)> = conn
        .query_row(
            "SELECT seq, digest FROM events ORDER BY seq DESC LIMIT 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    row.map(|(seq, digest)| Ok((to_u64(seq, "seq")?, to_digest(&digest, "digest")?)))
        .transpose()
}

/// Chain `notification` onto the log. Caller owns the transaction.
fn append_event(conn: &Connection, recorded_at: i64, notification: Notification) -> Result<EventRecord> {
    let prev = read_event_head(conn)?;
    let record = EventRecord::next(prev, recorded_at, notification);
    let encoded = canonical_notification_bytes(&record.notification);

    conn.execute(
        "INSERT INTO events (
            seq, recorded_at, kind, author, idx, notification, prev_digest, digest
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            to_i64(record.seq, "seq")?,
            record.recorded_at,
            i64::from(record.notification.kind().to_u8()),
            record.notification.author().0.as_slice(),
            to_i64(record.notification.index(), "idx")?,
            encoded,
            record.prev_digest.0.as_slice(),
            record.digest.0.as_slice(),
        ],
    )?;

    Ok(record)
}

#[async_trait]
impl Store for SqliteStore {
    async fn load_settings(&self) -> Result<Option<LedgerSettings>> {
        self.blocking(|conn| {
            let row: Option<(Vec<u8>, i64)> = conn
                .query_row(
                    "SELECT administrator, max_post_length FROM settings WHERE id = 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            row.map(|(admin, max_len)| {
                let max_post_length = u32::try_from(max_len).map_err(|_| {
                    StoreError::InvalidData(format!("max_post_length out of range: {}", max_len))
                })?;
                Ok(LedgerSettings::new(to_actor(&admin, "administrator")?, max_post_length))
            })
            .transpose()
        })
        .await
    }

    async fn init_settings(&self, settings: &LedgerSettings) -> Result<InitResult> {
        let settings = *settings;

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let existing: Option<(Vec<u8>, i64)> = tx
                .query_row(
                    "SELECT administrator, max_post_length FROM settings WHERE id = 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            if let Some((admin, max_len)) = existing {
                let max_post_length = u32::try_from(max_len).map_err(|_| {
                    StoreError::InvalidData(format!("max_post_length out of range: {}", max_len))
                })?;
                return Ok(InitResult::AlreadyInitialized(LedgerSettings::new(
                    to_actor(&admin, "administrator")?,
                    max_post_length,
                )));
            }

            tx.execute(
                "INSERT INTO settings (id, administrator, max_post_length) VALUES (1, ?1, ?2)",
                params![
                    settings.administrator.0.as_slice(),
                    i64::from(settings.max_post_length)
                ],
            )?;
            tx.commit()?;

            Ok(InitResult::Initialized)
        })
        .await
    }

    async fn set_max_post_length(&self, max_post_length: u32) -> Result<()> {
        self.blocking(move |conn| {
            let changed = conn.execute(
                "UPDATE settings SET max_post_length = ?1 WHERE id = 1",
                params![i64::from(max_post_length)],
            )?;
            if changed == 0 {
                return Err(StoreError::NotInitialized);
            }
            Ok(())
        })
        .await
    }

    async fn post_count(&self, author: &Actor) -> Result<u64> {
        let author = *author;

        self.blocking(move |conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM posts WHERE author = ?1",
                params![author.0.as_slice()],
                |row| row.get(0),
            )?;
            to_u64(count, "count")
        })
        .await
    }

    async fn get_post(&self, author: &Actor, index: PostId) -> Result<Option<Post>> {
        let author = *author;
        let Ok(idx) = i64::try_from(index) else {
            return Ok(None);
        };

        self.blocking(move |conn| {
            let sql = format!(
                "SELECT {} FROM posts WHERE author = ?1 AND idx = ?2",
                PostRow::COLUMNS
            );
            conn.query_row(&sql, params![author.0.as_slice(), idx], PostRow::from_row)
                .optional()?
                .map(PostRow::into_post)
                .transpose()
        })
        .await
    }

    async fn get_posts(&self, author: &Actor) -> Result<Vec<Post>> {
        let author = *author;

        self.blocking(move |conn| {
            let sql = format!(
                "SELECT {} FROM posts WHERE author = ?1 ORDER BY idx",
                PostRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![author.0.as_slice()], PostRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter().map(PostRow::into_post).collect()
        })
        .await
    }

    async fn list_authors(&self) -> Result<Vec<Actor>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare("SELECT DISTINCT author FROM posts ORDER BY author")?;
            let rows = stmt
                .query_map([], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.iter().map(|b| to_actor(b, "author")).collect()
        })
        .await
    }

    async fn append_post(
        &self,
        post: &Post,
        recorded_at: i64,
        notification: Notification,
    ) -> Result<EventRecord> {
        let post = post.clone();

        self.blocking(move |conn| {
            let tx = conn.transaction()?;

            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM posts WHERE author = ?1",
                params![post.author.0.as_slice()],
                |row| row.get(0),
            )?;
            let expected = to_u64(count, "count")?;
            if post.id != expected {
                return Err(StoreError::PositionConflict {
                    author: post.author,
                    expected,
                    got: post.id,
                });
            }

            tx.execute(
                "INSERT INTO posts (author, idx, body, created_at, like_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    post.author.0.as_slice(),
                    to_i64(post.id, "idx")?,
                    post.body,
                    post.created_at,
                    to_i64(post.like_count, "like_count")?,
                ],
            )?;

            let record = append_event(&tx, recorded_at, notification)?;
            tx.commit()?;
            Ok(record)
        })
        .await
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
        let author = *author;

        self.blocking(move |conn| {
            let not_found = StoreError::PostNotFound { author, index };
            let Ok(idx) = i64::try_from(index) else {
                return Err(not_found);
            };

            let tx = conn.transaction()?;
            let changed = tx.execute(
                "UPDATE posts SET like_count = ?1
                 WHERE author = ?2 AND idx = ?3 AND like_count = ?4",
                params![
                    to_i64(like_count, "like_count")?,
                    author.0.as_slice(),
                    idx,
                    to_i64(expected, "like_count")?,
                ],
            )?;
            if changed == 0 {
                let found: Option<i64> = tx
                    .query_row(
                        "SELECT like_count FROM posts WHERE author = ?1 AND idx = ?2",
                        params![author.0.as_slice(), idx],
                        |row| row.get(0),
                    )
                    .optional()?;
                return Err(match found {
                    Some(found) => StoreError::LikeCountConflict {
                        author,
                        index,
                        expected,
                        found: to_u64(found, "like_count")?,
                    },
                    None => not_found,
                });
            }

            let record = append_event(&tx, recorded_at, notification)?;
            tx.commit()?;
            Ok(record)
        })
        .await
    }

    async fn events_since(&self, after_seq: u64) -> Result<Vec<EventRecord>> {
        self.blocking(move |conn| {
            // seqs beyond i64::MAX cannot exist
            let Ok(after) = i64::try_from(after_seq) else {
                return Ok(Vec::new());
            };

            let sql = format!(
                "SELECT {} FROM events WHERE seq > ?1 ORDER BY seq",
                EventRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![after], EventRow::from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            rows.into_iter().map(EventRow::into_record).collect()
        })
        .await
    }

    async fn event_head(&self) -> Result<Option<(u64, EventDigest)>> {
        self.blocking(|conn| read_event_head(conn)).await
    }
}
