//! Post: one published message.

use serde::{Deserialize, Serialize};

use crate::types::Actor;

/// Position of a post within its author's list.
pub type PostId = u64;

/// A published message.
///
/// Everything except `like_count` is fixed at creation. `id` is always the
/// post's position in its author's list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Position within the author's list (0-based).
    pub id: PostId,

    /// Who published the post.
    pub author: Actor,

    /// Message text.
    pub body: String,

    /// When the post was created (Unix ms, host supplied).
    pub created_at: i64,

    /// Number of like events minus number of unlike events.
    pub like_count: u64,
}

impl Post {
    /// Create a new post with zero likes.
    pub fn new(id: PostId, author: Actor, body: impl Into<String>, created_at: i64) -> Self {
        Self {
            id,
            author,
            body: body.into(),
            created_at,
            like_count: 0,
        }
    }

    /// Whether this post sits at `index` in its author's list.
    pub fn is_at(&self, index: PostId) -> bool {
        self.id == index
    }
}
