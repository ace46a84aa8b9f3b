//! The boundary to the hosted backend.
//!
//! Every operation is a single request against the remote service, which is
//! the source of truth; nothing here caches or enforces invariants.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::model::{Comment, CommentId, Identity, NewComment, NewPost, Post, PostFields, PostFilter, PostId, UserId};
use crate::realtime::ChangeEvent;

pub type ChangeCallback = Box<dyn Fn(ChangeEvent)>;

#[async_trait(?Send)]
pub trait Gateway {
    /// Newest first. The search part of the filter is applied client-side
    /// over the whole (optionally owner-filtered) collection.
    async fn list_posts(&self, filter: &PostFilter) -> AppResult<Vec<Post>>;
    async fn get_post(&self, id: &PostId) -> AppResult<Post>;
    async fn create_post(&self, post: NewPost) -> AppResult<Post>;
    async fn update_post(&self, id: &PostId, fields: PostFields) -> AppResult<Post>;
    async fn delete_post(&self, id: &PostId) -> AppResult<()>;
    async fn increment_views(&self, id: &PostId) -> AppResult<()>;

    /// Oldest first.
    async fn list_comments(&self, post: &PostId) -> AppResult<Vec<Comment>>;
    async fn create_comment(&self, comment: NewComment) -> AppResult<Comment>;
    async fn update_comment(&self, id: &CommentId, text: &str) -> AppResult<Comment>;
    async fn delete_comment(&self, id: &CommentId) -> AppResult<()>;

    async fn like_count(&self, post: &PostId) -> AppResult<u64>;
    async fn has_liked(&self, post: &PostId, user: &UserId) -> AppResult<bool>;
    async fn like(&self, post: &PostId, user: &UserId) -> AppResult<()>;
    async fn unlike(&self, post: &PostId, user: &UserId) -> AppResult<()>;

    /// Delivers insert, update and delete events for posts, optionally only
    /// those owned by `owner`, until the returned handle is dropped.
    fn subscribe_to_post_changes(&self, callback: ChangeCallback, owner: Option<UserId>) -> Subscription;
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecoveryTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[async_trait(?Send)]
pub trait AuthClient {
    /// `Ok(None)` when nobody is signed in.
    async fn current_identity(&self) -> AppResult<Option<Identity>>;
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<Identity>;
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<()>;
    async fn sign_out(&self) -> AppResult<()>;
    async fn send_password_reset(&self, email: &str) -> AppResult<()>;
    async fn update_password(&self, recovery: &RecoveryTokens, new_password: &str) -> AppResult<()>;
}

/// Keeps a change feed open; dropping it closes the feed.
#[must_use]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn inert() -> Self {
        Subscription { cancel: None }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
