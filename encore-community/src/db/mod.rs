use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

mod data;
pub use data::*;

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn conflict_or(self, resource: &'static str, field: &'static str, value: &str)
        -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// Represents a type that can fetch and store encore data
#[async_trait]
pub trait Database
where
    Self: 'static + Sync + Send,
{
    /// Returns the active access code matching `code` exactly.
    /// Inactive codes are treated as absent.
    async fn access_code(&self, code: &str) -> Result<AccessCodeData>;

    async fn session_by_token(&self, token: &str) -> Result<SessionData>;
    async fn create_session(&self, new_session: NewSession) -> Result<SessionData>;
    /// Moves `last_active` forward. Not an error if the session is gone.
    async fn touch_session(&self, token: &str, at: DateTime<Utc>) -> Result<()>;
    /// Deletes the session. Not an error if it is already gone.
    async fn delete_session_by_token(&self, token: &str) -> Result<()>;

    async fn latest_posts(&self, limit: i64) -> Result<Vec<PostData>>;
    async fn create_post(&self, new_post: NewPost) -> Result<PostData>;
    /// Toggles a like for `(post_id, session_token)` and refreshes the
    /// post's denormalized count from the authoritative row count.
    ///
    /// Implementations must perform the existence check, the mutation, and
    /// the recount as one atomic unit.
    async fn toggle_like(&self, post_id: Uuid, session_token: &str) -> Result<LikeToggleData>;

    /// Comments for a post, ordered by creation time ascending.
    async fn comments_by_post(&self, post_id: Uuid) -> Result<Vec<CommentData>>;
    async fn create_comment(&self, new_comment: NewComment) -> Result<CommentData>;

    /// Records the start of a play. When an idempotency key is supplied,
    /// recording the same key again returns the existing play.
    async fn create_track_play(&self, new_play: NewTrackPlay) -> Result<TrackPlayData>;
    async fn update_track_play(&self, play_id: Uuid, ms_played: i64) -> Result<()>;
    async fn complete_track_play(
        &self,
        play_id: Uuid,
        ms_played: i64,
        at: DateTime<Utc>,
    ) -> Result<()>;
}

#[derive(Debug)]
pub struct NewSession {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewPost {
    pub content: String,
    pub author_name: String,
    pub care_package_code: Option<String>,
}

#[derive(Debug)]
pub struct NewComment {
    pub post_id: Uuid,
    pub content: String,
    pub author_name: String,
}

#[derive(Debug)]
pub struct NewTrackPlay {
    pub track_key: String,
    pub session_token: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub idempotency_key: Option<String>,
}
