use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// The content tier most access codes unlock
pub const KIND_ALBUM: &str = "album";
/// The care-package tier, unlocked by scanning a QR code
pub const KIND_SPECIAL: &str = "special";

/// A shared secret that unlocks a content tier
#[derive(Debug, Clone, FromRow)]
pub struct AccessCodeData {
    /// Stored uppercase, matched after normalization
    pub code: String,
    /// The tier this code unlocks, see [KIND_ALBUM] and [KIND_SPECIAL]
    pub kind: String,
    pub active: bool,
}

/// An anonymous visitor session, created by redeeming an access code
#[derive(Debug, Clone, FromRow)]
pub struct SessionData {
    /// The session token, or key if you will
    pub token: String,
    pub created_at: DateTime<Utc>,
    /// Validation slides this forward, expiry is measured against it
    pub last_active: DateTime<Utc>,
}

/// A wall post
#[derive(Debug, Clone, FromRow)]
pub struct PostData {
    pub id: Uuid,
    pub content: String,
    pub author_name: String,
    /// Attribution badge for posts made with a care-package unlock
    pub care_package_code: Option<String>,
    /// Denormalized count of post_likes rows for this post
    pub likes: i64,
    pub created_at: DateTime<Utc>,
}

/// The outcome of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeToggleData {
    pub liked: bool,
    pub likes: i64,
}

/// A comment in a post's thread
#[derive(Debug, Clone, FromRow)]
pub struct CommentData {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub author_name: String,
    pub created_at: DateTime<Utc>,
}

/// A recorded playback of an album track
#[derive(Debug, Clone, FromRow)]
pub struct TrackPlayData {
    pub id: Uuid,
    pub track_key: String,
    pub ms_played: i64,
    pub completed: bool,
}
