//! All schemas that are exposed from endpoints are defined here
//! along with the conversion impls

use chrono::{DateTime, Utc};
use encore_community::{
    CommentData, LikeToggleData, PostData, QrCheck as CommunityQrCheck,
    Redemption as CommunityRedemption, TrackPlayData,
};
use encore_core::{AlbumManifest, Track as CoreTrack};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct Redemption {
    token: String,
    /// The tier the redeemed code unlocks
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionStatus {
    pub ok: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QrCheck {
    valid: bool,
    kind: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Post {
    id: Uuid,
    content: String,
    author_name: String,
    care_package_code: Option<String>,
    likes: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeToggle {
    liked: bool,
    likes: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Comment {
    id: Uuid,
    post_id: Uuid,
    content: String,
    author_name: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Comments {
    pub comments: Vec<Comment>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Reply {
    pub reply: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlayStarted {
    play_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Ack {
    pub ok: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Album {
    title: String,
    artist: String,
    tracks: Vec<AlbumTrack>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlbumTrack {
    key: String,
    title: String,
    file: String,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<Redemption> for CommunityRedemption {
    fn to_serialized(&self) -> Redemption {
        Redemption {
            token: self.token.clone(),
            kind: self.kind.clone(),
        }
    }
}

impl ToSerialized<QrCheck> for CommunityQrCheck {
    fn to_serialized(&self) -> QrCheck {
        QrCheck {
            valid: self.valid,
            kind: self.kind.clone(),
            code: self.code.clone(),
        }
    }
}

impl ToSerialized<Post> for PostData {
    fn to_serialized(&self) -> Post {
        Post {
            id: self.id,
            content: self.content.clone(),
            author_name: self.author_name.clone(),
            care_package_code: self.care_package_code.clone(),
            likes: self.likes,
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<LikeToggle> for LikeToggleData {
    fn to_serialized(&self) -> LikeToggle {
        LikeToggle {
            liked: self.liked,
            likes: self.likes,
        }
    }
}

impl ToSerialized<Comment> for CommentData {
    fn to_serialized(&self) -> Comment {
        Comment {
            id: self.id,
            post_id: self.post_id,
            content: self.content.clone(),
            author_name: self.author_name.clone(),
            created_at: self.created_at,
        }
    }
}

impl ToSerialized<PlayStarted> for TrackPlayData {
    fn to_serialized(&self) -> PlayStarted {
        PlayStarted { play_id: self.id }
    }
}

impl ToSerialized<AlbumTrack> for CoreTrack {
    fn to_serialized(&self) -> AlbumTrack {
        AlbumTrack {
            key: self.key.clone(),
            title: self.title.clone(),
            file: self.file.clone(),
        }
    }
}

impl ToSerialized<Album> for AlbumManifest {
    fn to_serialized(&self) -> Album {
        Album {
            title: self.title.clone(),
            artist: self.artist.clone(),
            tracks: self.tracks.to_serialized(),
        }
    }
}
