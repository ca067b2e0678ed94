use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
    AccessCodeData, CommentData, Database, DatabaseError, LikeToggleData, NewComment, NewPost,
    NewSession, NewTrackPlay, PostData, Result, SessionData, TrackPlayData,
};

/// An in-memory database implementation, for tests and local development.
/// Nothing survives a restart.
#[derive(Default)]
pub struct MemoryDatabase {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    access_codes: Vec<AccessCodeData>,
    sessions: HashMap<String, SessionData>,
    posts: Vec<PostData>,
    likes: HashSet<(Uuid, String)>,
    comments: Vec<CommentData>,
    plays: HashMap<Uuid, TrackPlayData>,
    plays_by_key: HashMap<String, Uuid>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an access code, since there is no admin surface here
    pub fn add_access_code(&self, code: &str, kind: &str, active: bool) {
        self.state.lock().access_codes.push(AccessCodeData {
            code: code.to_string(),
            kind: kind.to_string(),
            active,
        });
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn access_code(&self, code: &str) -> Result<AccessCodeData> {
        self.state
            .lock()
            .access_codes
            .iter()
            .find(|c| c.code == code && c.active)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "access code",
                identifier: "code",
            })
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        self.state
            .lock()
            .sessions
            .get(token)
            .cloned()
            .ok_or(DatabaseError::NotFound {
                resource: "session",
                identifier: "token",
            })
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        let mut state = self.state.lock();

        if state.sessions.contains_key(&new_session.token) {
            return Err(DatabaseError::Conflict {
                resource: "session",
                field: "token",
                value: new_session.token,
            });
        }

        let session = SessionData {
            token: new_session.token,
            created_at: new_session.created_at,
            last_active: new_session.last_active,
        };

        state
            .sessions
            .insert(session.token.clone(), session.clone());

        Ok(session)
    }

    async fn touch_session(&self, token: &str, at: DateTime<Utc>) -> Result<()> {
        if let Some(session) = self.state.lock().sessions.get_mut(token) {
            session.last_active = at;
        }

        Ok(())
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        self.state.lock().sessions.remove(token);
        Ok(())
    }

    async fn latest_posts(&self, limit: i64) -> Result<Vec<PostData>> {
        let mut posts = self.state.lock().posts.clone();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        posts.truncate(limit.max(0) as usize);

        Ok(posts)
    }

    async fn create_post(&self, new_post: NewPost) -> Result<PostData> {
        let post = PostData {
            id: Uuid::new_v4(),
            content: new_post.content,
            author_name: new_post.author_name,
            care_package_code: new_post.care_package_code,
            likes: 0,
            created_at: Utc::now(),
        };

        self.state.lock().posts.push(post.clone());
        Ok(post)
    }

    async fn toggle_like(&self, post_id: Uuid, session_token: &str) -> Result<LikeToggleData> {
        let mut state = self.state.lock();

        if !state.posts.iter().any(|p| p.id == post_id) {
            return Err(DatabaseError::NotFound {
                resource: "post",
                identifier: "id",
            });
        }

        let key = (post_id, session_token.to_string());
        let liked = if state.likes.contains(&key) {
            state.likes.remove(&key);
            false
        } else {
            state.likes.insert(key);
            true
        };

        let likes = state.likes.iter().filter(|(id, _)| *id == post_id).count() as i64;

        if let Some(post) = state.posts.iter_mut().find(|p| p.id == post_id) {
            post.likes = likes;
        }

        Ok(LikeToggleData { liked, likes })
    }

    async fn comments_by_post(&self, post_id: Uuid) -> Result<Vec<CommentData>> {
        let mut comments: Vec<_> = self
            .state
            .lock()
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();

        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn create_comment(&self, new_comment: NewComment) -> Result<CommentData> {
        let comment = CommentData {
            id: Uuid::new_v4(),
            post_id: new_comment.post_id,
            content: new_comment.content,
            author_name: new_comment.author_name,
            created_at: Utc::now(),
        };

        self.state.lock().comments.push(comment.clone());
        Ok(comment)
    }

    async fn create_track_play(&self, new_play: NewTrackPlay) -> Result<TrackPlayData> {
        let mut state = self.state.lock();

        if let Some(key) = &new_play.idempotency_key {
            if let Some(existing) = state.plays_by_key.get(key).and_then(|id| state.plays.get(id))
            {
                return Ok(existing.clone());
            }
        }

        let play = TrackPlayData {
            id: Uuid::new_v4(),
            track_key: new_play.track_key,
            ms_played: 0,
            completed: false,
        };

        if let Some(key) = new_play.idempotency_key {
            state.plays_by_key.insert(key, play.id);
        }

        state.plays.insert(play.id, play.clone());
        Ok(play)
    }

    async fn update_track_play(&self, play_id: Uuid, ms_played: i64) -> Result<()> {
        if let Some(play) = self.state.lock().plays.get_mut(&play_id) {
            play.ms_played = ms_played;
        }

        Ok(())
    }

    async fn complete_track_play(
        &self,
        play_id: Uuid,
        ms_played: i64,
        _at: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(play) = self.state.lock().plays.get_mut(&play_id) {
            play.ms_played = ms_played;
            play.completed = true;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::KIND_ALBUM;

    #[tokio::test]
    async fn toggle_like_is_a_true_toggle() {
        let db = MemoryDatabase::new();
        db.add_access_code("ENCORE", KIND_ALBUM, true);

        let post = db
            .create_post(NewPost {
                content: "hello".to_string(),
                author_name: "Anonymous".to_string(),
                care_package_code: None,
            })
            .await
            .unwrap();

        let first = db.toggle_like(post.id, "token-a").await.unwrap();
        assert_eq!(first, LikeToggleData { liked: true, likes: 1 });

        let second = db.toggle_like(post.id, "token-a").await.unwrap();
        assert_eq!(
            second,
            LikeToggleData {
                liked: false,
                likes: 0
            }
        );
    }

    #[tokio::test]
    async fn toggle_like_counts_per_session() {
        let db = MemoryDatabase::new();

        let post = db
            .create_post(NewPost {
                content: "hello".to_string(),
                author_name: "Anonymous".to_string(),
                care_package_code: None,
            })
            .await
            .unwrap();

        db.toggle_like(post.id, "token-a").await.unwrap();
        let result = db.toggle_like(post.id, "token-b").await.unwrap();

        assert_eq!(result, LikeToggleData { liked: true, likes: 2 });
    }

    #[tokio::test]
    async fn play_start_is_idempotent_per_key() {
        let db = MemoryDatabase::new();

        let new_play = || NewTrackPlay {
            track_key: "track-one".to_string(),
            session_token: None,
            ip: None,
            user_agent: None,
            idempotency_key: Some("abc".to_string()),
        };

        let first = db.create_track_play(new_play()).await.unwrap();
        let second = db.create_track_play(new_play()).await.unwrap();

        assert_eq!(first.id, second.id);
    }
}
