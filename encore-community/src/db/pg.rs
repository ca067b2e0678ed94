use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, Error as SqlxError, PgPool};
use uuid::Uuid;

use crate::{
    AccessCodeData, CommentData, Database, DatabaseError, IntoDatabaseError, LikeToggleData,
    NewComment, NewPost, NewSession, NewTrackPlay, PostData, Result, SessionData, TrackPlayData,
};

/// A postgres database implementation for encore
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn access_code(&self, code: &str) -> Result<AccessCodeData> {
        sqlx::query_as::<_, AccessCodeData>(
            "SELECT code, kind, active FROM access_codes WHERE code = $1 AND active = true",
        )
        .bind(code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("access code", "code"))
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        sqlx::query_as::<_, SessionData>(
            "SELECT session_token AS token, created_at, last_active
             FROM user_sessions
             WHERE session_token = $1",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.not_found_or("session", "token"))
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        sqlx::query_as::<_, SessionData>(
            "INSERT INTO user_sessions (session_token, created_at, last_active)
             VALUES ($1, $2, $3)
             RETURNING session_token AS token, created_at, last_active",
        )
        .bind(&new_session.token)
        .bind(new_session.created_at)
        .bind(new_session.last_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.conflict_or("session", "token", &new_session.token))
    }

    async fn touch_session(&self, token: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE user_sessions SET last_active = $1 WHERE session_token = $2")
            .bind(at)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn delete_session_by_token(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM user_sessions WHERE session_token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn latest_posts(&self, limit: i64) -> Result<Vec<PostData>> {
        sqlx::query_as::<_, PostData>(
            "SELECT id, content, author_name, care_package_code, likes, created_at
             FROM posts
             ORDER BY created_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn create_post(&self, new_post: NewPost) -> Result<PostData> {
        sqlx::query_as::<_, PostData>(
            "INSERT INTO posts (content, author_name, care_package_code)
             VALUES ($1, $2, $3)
             RETURNING id, content, author_name, care_package_code, likes, created_at",
        )
        .bind(&new_post.content)
        .bind(&new_post.author_name)
        .bind(&new_post.care_package_code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn toggle_like(&self, post_id: Uuid, session_token: &str) -> Result<LikeToggleData> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        // Lock the post row so concurrent toggles serialize on it
        let post: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        if post.is_none() {
            return Err(DatabaseError::NotFound {
                resource: "post",
                identifier: "id",
            });
        }

        let existing: Option<(Uuid,)> = sqlx::query_as(
            "SELECT post_id FROM post_likes WHERE post_id = $1 AND session_token = $2",
        )
        .bind(post_id)
        .bind(session_token)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| e.any())?;

        let liked = existing.is_none();

        if liked {
            sqlx::query("INSERT INTO post_likes (post_id, session_token) VALUES ($1, $2)")
                .bind(post_id)
                .bind(session_token)
                .execute(&mut *tx)
                .await
                .map_err(|e| e.any())?;
        } else {
            sqlx::query("DELETE FROM post_likes WHERE post_id = $1 AND session_token = $2")
                .bind(post_id)
                .bind(session_token)
                .execute(&mut *tx)
                .await
                .map_err(|e| e.any())?;
        }

        let likes: i64 = sqlx::query_scalar("SELECT count(*) FROM post_likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        sqlx::query("UPDATE posts SET likes = $1 WHERE id = $2")
            .bind(likes)
            .bind(post_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        tx.commit().await.map_err(|e| e.any())?;

        Ok(LikeToggleData { liked, likes })
    }

    async fn comments_by_post(&self, post_id: Uuid) -> Result<Vec<CommentData>> {
        sqlx::query_as::<_, CommentData>(
            "SELECT id, post_id, content, author_name, created_at
             FROM comments
             WHERE post_id = $1
             ORDER BY created_at ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn create_comment(&self, new_comment: NewComment) -> Result<CommentData> {
        sqlx::query_as::<_, CommentData>(
            "INSERT INTO comments (post_id, content, author_name)
             VALUES ($1, $2, $3)
             RETURNING id, post_id, content, author_name, created_at",
        )
        .bind(new_comment.post_id)
        .bind(&new_comment.content)
        .bind(&new_comment.author_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| e.any())
    }

    async fn create_track_play(&self, new_play: NewTrackPlay) -> Result<TrackPlayData> {
        let query = if new_play.idempotency_key.is_some() {
            // The conflict target makes a repeated start with the same key
            // return the existing play instead of a duplicate
            sqlx::query_as::<_, TrackPlayData>(
                "INSERT INTO track_plays (track_key, session_token, ip, user_agent, idempotency_key)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (idempotency_key) DO UPDATE SET track_key = EXCLUDED.track_key
                 RETURNING id, track_key, ms_played, completed",
            )
        } else {
            sqlx::query_as::<_, TrackPlayData>(
                "INSERT INTO track_plays (track_key, session_token, ip, user_agent, idempotency_key)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING id, track_key, ms_played, completed",
            )
        };

        query
            .bind(&new_play.track_key)
            .bind(&new_play.session_token)
            .bind(&new_play.ip)
            .bind(&new_play.user_agent)
            .bind(&new_play.idempotency_key)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.any())
    }

    async fn update_track_play(&self, play_id: Uuid, ms_played: i64) -> Result<()> {
        sqlx::query("UPDATE track_plays SET ms_played = $1 WHERE id = $2")
            .bind(ms_played)
            .bind(play_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())
            .map(|_| ())
    }

    async fn complete_track_play(
        &self,
        play_id: Uuid,
        ms_played: i64,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE track_plays
             SET completed = true, completed_at = $1, ms_played = $2
             WHERE id = $3",
        )
        .bind(at)
        .bind(ms_played)
        .bind(play_id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())
        .map(|_| ())
    }
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }

    fn conflict_or(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> DatabaseError {
        let is_unique_violation = self
            .as_database_error()
            .map(|e| e.is_unique_violation())
            .unwrap_or(false);

        if is_unique_violation {
            DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }
        } else {
            Self::any(self)
        }
    }
}
