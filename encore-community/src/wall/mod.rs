use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::{
    sanitize_text, truncate_chars, CommentData, Database, DatabaseError, EventSender,
    LikeToggleData, NewComment, NewPost, PostData, WallEvent, KIND_SPECIAL,
};

mod feed;
pub use feed::*;

/// How many posts a feed snapshot contains at most
pub const FEED_LIMIT: i64 = 100;

pub const POST_MAX_CHARS: usize = 280;
pub const COMMENT_MAX_CHARS: usize = 1000;
pub const AUTHOR_MAX_CHARS: usize = 100;
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// Tokens outside this range cannot belong to a real session
const TOKEN_CHARS: std::ops::RangeInclusive<usize> = 16..=200;

/// The social wall, where visitors post, like, and comment
pub struct Wall<Db> {
    database: Arc<Db>,
    events: EventSender,
}

#[derive(Debug, Error)]
pub enum WallError {
    #[error("Content must not be empty")]
    EmptyContent,
    #[error("The session token is not valid")]
    InvalidToken,
    #[error("The post does not exist")]
    PostNotFound,
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// A post as submitted by a visitor, before sanitizing
#[derive(Debug, Clone)]
pub struct NewWallPost {
    pub content: String,
    pub author_name: Option<String>,
    /// Attribution for posts made from a care-package unlock.
    /// Verified against the stored codes, never trusted as-is.
    pub care_package_code: Option<String>,
}

/// A comment as submitted by a visitor, before sanitizing
#[derive(Debug, Clone)]
pub struct NewWallComment {
    pub post_id: Uuid,
    pub content: String,
    pub author_name: Option<String>,
}

impl<Db> Wall<Db>
where
    Db: Database,
{
    pub fn new(database: &Arc<Db>, events: EventSender) -> Self {
        Self {
            database: database.clone(),
            events,
        }
    }

    /// The newest posts, most recent first
    pub async fn latest_posts(&self) -> Result<Vec<PostData>, WallError> {
        Ok(self.database.latest_posts(FEED_LIMIT).await?)
    }

    pub async fn create_post(&self, new_post: NewWallPost) -> Result<PostData, WallError> {
        let content = truncate_chars(&sanitize_text(&new_post.content), POST_MAX_CHARS);

        if content.is_empty() {
            return Err(WallError::EmptyContent);
        }

        let care_package_code = match new_post.care_package_code {
            Some(code) => self.verify_care_package(&code).await?,
            None => None,
        };

        let post = self
            .database
            .create_post(NewPost {
                content,
                author_name: author_or_default(new_post.author_name),
                care_package_code,
            })
            .await?;

        self.emit(WallEvent::PostCreated { post: post.clone() });
        Ok(post)
    }

    /// Toggles the caller's like on a post and returns the new state
    pub async fn toggle_like(
        &self,
        post_id: Uuid,
        session_token: &str,
    ) -> Result<LikeToggleData, WallError> {
        if !TOKEN_CHARS.contains(&session_token.len()) {
            return Err(WallError::InvalidToken);
        }

        let result = self
            .database
            .toggle_like(post_id, session_token)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => WallError::PostNotFound,
                e => e.into(),
            })?;

        self.emit(WallEvent::LikeToggled {
            post_id,
            likes: result.likes,
        });

        Ok(result)
    }

    /// A post's comment thread, oldest first
    pub async fn comments(&self, post_id: Uuid) -> Result<Vec<CommentData>, WallError> {
        Ok(self.database.comments_by_post(post_id).await?)
    }

    pub async fn create_comment(
        &self,
        new_comment: NewWallComment,
    ) -> Result<CommentData, WallError> {
        let content = truncate_chars(&sanitize_text(&new_comment.content), COMMENT_MAX_CHARS);

        if content.is_empty() {
            return Err(WallError::EmptyContent);
        }

        let comment = self
            .database
            .create_comment(NewComment {
                post_id: new_comment.post_id,
                content,
                author_name: author_or_default(new_comment.author_name),
            })
            .await?;

        self.emit(WallEvent::CommentCreated {
            comment: comment.clone(),
        });

        Ok(comment)
    }

    /// Resolves a claimed care-package code to its canonical form, or
    /// drops it if it doesn't name an active special code
    async fn verify_care_package(&self, code: &str) -> Result<Option<String>, WallError> {
        let code = sanitize_text(code).to_uppercase();

        if code.is_empty() {
            return Ok(None);
        }

        match self.database.access_code(&code).await {
            Ok(access_code) if access_code.kind == KIND_SPECIAL => Ok(Some(access_code.code)),
            Ok(_) => Ok(None),
            Err(DatabaseError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn emit(&self, event: WallEvent) {
        self.events.send(event).expect("event is sent");
    }
}

fn author_or_default(author_name: Option<String>) -> String {
    let name = author_name
        .map(|name| truncate_chars(&sanitize_text(&name), AUTHOR_MAX_CHARS))
        .unwrap_or_default();

    if name.is_empty() {
        DEFAULT_AUTHOR.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{MemoryDatabase, KIND_ALBUM};
    use crossbeam::channel::unbounded;

    const TOKEN: &str = "11111111-2222-3333-4444-555555555555";

    fn wall() -> (Wall<MemoryDatabase>, crate::EventReceiver) {
        let database = MemoryDatabase::new();
        database.add_access_code("ENCORE", KIND_ALBUM, true);
        database.add_access_code("BACKSTAGE", KIND_SPECIAL, true);

        let (sender, receiver) = unbounded();
        (Wall::new(&Arc::new(database), sender), receiver)
    }

    fn post_with(content: &str) -> NewWallPost {
        NewWallPost {
            content: content.to_string(),
            author_name: None,
            care_package_code: None,
        }
    }

    #[tokio::test]
    async fn posts_are_sanitized_and_attributed() {
        let (wall, events) = wall();

        let post = wall
            .create_post(NewWallPost {
                content: "  <script>x</script>Hello  ".to_string(),
                author_name: Some("  Robin  ".to_string()),
                care_package_code: None,
            })
            .await
            .unwrap();

        assert_eq!(post.content, "Hello");
        assert_eq!(post.author_name, "Robin");
        assert!(matches!(
            events.try_recv().unwrap(),
            WallEvent::PostCreated { .. }
        ));
    }

    #[tokio::test]
    async fn empty_posts_are_rejected() {
        let (wall, _events) = wall();

        let result = wall.create_post(post_with("  <script></script>  ")).await;
        assert!(matches!(result, Err(WallError::EmptyContent)));
    }

    #[tokio::test]
    async fn missing_author_becomes_anonymous() {
        let (wall, _events) = wall();

        let post = wall.create_post(post_with("hello")).await.unwrap();
        assert_eq!(post.author_name, DEFAULT_AUTHOR);
    }

    #[tokio::test]
    async fn long_posts_are_truncated() {
        let (wall, _events) = wall();

        let post = wall
            .create_post(post_with(&"a".repeat(POST_MAX_CHARS + 50)))
            .await
            .unwrap();

        assert_eq!(post.content.chars().count(), POST_MAX_CHARS);
    }

    #[tokio::test]
    async fn care_package_codes_are_verified() {
        let (wall, _events) = wall();

        let attributed = wall
            .create_post(NewWallPost {
                content: "hi".to_string(),
                author_name: None,
                care_package_code: Some("backstage".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(attributed.care_package_code.as_deref(), Some("BACKSTAGE"));

        // An album code gives no badge, and neither does a made up one
        for claim in ["ENCORE", "MADEUP"] {
            let plain = wall
                .create_post(NewWallPost {
                    content: "hi".to_string(),
                    author_name: None,
                    care_package_code: Some(claim.to_string()),
                })
                .await
                .unwrap();

            assert!(plain.care_package_code.is_none());
        }
    }

    #[tokio::test]
    async fn like_toggle_round_trips() {
        let (wall, events) = wall();
        let post = wall.create_post(post_with("hello")).await.unwrap();
        let _ = events.try_recv();

        let liked = wall.toggle_like(post.id, TOKEN).await.unwrap();
        assert!(liked.liked);
        assert_eq!(liked.likes, 1);

        let unliked = wall.toggle_like(post.id, TOKEN).await.unwrap();
        assert!(!unliked.liked);
        assert_eq!(unliked.likes, 0);

        assert!(matches!(
            events.try_recv().unwrap(),
            WallEvent::LikeToggled { likes: 1, .. }
        ));
        assert!(matches!(
            events.try_recv().unwrap(),
            WallEvent::LikeToggled { likes: 0, .. }
        ));
    }

    #[tokio::test]
    async fn like_toggle_guards_its_inputs() {
        let (wall, _events) = wall();
        let post = wall.create_post(post_with("hello")).await.unwrap();

        assert!(matches!(
            wall.toggle_like(post.id, "short").await,
            Err(WallError::InvalidToken)
        ));
        assert!(matches!(
            wall.toggle_like(Uuid::new_v4(), TOKEN).await,
            Err(WallError::PostNotFound)
        ));
    }

    #[tokio::test]
    async fn comments_are_sanitized_and_ordered() {
        let (wall, events) = wall();
        let post = wall.create_post(post_with("hello")).await.unwrap();
        let _ = events.try_recv();

        for content in ["first", "  <script>x</script>second  "] {
            wall.create_comment(NewWallComment {
                post_id: post.id,
                content: content.to_string(),
                author_name: None,
            })
            .await
            .unwrap();
        }

        let comments = wall.comments(post.id).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "first");
        assert_eq!(comments[1].content, "second");

        assert!(matches!(
            events.try_recv().unwrap(),
            WallEvent::CommentCreated { .. }
        ));
    }
}
