use uuid::Uuid;

use crate::{PostData, WallEvent, FEED_LIMIT};

/// A materialized view of the wall, fed by snapshots and live events.
///
/// Consumers poll for a snapshot when their event stream drops, so both
/// sources have to merge into the same picture without duplicates.
#[derive(Debug, Default)]
pub struct FeedView {
    posts: Vec<PostData>,
}

impl FeedView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces known posts with a fresh snapshot, keeping newer posts
    /// that arrived over events but aren't in the snapshot yet
    pub fn apply_snapshot(&mut self, snapshot: Vec<PostData>) {
        let mut merged = snapshot;

        for post in self.posts.drain(..) {
            if !merged.iter().any(|p| p.id == post.id) {
                merged.push(post);
            }
        }

        self.posts = merged;
        self.normalize();
    }

    pub fn apply_event(&mut self, event: &WallEvent) {
        match event {
            WallEvent::PostCreated { post } => {
                if !self.posts.iter().any(|p| p.id == post.id) {
                    self.posts.push(post.clone());
                    self.normalize();
                }
            }
            WallEvent::LikeToggled { post_id, likes } => {
                if let Some(post) = self.posts.iter_mut().find(|p| p.id == *post_id) {
                    post.likes = *likes;
                }
            }
            WallEvent::CommentCreated { .. } => {}
        }
    }

    /// The current posts, most recent first
    pub fn posts(&self) -> &[PostData] {
        &self.posts
    }

    pub fn get(&self, id: Uuid) -> Option<&PostData> {
        self.posts.iter().find(|p| p.id == id)
    }

    fn normalize(&mut self) {
        self.posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.posts.truncate(FEED_LIMIT as usize);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{Duration, Utc};

    fn post(likes: i64, age_in_minutes: i64) -> PostData {
        PostData {
            id: Uuid::new_v4(),
            content: "hello".to_string(),
            author_name: "Anonymous".to_string(),
            care_package_code: None,
            likes,
            created_at: Utc::now() - Duration::minutes(age_in_minutes),
        }
    }

    #[test]
    fn snapshots_and_events_merge_without_duplicates() {
        let mut view = FeedView::new();

        let older = post(0, 10);
        let newer = post(0, 1);

        view.apply_snapshot(vec![older.clone()]);
        view.apply_event(&WallEvent::PostCreated {
            post: newer.clone(),
        });
        // A stale snapshot arrives after the event
        view.apply_snapshot(vec![older.clone()]);

        let ids: Vec<_> = view.posts().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);
    }

    #[test]
    fn repeated_events_are_ignored() {
        let mut view = FeedView::new();
        let p = post(0, 1);

        let event = WallEvent::PostCreated { post: p.clone() };
        view.apply_event(&event);
        view.apply_event(&event);

        assert_eq!(view.posts().len(), 1);
    }

    #[test]
    fn like_events_update_counts_in_place() {
        let mut view = FeedView::new();
        let p = post(0, 1);

        view.apply_snapshot(vec![p.clone()]);
        view.apply_event(&WallEvent::LikeToggled {
            post_id: p.id,
            likes: 3,
        });

        assert_eq!(view.get(p.id).unwrap().likes, 3);
    }

    #[test]
    fn the_view_is_capped() {
        let mut view = FeedView::new();

        for minute in 0..(FEED_LIMIT + 20) {
            view.apply_event(&WallEvent::PostCreated {
                post: post(0, minute),
            });
        }

        assert_eq!(view.posts().len(), FEED_LIMIT as usize);
    }
}
