use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{Database, NewTrackPlay, Result, TrackPlayData};

/// Records how far visitors actually listen
pub struct Analytics<Db> {
    database: Arc<Db>,
}

impl<Db> Analytics<Db>
where
    Db: Database,
{
    pub fn new(database: &Arc<Db>) -> Self {
        Self {
            database: database.clone(),
        }
    }

    /// Records the start of a play. Passing the same idempotency key
    /// again returns the play that was already started.
    pub async fn track_started(&self, new_play: NewTrackPlay) -> Result<TrackPlayData> {
        self.database.create_track_play(new_play).await
    }

    pub async fn track_progressed(&self, play_id: Uuid, ms_played: i64) -> Result<()> {
        self.database
            .update_track_play(play_id, ms_played.max(0))
            .await
    }

    pub async fn track_ended(&self, play_id: Uuid, ms_played: i64) -> Result<()> {
        self.database
            .complete_track_play(play_id, ms_played.max(0), Utc::now())
            .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::MemoryDatabase;

    fn analytics() -> (Analytics<MemoryDatabase>, Arc<MemoryDatabase>) {
        let database = Arc::new(MemoryDatabase::new());
        (Analytics::new(&database), database)
    }

    fn new_play(key: Option<&str>) -> NewTrackPlay {
        NewTrackPlay {
            track_key: "track-one".to_string(),
            session_token: None,
            ip: None,
            user_agent: None,
            idempotency_key: key.map(|k| k.to_string()),
        }
    }

    #[tokio::test]
    async fn a_play_moves_through_its_lifecycle() {
        let (analytics, _database) = analytics();

        let play = analytics.track_started(new_play(Some("abc"))).await.unwrap();
        assert_eq!(play.ms_played, 0);
        assert!(!play.completed);

        analytics.track_progressed(play.id, 15_000).await.unwrap();
        analytics.track_ended(play.id, 180_000).await.unwrap();

        // The idempotency key resolves to the same play, now completed
        let same = analytics.track_started(new_play(Some("abc"))).await.unwrap();
        assert_eq!(same.id, play.id);
        assert!(same.completed);
        assert_eq!(same.ms_played, 180_000);
    }

    #[tokio::test]
    async fn negative_progress_is_clamped() {
        let (analytics, _database) = analytics();

        let play = analytics.track_started(new_play(None)).await.unwrap();
        analytics.track_progressed(play.id, -500).await.unwrap();
    }
}
