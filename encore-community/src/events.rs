use crossbeam::channel::{Receiver, Sender};

use crate::{CommentData, PostData};

pub type EventSender = Sender<WallEvent>;
pub type EventReceiver = Receiver<WallEvent>;

/// An event emitted when the wall changes
#[derive(Debug, Clone)]
pub enum WallEvent {
    PostCreated { post: PostData },
    CommentCreated { comment: CommentData },
    LikeToggled { post_id: uuid::Uuid, likes: i64 },
}
