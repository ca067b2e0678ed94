mod analytics;
mod auth;
mod db;
mod events;
mod relay;
mod util;
mod wall;

use crossbeam::channel::unbounded;
use std::sync::Arc;

pub use analytics::*;
pub use auth::*;
pub use db::*;
pub use events::*;
pub use relay::*;
pub use util::*;
pub use wall::*;

/// The encore community system, facilitating the access gate, the social
/// wall, and play analytics over one shared database.
pub struct Community<Db> {
    event_receiver: EventReceiver,

    pub auth: Auth<Db>,
    pub wall: Wall<Db>,
    pub analytics: Analytics<Db>,
}

impl<Db> Community<Db>
where
    Db: Database,
{
    pub fn new(database: Db) -> Self {
        let database = Arc::new(database);
        let (event_sender, event_receiver) = unbounded();

        Self {
            auth: Auth::new(&database),
            wall: Wall::new(&database, event_sender),
            analytics: Analytics::new(&database),
            event_receiver,
        }
    }

    /// Receive events from the community system.
    pub fn wait_for_event(&self) -> WallEvent {
        self.event_receiver
            .recv()
            .expect("event is received without error")
    }
}
