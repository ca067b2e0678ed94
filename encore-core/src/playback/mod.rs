use crossbeam::channel::unbounded;
use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

mod player;

pub use player::*;

use crate::{CommandReceiver, Config, EventReceiver, MediaControls, PlayerEvent, Transports};

/// The playback engine. Owns the player, its sampling thread, and the
/// command channel external control surfaces talk to.
pub struct Playback {
    player: Arc<Player>,
    controls: MediaControls,
    event_receiver: EventReceiver,
}

impl Playback {
    pub fn new(config: Config, transports: Transports) -> Self {
        let (event_sender, event_receiver) = unbounded();
        let (command_sender, command_receiver) = unbounded();

        let player = Arc::new(Player::new(&config, transports, event_sender));

        spawn_sampling_thread(&player, config.sampling_interval());
        spawn_command_thread(&player, command_receiver);

        Self {
            player,
            controls: MediaControls::new(command_sender),
            event_receiver,
        }
    }

    pub fn player(&self) -> &Arc<Player> {
        &self.player
    }

    /// Returns a handle that mirrors an external control surface onto the player.
    pub fn controls(&self) -> MediaControls {
        self.controls.clone()
    }

    /// Receive events from the playback engine.
    pub fn wait_for_event(&self) -> PlayerEvent {
        self.event_receiver
            .recv()
            .expect("event is received without error")
    }
}

/// Advances the position of the playing track a few times per second.
///
/// Playback position is driven by continuous sampling, not by discrete
/// events from a media backend.
fn spawn_sampling_thread(player: &Arc<Player>, interval: Duration) {
    let weak = Arc::downgrade(player);
    let delta = interval.as_secs_f32();

    let run = move || {
        let mut next = Instant::now();

        loop {
            let Some(player) = weak.upgrade() else { break };

            player.tick(delta);
            drop(player);

            next += interval;
            spin_sleep::sleep(next - Instant::now());
        }
    };

    thread::spawn(run);
}

fn spawn_command_thread(player: &Arc<Player>, command_receiver: CommandReceiver) {
    let weak = Arc::downgrade(player);

    let run = move || {
        while let Ok(command) = command_receiver.recv() {
            let Some(player) = weak.upgrade() else { break };
            player.handle(command);
        }
    };

    thread::spawn(run);
}
