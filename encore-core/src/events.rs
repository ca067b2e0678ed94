use crossbeam::channel::{Receiver, Sender};

use crate::{Track, TransportState};

pub type EventSender = Sender<PlayerEvent>;
pub type EventReceiver = Receiver<PlayerEvent>;

pub type CommandSender = Sender<PlayerCommand>;
pub type CommandReceiver = Receiver<PlayerCommand>;

/// Events emitted by the playback engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The transport state has changed.
    StateUpdate { new_state: TransportState },
    /// The playback position advanced or was scrubbed.
    TimeUpdate {
        /// The current position, in seconds.
        position: f32,
        /// The duration of the current track, in seconds. 0 if unknown.
        duration: f32,
    },
    /// The queue moved to a different current track.
    TrackChanged {
        new_track: Option<Track>,
        index: usize,
    },
    /// The current track's media could not be loaded.
    /// This is non-fatal, the player degrades to a paused zero-duration state.
    LoadFailed { track: Track, error: String },
    /// The player volume changed.
    VolumeUpdate { volume: f32 },
}

/// Transport commands dispatched to the player.
///
/// External control surfaces (OS media keys, lock screens) are mirrored onto
/// this channel, they are an additional input, not a second source of truth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    Play,
    Pause,
    Toggle,
    Next,
    Previous,
    SeekTo(f32),
}

/// A cloneable handle that external control surfaces use to drive the player.
#[derive(Clone)]
pub struct MediaControls {
    sender: CommandSender,
}

impl MediaControls {
    pub fn new(sender: CommandSender) -> Self {
        Self { sender }
    }

    pub fn play(&self) {
        self.dispatch(PlayerCommand::Play)
    }

    pub fn pause(&self) {
        self.dispatch(PlayerCommand::Pause)
    }

    pub fn toggle(&self) {
        self.dispatch(PlayerCommand::Toggle)
    }

    pub fn next(&self) {
        self.dispatch(PlayerCommand::Next)
    }

    pub fn previous(&self) {
        self.dispatch(PlayerCommand::Previous)
    }

    pub fn seek_to(&self, position: f32) {
        self.dispatch(PlayerCommand::SeekTo(position))
    }

    fn dispatch(&self, command: PlayerCommand) {
        self.sender.send(command).expect("command is sent");
    }
}
