use crossbeam::atomic::AtomicCell;
use log::warn;

use crate::{
    AudioTransport, Config, EventSender, PlaybackQueue, PlayerCommand, PlayerEvent, Track,
    TransportError, TransportState, Transports,
};

/// The player drives the transport state machine for whatever track is at
/// the queue's current index.
///
/// Transitions are `Loading -> {Playing, Paused} -> Ended`. A natural end
/// advances the queue and starts a new loading cycle, so `Ended` is only
/// ever observed through events.
pub struct Player {
    queue: PlaybackQueue,
    transports: Transports,

    state: AtomicCell<TransportState>,
    /// The current position, in seconds.
    position: AtomicCell<f32>,
    /// The duration of the loaded track in seconds. None while loading.
    duration: AtomicCell<Option<f32>>,
    volume: AtomicCell<f32>,

    autoplay_on_change: bool,
    events: EventSender,
}

impl Player {
    pub fn new(config: &Config, transports: Transports, events: EventSender) -> Self {
        Self {
            queue: PlaybackQueue::new(),
            transports,
            state: AtomicCell::new(TransportState::Paused),
            position: AtomicCell::new(0.),
            duration: AtomicCell::new(None),
            volume: AtomicCell::new(config.default_volume.clamp(0., 1.)),
            autoplay_on_change: config.autoplay_on_change,
            events,
        }
    }

    /// Replaces the queue wholesale and loads the track at the start index.
    pub fn set_queue(&self, tracks: Vec<Track>, start_index: usize) {
        self.queue.set_queue(tracks, start_index);
        self.load_current();
    }

    /// Jumps to the given queue index, clamped into bounds.
    pub fn play_index(&self, index: usize) {
        self.queue.play_index(index);
        self.load_current();
    }

    pub fn next(&self) {
        self.queue.next();
        self.load_current();
    }

    pub fn previous(&self) {
        self.queue.previous();
        self.load_current();
    }

    /// Starts playback, if a track is loaded.
    pub fn play(&self) {
        if self.state.load() == TransportState::Paused {
            self.set_state_if_different(TransportState::Playing);
        }
    }

    /// Pauses playback.
    pub fn pause(&self) {
        if self.state.load() == TransportState::Playing {
            self.set_state_if_different(TransportState::Paused);
        }
    }

    /// Playing becomes Paused and vice versa. Any other state is unaffected.
    pub fn toggle(&self) {
        match self.state.load() {
            TransportState::Playing => self.pause(),
            TransportState::Paused => self.play(),
            _ => {}
        }
    }

    /// Moves the position to the given time, clamped into `[0, duration]`.
    /// Does not change the play/pause state.
    pub fn scrub(&self, position: f32) {
        let duration = self.duration.load().unwrap_or(0.);

        self.position.store(position.clamp(0., duration));
        self.emit_time();
    }

    pub fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0., 1.);

        self.volume.store(volume);
        self.emit(PlayerEvent::VolumeUpdate { volume });
    }

    /// Advances the position while playing. Called by the sampling thread,
    /// several times per second.
    pub fn tick(&self, delta: f32) {
        if self.state.load() != TransportState::Playing {
            return;
        }

        let duration = self.duration.load().unwrap_or(0.);
        let new_position = self.position.load() + delta;

        if duration > 0. && new_position >= duration {
            self.position.store(duration);
            self.set_state_if_different(TransportState::Ended);

            // A natural end advances the queue. A one-track queue wraps
            // around onto itself and reloads.
            self.queue.next();
            self.load_current();
            return;
        }

        self.position.store(new_position);
        self.emit_time();
    }

    /// Applies a command from an external control surface.
    pub fn handle(&self, command: PlayerCommand) {
        match command {
            PlayerCommand::Play => self.play(),
            PlayerCommand::Pause => self.pause(),
            PlayerCommand::Toggle => self.toggle(),
            PlayerCommand::Next => self.next(),
            PlayerCommand::Previous => self.previous(),
            PlayerCommand::SeekTo(position) => self.scrub(position),
        }
    }

    pub fn current(&self) -> Option<Track> {
        self.queue.current()
    }

    pub fn index(&self) -> usize {
        self.queue.index()
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.queue.tracks()
    }

    pub fn state(&self) -> TransportState {
        self.state.load()
    }

    pub fn position(&self) -> f32 {
        self.position.load()
    }

    /// The duration of the loaded track in seconds, 0 while unknown.
    pub fn duration(&self) -> f32 {
        self.duration.load().unwrap_or(0.)
    }

    pub fn volume(&self) -> f32 {
        self.volume.load()
    }

    /// Resets the transport for the track at the current index and loads it.
    fn load_current(&self) {
        let current = self.queue.current();
        let index = self.queue.index();

        self.position.store(0.);
        self.duration.store(None);
        self.emit(PlayerEvent::TrackChanged {
            new_track: current.clone(),
            index,
        });

        let Some(track) = current else {
            // An empty queue has nothing to load
            self.set_state_if_different(TransportState::Paused);
            return;
        };

        self.set_state_if_different(TransportState::Loading);

        let transport = self.transports.iter().find(|t| t.supports(&track.file));

        let result = match transport {
            Some(transport) => transport.load(&track.file),
            None => Err(TransportError::Unsupported(track.file.clone())),
        };

        match result {
            Ok(duration) => {
                self.duration.store(Some(duration.max(0.)));

                if self.autoplay_on_change {
                    self.set_state_if_different(TransportState::Playing);
                } else {
                    self.set_state_if_different(TransportState::Paused);
                }

                self.emit_time();
            }
            Err(error) => {
                warn!("Could not load {}: {}", track.file, error);

                self.duration.store(Some(0.));
                self.set_state_if_different(TransportState::Paused);
                self.emit(PlayerEvent::LoadFailed {
                    track,
                    error: error.to_string(),
                });
            }
        }
    }

    fn set_state_if_different(&self, state: TransportState) {
        if self.state.load() != state {
            self.state.store(state);
            self.emit(PlayerEvent::StateUpdate { new_state: state });
        }
    }

    fn emit_time(&self) {
        self.emit(PlayerEvent::TimeUpdate {
            position: self.position.load(),
            duration: self.duration(),
        });
    }

    fn emit(&self, event: PlayerEvent) {
        self.events.send(event).expect("event is sent");
    }
}

#[cfg(test)]
mod test {
    use crossbeam::channel::{unbounded, Receiver};

    use super::Player;
    use crate::{
        AudioTransport, BoxedTransport, Config, PlayerEvent, Track, TransportError, TransportState,
    };

    struct MockTransport {
        duration: f32,
        fail: bool,
    }

    impl MockTransport {
        fn ok(duration: f32) -> BoxedTransport {
            BoxedTransport::new(Self {
                duration,
                fail: false,
            })
        }

        fn failing() -> BoxedTransport {
            BoxedTransport::new(Self {
                duration: 0.,
                fail: true,
            })
        }
    }

    impl AudioTransport for MockTransport {
        fn supports(&self, _source: &str) -> bool {
            true
        }

        fn load(&self, source: &str) -> Result<f32, TransportError> {
            if self.fail {
                Err(TransportError::Load(source.to_string()))
            } else {
                Ok(self.duration)
            }
        }
    }

    fn player_with(transports: Vec<BoxedTransport>) -> (Player, Receiver<PlayerEvent>) {
        let (sender, receiver) = unbounded();
        (Player::new(&Config::default(), transports, sender), receiver)
    }

    fn tracks(amount: usize) -> Vec<Track> {
        (0..amount).map(|i| Track::mock(&format!("t{}", i))).collect()
    }

    #[test]
    fn loading_ends_paused_by_default() {
        let (player, _events) = player_with(vec![MockTransport::ok(180.)]);

        player.set_queue(tracks(2), 0);

        assert_eq!(player.state(), TransportState::Paused);
        assert_eq!(player.duration(), 180.);
        assert_eq!(player.position(), 0.);
    }

    #[test]
    fn autoplay_policy_transitions_to_playing() {
        let (sender, _receiver) = unbounded();
        let config = Config {
            autoplay_on_change: true,
            ..Default::default()
        };

        let player = Player::new(&config, vec![MockTransport::ok(10.)], sender);
        player.set_queue(tracks(1), 0);

        assert_eq!(player.state(), TransportState::Playing);
    }

    #[test]
    fn toggle_flips_between_playing_and_paused() {
        let (player, _events) = player_with(vec![MockTransport::ok(60.)]);
        player.set_queue(tracks(1), 0);

        player.toggle();
        assert_eq!(player.state(), TransportState::Playing);

        player.toggle();
        assert_eq!(player.state(), TransportState::Paused);
    }

    #[test]
    fn scrub_clamps_and_preserves_state() {
        let (player, _events) = player_with(vec![MockTransport::ok(100.)]);
        player.set_queue(tracks(1), 0);
        player.play();

        player.scrub(250.);
        assert_eq!(player.position(), 100.);
        assert_eq!(player.state(), TransportState::Playing);

        player.scrub(-5.);
        assert_eq!(player.position(), 0.);
    }

    #[test]
    fn natural_end_advances_the_queue() {
        let (player, events) = player_with(vec![MockTransport::ok(1.)]);
        player.set_queue(tracks(2), 0);
        player.play();

        // Sample past the end of the first track
        player.tick(0.5);
        player.tick(0.6);

        assert_eq!(player.index(), 1);
        assert_eq!(player.position(), 0.);

        let seen: Vec<_> = events.try_iter().collect();
        assert!(seen.contains(&PlayerEvent::StateUpdate {
            new_state: TransportState::Ended
        }));
    }

    #[test]
    fn one_track_queue_loops_onto_itself() {
        let (player, _events) = player_with(vec![MockTransport::ok(1.)]);
        player.set_queue(tracks(1), 0);
        player.play();

        player.tick(1.5);

        assert_eq!(player.index(), 0);
        assert_eq!(player.current().map(|t| t.key), Some("t0".to_string()));
        assert_eq!(player.position(), 0.);
    }

    #[test]
    fn load_failure_degrades_without_raising() {
        let (player, events) = player_with(vec![MockTransport::failing()]);
        player.set_queue(tracks(1), 0);

        assert_eq!(player.state(), TransportState::Paused);
        assert_eq!(player.duration(), 0.);

        let failed = events.try_iter().any(|e| matches!(e, PlayerEvent::LoadFailed { .. }));
        assert!(failed);

        // A zero duration track never reaches a natural end
        player.play();
        player.tick(5.);
        assert_eq!(player.index(), 0);
    }

    #[test]
    fn volume_is_clamped() {
        let (player, _events) = player_with(vec![MockTransport::ok(1.)]);

        player.set_volume(1.5);
        assert_eq!(player.volume(), 1.);

        player.set_volume(-0.2);
        assert_eq!(player.volume(), 0.);
    }

    #[test]
    fn unsupported_source_is_a_load_failure() {
        let (player, events) = player_with(vec![]);
        player.set_queue(tracks(1), 0);

        assert_eq!(player.state(), TransportState::Paused);
        assert!(events.try_iter().any(|e| matches!(e, PlayerEvent::LoadFailed { .. })));
    }
}
