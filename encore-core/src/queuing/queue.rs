use parking_lot::Mutex;

use crate::Track;

/// The ordered list of tracks loaded into the playback engine, plus the
/// index of the current one.
///
/// The index is always within `[0, len - 1]` while the queue is non-empty.
/// An empty queue has no current track.
pub struct PlaybackQueue {
    state: Mutex<QueueState>,
}

#[derive(Debug, Default)]
struct QueueState {
    tracks: Vec<Track>,
    index: usize,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self {
            state: Default::default(),
        }
    }

    /// Replaces the queue wholesale, clamping the start index into bounds.
    pub fn set_queue(&self, tracks: Vec<Track>, start_index: usize) {
        let mut state = self.state.lock();

        state.index = clamp_index(start_index, tracks.len());
        state.tracks = tracks;
    }

    /// Moves to the given index, clamped into bounds.
    /// The queue contents are unchanged.
    pub fn play_index(&self, index: usize) {
        let mut state = self.state.lock();
        state.index = clamp_index(index, state.tracks.len());
    }

    /// Advances to the next track, wrapping around at the end.
    /// Does nothing on an empty queue.
    pub fn next(&self) -> Option<Track> {
        let mut state = self.state.lock();

        if !state.tracks.is_empty() {
            state.index = (state.index + 1) % state.tracks.len();
        }

        state.tracks.get(state.index).cloned()
    }

    /// Retreats to the previous track, wrapping around at the start.
    /// Does nothing on an empty queue.
    pub fn previous(&self) -> Option<Track> {
        let mut state = self.state.lock();

        if !state.tracks.is_empty() {
            let len = state.tracks.len();
            state.index = (state.index + len - 1) % len;
        }

        state.tracks.get(state.index).cloned()
    }

    /// The track at the current index, if any.
    pub fn current(&self) -> Option<Track> {
        let state = self.state.lock();
        state.tracks.get(state.index).cloned()
    }

    pub fn index(&self) -> usize {
        self.state.lock().index
    }

    pub fn tracks(&self) -> Vec<Track> {
        self.state.lock().tracks.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().tracks.is_empty()
    }
}

impl Default for PlaybackQueue {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        index.min(len - 1)
    }
}

#[cfg(test)]
mod test {
    use super::PlaybackQueue;
    use crate::Track;

    fn tracks(amount: usize) -> Vec<Track> {
        (0..amount).map(|i| Track::mock(&format!("t{}", i))).collect()
    }

    #[test]
    fn set_queue_clamps_start_index() {
        let queue = PlaybackQueue::new();

        queue.set_queue(tracks(3), 7);
        assert_eq!(queue.index(), 2);

        queue.set_queue(tracks(3), 1);
        assert_eq!(queue.index(), 1);

        queue.set_queue(vec![], 5);
        assert_eq!(queue.index(), 0);
        assert_eq!(queue.current(), None);
    }

    #[test]
    fn play_index_clamps_without_changing_contents() {
        let queue = PlaybackQueue::new();
        queue.set_queue(tracks(4), 0);

        queue.play_index(99);
        assert_eq!(queue.index(), 3);
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn wraparound_symmetry() {
        for len in 1..=5 {
            let queue = PlaybackQueue::new();
            queue.set_queue(tracks(len), 0);

            for start in 0..len {
                queue.play_index(start);

                queue.next();
                queue.previous();
                assert_eq!(queue.index(), start);

                queue.previous();
                queue.next();
                assert_eq!(queue.index(), start);
            }
        }
    }

    #[test]
    fn next_and_previous_wrap() {
        let queue = PlaybackQueue::new();
        queue.set_queue(tracks(3), 2);

        assert_eq!(queue.next().map(|t| t.key), Some("t0".to_string()));
        assert_eq!(queue.previous().map(|t| t.key), Some("t2".to_string()));
    }

    #[test]
    fn empty_queue_is_a_no_op() {
        let queue = PlaybackQueue::new();

        assert_eq!(queue.next(), None);
        assert_eq!(queue.previous(), None);
        assert_eq!(queue.current(), None);
        assert_eq!(queue.index(), 0);
    }
}
