use reqwest::Url;
use thiserror::Error;

use crate::{
    playback::engine::{AudioEngine, TransportStatus},
    types::{NowPlaying, Track},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("cannot start playback of an empty track list")]
    EmptyQueue,
    #[error("start index {index} is out of range for {len} tracks")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("playback controller is no longer running")]
    ControllerGone,
}

/// Ordered tracks plus the position of the active one.
///
/// Only tracks with a preview URL ever make it into a queue, and `cursor` is
/// always a valid index into `items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayQueue {
    items: Vec<Track>,
    cursor: usize,
}

impl PlayQueue {
    pub fn items(&self) -> &[Track] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &Track {
        &self.items[self.cursor]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn urls_from(&self, start: usize) -> Vec<Url> {
        self.items[start..]
            .iter()
            .filter_map(Track::preview_audio_url)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    SingleTrack(Track),
    Queued(PlayQueue),
}

/// Keeps playback intent (what should play, in which order) separate from
/// the audio engine that renders it.
///
/// Every transition updates the engine first; [`Self::now_playing`] is
/// derived from the state afterwards, so it always names the engine's current
/// item. All calls must come from one owner, see
/// [`crate::playback::PlaybackHandle`].
pub struct PlaybackController<E> {
    engine: E,
    state: PlaybackState,
    loads: Loads,
}

/// Bookkeeping for the engine's current load.
#[derive(Debug, Default)]
struct Loads {
    generation: u64,
    // items of this load that could not be played since the last one that did
    unplayable_in_row: usize,
}

impl Loads {
    fn next(&mut self) -> u64 {
        self.generation += 1;
        self.unplayable_in_row = 0;
        self.generation
    }
}

impl<E: AudioEngine> PlaybackController<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: PlaybackState::Idle,
            loads: Loads::default(),
        }
    }

    /// Generation of the engine's current load. Engine reports tagged with
    /// anything else are stale.
    pub fn load_generation(&self) -> u64 {
        self.loads.generation
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn transport(&self) -> TransportStatus {
        self.engine.status()
    }

    /// Cursor of the active queue, `None` outside queue playback.
    pub fn cursor(&self) -> Option<usize> {
        match &self.state {
            PlaybackState::Queued(queue) => Some(queue.cursor),
            _ => None,
        }
    }

    /// Plays a lone track, dropping any queue.
    ///
    /// A track without a usable preview URL is ignored and the current state
    /// is kept; returns whether playback started.
    pub fn start_track(&mut self, track: Track) -> bool {
        let Some(url) = track.preview_audio_url() else {
            return false;
        };

        self.engine.load(self.loads.next(), vec![url]);
        self.engine.play();
        self.state = PlaybackState::SingleTrack(track);
        true
    }

    /// Plays `tracks` as a queue starting at `start_index`.
    ///
    /// Tracks without a preview URL are dropped before the queue is built.
    /// If `tracks[start_index]` is one of them, playback starts at the next
    /// playable track, or at the first one when none follows. With nothing
    /// playable at all the controller goes idle.
    ///
    /// An empty list or an out-of-range index is rejected and leaves the
    /// current state untouched.
    pub fn start_queue(&mut self, tracks: Vec<Track>, start_index: usize) -> Result<(), PlaybackError> {
        if tracks.is_empty() {
            return Err(PlaybackError::EmptyQueue);
        }
        if start_index >= tracks.len() {
            return Err(PlaybackError::IndexOutOfRange {
                index: start_index,
                len: tracks.len(),
            });
        }

        let mut cursor = None;
        let mut items = Vec::with_capacity(tracks.len());
        for (index, track) in tracks.into_iter().enumerate() {
            if track.preview_audio_url().is_none() {
                continue;
            }
            if cursor.is_none() && index >= start_index {
                cursor = Some(items.len());
            }
            items.push(track);
        }

        if items.is_empty() {
            self.engine.load(self.loads.next(), Vec::new());
            self.state = PlaybackState::Idle;
            return Ok(());
        }

        let queue = PlayQueue {
            items,
            cursor: cursor.unwrap_or(0),
        };
        self.engine.load(self.loads.next(), queue.urls_from(queue.cursor));
        self.engine.play();
        self.state = PlaybackState::Queued(queue);
        Ok(())
    }

    pub fn toggle_play_pause(&mut self) {
        match self.engine.status() {
            TransportStatus::Playing => self.engine.pause(),
            TransportStatus::Paused => self.engine.play(),
            TransportStatus::Stopped => {}
        }
    }

    /// Moves to the next queued track, wrapping to the first one after the
    /// last. A lone track has no next one, so it is only paused.
    pub fn advance_to_next(&mut self) {
        match &mut self.state {
            PlaybackState::Idle | PlaybackState::SingleTrack(_) => self.engine.pause(),
            PlaybackState::Queued(queue) => {
                if queue.cursor + 1 < queue.items.len() {
                    queue.cursor += 1;
                    self.engine.advance_to_next_item();
                } else {
                    queue.cursor = 0;
                    self.engine.load(self.loads.next(), queue.urls_from(0));
                }
                self.engine.play();
            }
        }
    }

    /// Restarts the queue from its first track. A lone track is only paused.
    pub fn return_to_previous(&mut self) {
        match &mut self.state {
            PlaybackState::Idle => {}
            PlaybackState::SingleTrack(_) => self.engine.pause(),
            PlaybackState::Queued(queue) => {
                queue.cursor = 0;
                self.engine.load(self.loads.next(), queue.urls_from(0));
                self.engine.play();
            }
        }
    }

    /// The engine finished an item of load `generation` on its own.
    ///
    /// Within a queue the cursor follows the engine. After the last item the
    /// queue is reloaded from the start and left paused. Returns `false` for a
    /// stale report, which changes nothing.
    pub fn handle_item_finished(&mut self, generation: u64) -> bool {
        if generation != self.loads.generation {
            return false;
        }
        self.loads.unplayable_in_row = 0;
        self.follow_engine();
        true
    }

    /// The engine could not play an item of load `generation` and moved past
    /// it.
    ///
    /// Handled like a finished item, except that once every item of the load
    /// failed in a row the engine is emptied and the controller goes idle
    /// instead of cycling through the same failures again.
    pub fn handle_item_unplayable(&mut self, generation: u64) -> bool {
        if generation != self.loads.generation {
            return false;
        }
        self.loads.unplayable_in_row += 1;

        let exhausted = match &self.state {
            PlaybackState::Idle => false,
            PlaybackState::SingleTrack(_) => true,
            PlaybackState::Queued(queue) => self.loads.unplayable_in_row >= queue.len(),
        };
        if exhausted {
            self.engine.load(self.loads.next(), Vec::new());
            self.state = PlaybackState::Idle;
        } else {
            self.follow_engine();
        }
        true
    }

    fn follow_engine(&mut self) {
        if let PlaybackState::Queued(queue) = &mut self.state {
            if queue.cursor + 1 < queue.items.len() {
                queue.cursor += 1;
            } else {
                queue.cursor = 0;
                self.engine.load(self.loads.next(), queue.urls_from(0));
                self.engine.pause();
            }
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.engine.set_volume(volume.clamp(0.0, 1.0));
    }

    pub fn current_track(&self) -> Option<&Track> {
        match &self.state {
            PlaybackState::Idle => None,
            PlaybackState::SingleTrack(track) => Some(track),
            PlaybackState::Queued(queue) => Some(queue.current()),
        }
    }

    /// Title, primary artist and artwork of the active track.
    pub fn now_playing(&self) -> Option<NowPlaying> {
        self.current_track().map(NowPlaying::of)
    }
}
