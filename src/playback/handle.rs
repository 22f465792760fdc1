use std::convert::Infallible;

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};

use crate::{
    playback::{
        controller::{PlaybackController, PlaybackError, PlaybackState},
        engine::{AudioEngine, TransportStatus},
    },
    types::{NowPlaying, Track},
};

/// Snapshot of the controller, answered by [`PlaybackHandle::status`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub transport: TransportStatus,
    pub cursor: Option<usize>,
    pub queue_len: usize,
    pub now_playing: Option<NowPlaying>,
}

enum Command {
    PlayTrack {
        track: Track,
        reply: oneshot::Sender<bool>,
    },
    PlayQueue {
        tracks: Vec<Track>,
        start_index: usize,
        reply: oneshot::Sender<Result<(), PlaybackError>>,
    },
    TogglePlayPause(oneshot::Sender<()>),
    Next(oneshot::Sender<()>),
    Previous(oneshot::Sender<()>),
    SetVolume(f32, oneshot::Sender<()>),
    // Sent by the engine, nobody waits for these.
    ItemFinished(u64),
    ItemUnplayable(u64),
    Status(oneshot::Sender<PlaybackStatus>),
}

/// Lets an engine report that it moved past an item on its own.
///
/// Every report carries the generation the item was loaded with. Holds only a
/// weak reference to the command channel, so an engine keeping one does not
/// keep its own controller alive. Safe to call from any thread, including
/// ones outside the runtime.
#[derive(Clone)]
pub struct EngineEvents {
    tx: mpsc::WeakUnboundedSender<Command>,
}

impl EngineEvents {
    pub fn item_finished(&self, generation: u64) {
        self.send(Command::ItemFinished(generation));
    }

    /// The item could not be fetched or decoded and was skipped.
    pub fn item_unplayable(&self, generation: u64) {
        self.send(Command::ItemUnplayable(generation));
    }

    fn send(&self, command: Command) {
        if let Some(tx) = self.tx.upgrade() {
            let _ = tx.send(command);
        }
    }
}

/// Cloneable front of a [`PlaybackController`] running on its own task.
///
/// Commands are applied one at a time in the order they arrive, so the
/// controller never sees concurrent mutation. Every awaited call returns once
/// its command has been applied, and the now-playing projection published on
/// [`PlaybackHandle::now_playing`] is updated before that.
#[derive(Clone)]
pub struct PlaybackHandle {
    tx: mpsc::UnboundedSender<Command>,
    now_playing: watch::Receiver<Option<NowPlaying>>,
}

impl PlaybackHandle {
    pub fn spawn<E>(engine: E) -> (Self, JoinHandle<()>)
    where
        E: AudioEngine + 'static,
    {
        match Self::spawn_with(|_| Ok::<_, Infallible>(engine)) {
            Ok(spawned) => spawned,
            Err(never) => match never {},
        }
    }

    /// Like [`Self::spawn`], but builds the engine from the [`EngineEvents`]
    /// it reports finished items through. Nothing is spawned if `build`
    /// fails.
    pub fn spawn_with<E, F, X>(build: F) -> Result<(Self, JoinHandle<()>), X>
    where
        E: AudioEngine + 'static,
        F: FnOnce(EngineEvents) -> Result<E, X>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let (np_tx, np_rx) = watch::channel(None);
        let engine = build(EngineEvents {
            tx: tx.downgrade(),
        })?;
        let task = tokio::spawn(run(PlaybackController::new(engine), rx, np_tx));

        let handle = Self {
            tx,
            now_playing: np_rx,
        };
        Ok((handle, task))
    }

    /// Receiver of the now-playing projection, `None` while idle.
    pub fn now_playing(&self) -> watch::Receiver<Option<NowPlaying>> {
        self.now_playing.clone()
    }

    pub fn events(&self) -> EngineEvents {
        EngineEvents {
            tx: self.tx.downgrade(),
        }
    }

    /// Returns `false` when the track has no preview and nothing changed.
    pub async fn play_track(&self, track: Track) -> Result<bool, PlaybackError> {
        self.request(|reply| Command::PlayTrack { track, reply })
            .await
    }

    pub async fn play_queue(&self, tracks: Vec<Track>, start_index: usize) -> Result<(), PlaybackError> {
        self.request(|reply| Command::PlayQueue {
            tracks,
            start_index,
            reply,
        })
        .await?
    }

    pub async fn toggle_play_pause(&self) -> Result<(), PlaybackError> {
        self.request(Command::TogglePlayPause).await
    }

    pub async fn next(&self) -> Result<(), PlaybackError> {
        self.request(Command::Next).await
    }

    pub async fn previous(&self) -> Result<(), PlaybackError> {
        self.request(Command::Previous).await
    }

    pub async fn set_volume(&self, volume: f32) -> Result<(), PlaybackError> {
        self.request(|reply| Command::SetVolume(volume, reply))
            .await
    }

    pub async fn status(&self) -> Result<PlaybackStatus, PlaybackError> {
        self.request(Command::Status).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, PlaybackError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .map_err(|_| PlaybackError::ControllerGone)?;
        rx.await.map_err(|_| PlaybackError::ControllerGone)
    }
}

async fn run<E: AudioEngine>(
    mut controller: PlaybackController<E>,
    mut rx: mpsc::UnboundedReceiver<Command>,
    now_playing: watch::Sender<Option<NowPlaying>>,
) {
    while let Some(command) = rx.recv().await {
        // The projection is published before the caller is released.
        match command {
            Command::PlayTrack { track, reply } => {
                let started = controller.start_track(track);
                publish(&controller, &now_playing);
                let _ = reply.send(started);
            }
            Command::PlayQueue {
                tracks,
                start_index,
                reply,
            } => {
                let res = controller.start_queue(tracks, start_index);
                publish(&controller, &now_playing);
                let _ = reply.send(res);
            }
            Command::TogglePlayPause(reply) => {
                controller.toggle_play_pause();
                let _ = reply.send(());
            }
            Command::Next(reply) => {
                controller.advance_to_next();
                publish(&controller, &now_playing);
                let _ = reply.send(());
            }
            Command::Previous(reply) => {
                controller.return_to_previous();
                publish(&controller, &now_playing);
                let _ = reply.send(());
            }
            Command::SetVolume(volume, reply) => {
                controller.set_volume(volume);
                let _ = reply.send(());
            }
            Command::ItemFinished(generation) => {
                if controller.handle_item_finished(generation) {
                    publish(&controller, &now_playing);
                }
            }
            Command::ItemUnplayable(generation) => {
                if controller.handle_item_unplayable(generation) {
                    publish(&controller, &now_playing);
                }
            }
            Command::Status(reply) => {
                let _ = reply.send(PlaybackStatus {
                    transport: controller.transport(),
                    cursor: controller.cursor(),
                    queue_len: queue_len(&controller),
                    now_playing: controller.now_playing(),
                });
            }
        }
    }
}

fn publish<E: AudioEngine>(
    controller: &PlaybackController<E>,
    now_playing: &watch::Sender<Option<NowPlaying>>,
) {
    let next = controller.now_playing();
    now_playing.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}

fn queue_len<E: AudioEngine>(controller: &PlaybackController<E>) -> usize {
    match controller.state() {
        PlaybackState::Queued(queue) => queue.len(),
        PlaybackState::SingleTrack(_) => 1,
        PlaybackState::Idle => 0,
    }
}
