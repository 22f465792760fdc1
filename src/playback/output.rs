use std::{
    collections::VecDeque,
    io::Cursor,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{self, Sender},
    },
    thread,
    time::Duration,
};

use reqwest::Url;
use rodio::{Decoder, OutputStream, Sink, source::EmptyCallback};
use thiserror::Error;

use crate::{
    playback::{
        engine::{AudioEngine, TransportStatus},
        handle::EngineEvents,
    },
    warning,
};

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("no audio output available: {0}")]
    NoOutput(String),
    #[error("audio worker stopped before it was ready")]
    WorkerGone,
}

enum Job {
    Load(u64, Vec<Url>),
    Skip,
    Finished(u64),
    Shutdown,
}

/// Plays preview clips on the default output device.
///
/// The output stream cannot leave the thread that opened it, so a worker
/// thread owns it together with the pending items and downloads each clip
/// right before it plays. Transport calls go straight to the shared sink.
pub struct RodioEngine {
    sink: Arc<Sink>,
    jobs: Sender<Job>,
    loaded: Arc<AtomicBool>,
}

impl RodioEngine {
    pub fn new(events: EngineEvents) -> Result<Self, OutputError> {
        let (jobs, job_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let loaded = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            jobs: jobs.clone(),
            events,
            loaded: Arc::clone(&loaded),
            pending: VecDeque::new(),
            load: 0,
            clip: 0,
        };
        thread::Builder::new()
            .name("spotlite-audio".into())
            .spawn(move || {
                let (_stream, handle) = match OutputStream::try_default() {
                    Ok(output) => output,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let sink = match Sink::try_new(&handle) {
                    Ok(sink) => Arc::new(sink),
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                if ready_tx.send(Ok(Arc::clone(&sink))).is_err() {
                    return;
                }
                worker.run(&sink, job_rx);
            })
            .map_err(|e| OutputError::NoOutput(e.to_string()))?;

        let sink = ready_rx
            .recv()
            .map_err(|_| OutputError::WorkerGone)?
            .map_err(OutputError::NoOutput)?;

        Ok(Self { sink, jobs, loaded })
    }
}

impl AudioEngine for RodioEngine {
    fn load(&mut self, generation: u64, items: Vec<Url>) {
        self.loaded.store(!items.is_empty(), Ordering::SeqCst);
        let _ = self.jobs.send(Job::Load(generation, items));
    }

    fn play(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn advance_to_next_item(&mut self) {
        let _ = self.jobs.send(Job::Skip);
    }

    fn status(&self) -> TransportStatus {
        if !self.loaded.load(Ordering::SeqCst) {
            TransportStatus::Stopped
        } else if self.sink.is_paused() {
            TransportStatus::Paused
        } else {
            TransportStatus::Playing
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume);
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        let _ = self.jobs.send(Job::Shutdown);
    }
}

struct Worker {
    jobs: Sender<Job>,
    events: EngineEvents,
    loaded: Arc<AtomicBool>,
    pending: VecDeque<Url>,
    /// Generation of the load `pending` came from, echoed in every report.
    load: u64,
    /// Bumped whenever the current clip is replaced, so completion callbacks
    /// of clips that were skipped are ignored.
    clip: u64,
}

impl Worker {
    fn run(mut self, sink: &Sink, jobs: mpsc::Receiver<Job>) {
        let http = match reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
        {
            Ok(http) => http,
            Err(e) => {
                warning!("Audio output disabled: {}", e);
                return;
            }
        };

        for job in jobs {
            match job {
                Job::Load(generation, urls) => {
                    self.load = generation;
                    self.pending = urls.into();
                    self.start_next(sink, &http);
                }
                Job::Skip => self.start_next(sink, &http),
                Job::Finished(clip) if clip == self.clip => {
                    self.events.item_finished(self.load);
                    self.start_next(sink, &http);
                }
                Job::Finished(_) => {}
                Job::Shutdown => break,
            }
        }
    }

    fn start_next(&mut self, sink: &Sink, http: &reqwest::blocking::Client) {
        self.clip += 1;
        let resume = !sink.is_paused();
        // clear() also pauses the sink
        sink.clear();

        while let Some(url) = self.pending.pop_front() {
            match fetch(http, &url) {
                Ok(decoder) => {
                    let jobs = self.jobs.clone();
                    let clip = self.clip;
                    sink.append(decoder);
                    sink.append(EmptyCallback::<f32>::new(Box::new(move || {
                        let _ = jobs.send(Job::Finished(clip));
                    })));
                    if resume {
                        sink.play();
                    }
                    return;
                }
                Err(e) => {
                    warning!("Skipping preview {}: {}", url, e);
                    self.events.item_unplayable(self.load);
                }
            }
        }

        self.loaded.store(false, Ordering::SeqCst);
    }
}

fn fetch(
    http: &reqwest::blocking::Client,
    url: &Url,
) -> Result<Decoder<Cursor<Vec<u8>>>, Box<dyn std::error::Error + Send + Sync>> {
    let bytes = http.get(url.clone()).send()?.error_for_status()?.bytes()?;
    Ok(Decoder::new(Cursor::new(bytes.to_vec()))?)
}
