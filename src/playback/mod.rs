//! # Playback
//!
//! Preview playback is split in two. [`PlaybackController`] owns the intent:
//! the current track or queue and the cursor into it. An [`AudioEngine`]
//! renders whatever the controller loads into it.
//!
//! ```text
//! CLI / UI ── PlaybackHandle ── mpsc ──> PlaybackController ──> AudioEngine
//!                  ^                           │                    │
//!                  └──── watch<NowPlaying> ────┘    EngineEvents <──┘
//! ```
//!
//! ## Transport rules
//!
//! - Queues only hold tracks with a preview URL.
//! - Next on the last queued track wraps to the first one and keeps playing.
//! - Back always restarts the queue from its first track.
//! - Next or back on a lone track pauses it.
//! - Engine reports about an earlier load are dropped.
//! - When no item of a load could be played, the controller goes idle.
//!
//! The `audio` feature adds [`RodioEngine`], which plays clips on the default
//! output device.

pub mod controller;
pub mod engine;
pub mod handle;
#[cfg(feature = "audio")]
pub mod output;

pub use controller::{PlayQueue, PlaybackController, PlaybackError, PlaybackState};
pub use engine::{AudioEngine, TransportStatus};
pub use handle::{EngineEvents, PlaybackHandle, PlaybackStatus};
#[cfg(feature = "audio")]
pub use output::{OutputError, RodioEngine};
