use reqwest::Url;

/// What the audio engine is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportStatus {
    /// Nothing is loaded.
    Stopped,
    Playing,
    Paused,
}

/// The audio output the playback controller drives.
///
/// The engine behaves like a queue player: [`AudioEngine::load`] replaces
/// whatever it had with `items` and positions it on the first one, and
/// [`AudioEngine::advance_to_next_item`] drops the current item.
///
/// Engines that move on by themselves report it through
/// [`crate::playback::EngineEvents`], tagged with the `generation` of the
/// load the item belongs to. Reports carrying an older generation are
/// ignored.
pub trait AudioEngine: Send {
    fn load(&mut self, generation: u64, items: Vec<Url>);
    fn play(&mut self);
    fn pause(&mut self);
    fn advance_to_next_item(&mut self);
    fn status(&self) -> TransportStatus;
    /// `volume` is within `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32);
}
