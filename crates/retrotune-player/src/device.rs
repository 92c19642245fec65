//! Output device seam.

/// Control surface of the real-time output the engine renders into.
///
/// The device owns the audio thread and pulls blocks through
/// [`Player::audio_callback`](crate::Player::audio_callback); the engine only
/// starts and stops it.
pub trait OutputDevice: Send {
    /// Start or resume pulling audio.
    fn resume(&mut self);

    /// Stop pulling audio.
    fn pause(&mut self);

    /// Whether the device is currently paused.
    fn is_paused(&self) -> bool;
}

/// Device for hosts that drive [`Player::audio_callback`](crate::Player::audio_callback)
/// themselves (offline rendering, custom audio backends, tests).
///
/// It only records whether the engine wants audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualOutput {
    paused: bool,
}

impl ManualOutput {
    /// A paused device.
    pub fn new() -> Self {
        Self { paused: true }
    }
}

impl Default for ManualOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDevice for ManualOutput {
    fn resume(&mut self) {
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}
