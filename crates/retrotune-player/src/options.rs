//! Player settings.

use retrotune_common::DEFAULT_TRACK_DURATION_MS;
use serde::{Deserialize, Serialize};

/// Highest volume level; output is mixed at `volume / MAX_VOLUME`.
pub const MAX_VOLUME: u8 = 128;

/// Interleaved samples rendered per audio callback block.
pub const BLOCK_SAMPLES: usize = 1024;

/// Settings applied to every loaded file and track.
///
/// Missing fields fall back to their defaults when deserializing, so stored
/// snapshots stay loadable as fields are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerOptions {
    /// Fade-out appended after each track's length.
    pub fade_out_ms: u64,
    /// Fade-in applied at each track start.
    pub fade_in_ms: u64,
    /// Advance to the next track when one ends.
    pub autoplay: bool,
    /// Replay the current track instead of advancing.
    pub track_repeat: bool,
    /// Replay the current file instead of advancing past it.
    pub file_repeat: bool,
    /// Length assumed for tracks that declare none.
    pub default_duration_ms: u64,
    /// End tracks early once the decoder detects silence.
    pub silence_detection: bool,
    /// Playback speed multiplier.
    pub tempo: f64,
    /// Output level, `0..=MAX_VOLUME`.
    pub volume: u8,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            fade_out_ms: 0,
            fade_in_ms: 0,
            autoplay: false,
            track_repeat: false,
            file_repeat: false,
            default_duration_ms: DEFAULT_TRACK_DURATION_MS,
            silence_detection: false,
            tempo: 1.0,
            volume: MAX_VOLUME,
        }
    }
}

impl PlayerOptions {
    /// Volume as a fraction of full scale.
    pub fn normalized_volume(&self) -> f64 {
        f64::from(self.volume) / f64::from(MAX_VOLUME)
    }
}
