//! Transport state shared between the engine and its observers.

use serde::{Deserialize, Serialize};

/// Playback state of the engine's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing loaded, or rewound to the start.
    #[default]
    Stopped,
    /// The output device is pulling audio.
    Playing,
    /// A track is loaded but the output device is paused.
    Paused,
}

impl PlaybackState {
    /// Check if currently playing.
    pub fn is_playing(self) -> bool {
        self == PlaybackState::Playing
    }
}
