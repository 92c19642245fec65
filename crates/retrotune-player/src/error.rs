//! Error handling for the playback engine.

use std::path::PathBuf;

use retrotune_formats::FormatError;
use thiserror::Error;

/// Convenient result alias for player operations.
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Errors returned by [`Player`](crate::Player) operations.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The file was read but could not be opened as music.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The audio output device could not be opened.
    #[error("audio device unavailable: {0}")]
    Device(String),

    /// A playlist position outside the playlist.
    #[error("index {index} out of range for playlist of {len}")]
    InvalidIndex {
        /// Requested position.
        index: usize,
        /// Playlist length.
        len: usize,
    },
}

impl PlayerError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// One failed entry of a multi-file load.
#[derive(Debug, Error)]
#[error("line {line}: {}: {error}", path.display())]
pub struct PlaylistLineError {
    /// 1-based line number in the playlist file, or position in the input list.
    pub line: usize,
    /// Path as resolved for loading.
    pub path: PathBuf,
    /// Why the entry was skipped.
    #[source]
    pub error: PlayerError,
}
