//! Error handling for format probing and adapters.

use thiserror::Error;

/// Convenient result alias for format operations.
pub type Result<T> = std::result::Result<T, FormatError>;

/// Errors raised while opening or playing a music container.
///
/// Backends report failures as plain strings; adapters wrap them in the
/// variant matching the operation that failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The data does not start with any recognised container signature.
    #[error("unrecognized file type")]
    FileType,
    /// The container was recognised but its header is malformed.
    #[error("invalid header: {0}")]
    Header(String),
    /// The decoder refused to open the file.
    #[error("failed to load file: {0}")]
    LoadFile(String),
    /// The decoder rejected the requested track.
    #[error("failed to load track: {0}")]
    LoadTrack(String),
    /// Decoding failed mid-playback.
    #[error("playback error: {0}")]
    Play(String),
    /// The decoder could not honour a seek.
    #[error("seek failed: {0}")]
    Seek(String),
}
