//! Desktop media-session integration (MPRIS-style).
//!
//! The engine pushes its state to a [`SessionService`] on every relevant
//! change, and the service drives the engine back through a
//! [`SessionHandle`], which routes [`SessionRequest`]s to the same transport
//! methods the UI uses.

use std::path::PathBuf;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use retrotune_common::{PlaybackState, TrackMetadata};

use crate::engine::Engine;
use crate::error::Result;
use crate::library::FileEntry;

/// Repeat mode as reported to the desktop session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopStatus {
    /// Playback advances normally.
    #[default]
    None,
    /// The current track repeats.
    Track,
    /// The current file repeats.
    Playlist,
}

impl LoopStatus {
    /// Loop status for a pair of repeat flags; track repeat takes precedence.
    pub fn from_flags(track_repeat: bool, file_repeat: bool) -> Self {
        if track_repeat {
            LoopStatus::Track
        } else if file_repeat {
            LoopStatus::Playlist
        } else {
            LoopStatus::None
        }
    }
}

/// Outbound surface of a desktop media session.
///
/// Every method is called with the engine lock held; implementations must
/// not dispatch requests from inside these calls.
pub trait SessionService: Send {
    /// Receive the handle used to send requests back to the engine.
    fn attach(&mut self, _handle: SessionHandle) {}

    /// Transport state changed.
    fn set_playback_status(&mut self, _status: PlaybackState) {}

    /// Playback position, in milliseconds.
    fn set_position(&mut self, _ms: u64) {}

    /// Volume, normalized to `0.0..=1.0`.
    fn set_volume(&mut self, _volume: f64) {}

    /// Playback rate (tempo).
    fn set_rate(&mut self, _rate: f64) {}

    /// Whether the file playlist is shuffled.
    fn set_shuffle(&mut self, _shuffle: bool) {}

    /// Repeat mode.
    fn set_loop_status(&mut self, _status: LoopStatus) {}

    /// Metadata of the track now playing.
    fn set_metadata(&mut self, _meta: &TrackMetadata) {}
}

/// Session that ignores every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSession;

impl SessionService for NoSession {}

/// Control request coming from the desktop session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionRequest {
    /// Start or resume.
    Play,
    /// Pause.
    Pause,
    /// Toggle between playing and paused.
    PlayPause,
    /// Rewind to the first file and pause.
    Stop,
    /// Next track.
    Next,
    /// Previous track.
    Previous,
    /// Seek relative to the current position, in milliseconds.
    Seek(i64),
    /// Seek to an absolute position, in milliseconds.
    SetPosition(u64),
    /// Change the tempo.
    SetRate(f64),
    /// Shuffle the file playlist (`true`) or restore its natural order.
    SetShuffle(bool),
    /// Change the repeat mode.
    SetLoopStatus(LoopStatus),
    /// Change the volume, normalized to `0.0..=1.0`.
    SetVolume(f64),
    /// Add a file (path or `file://` URI) and play it.
    OpenUri(String),
}

/// Cloneable handle that feeds [`SessionRequest`]s to a player.
///
/// The handle does not keep the player alive; once the player is dropped
/// every request is accepted and ignored.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    engine: Weak<Mutex<Engine>>,
}

impl SessionHandle {
    pub(crate) fn new(engine: &Arc<Mutex<Engine>>) -> Self {
        Self {
            engine: Arc::downgrade(engine),
        }
    }

    /// Apply a request to the player.
    ///
    /// [`SessionRequest::OpenUri`] reads and validates the file before the
    /// engine lock is taken, so the audio thread is not held up by disk I/O.
    pub fn dispatch(&self, request: SessionRequest) -> Result<()> {
        let Some(engine) = self.engine.upgrade() else {
            return Ok(());
        };
        if let SessionRequest::OpenUri(uri) = &request {
            let (decoders, default_duration) = {
                let engine = engine.lock();
                (engine.decoders(), engine.options().default_duration_ms)
            };
            let entry = FileEntry::read(&uri_path(uri), &decoders, default_duration)?;
            return engine.lock().play_entry(entry);
        }
        let mut engine = engine.lock();
        engine.handle_request(request)
    }

    /// Whether the player behind this handle still exists.
    pub fn is_connected(&self) -> bool {
        self.engine.strong_count() > 0
    }
}

/// Local path named by a `file://` URI or a plain path.
fn uri_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}
