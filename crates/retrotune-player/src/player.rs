//! Public player handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use retrotune_common::{PlaybackState, TrackMetadata};
use retrotune_formats::Decoders;
use tracing::warn;

use crate::device::OutputDevice;
use crate::engine::Engine;
use crate::error::{PlayerError, PlaylistLineError, Result};
use crate::events::PlayerEvents;
use crate::library::FileEntry;
use crate::options::PlayerOptions;
use crate::playlist::List;
use crate::session::{SessionHandle, SessionService};

/// Multi-format game-music player.
///
/// All state lives behind one lock that the audio thread also takes for
/// every block it renders, so a control call either fully precedes or fully
/// follows a block. Calls that open files (`load_file`, `stop`, `next`) hold
/// the lock while the decoder parses the file and can delay the audio
/// thread; file reads in `add_file` and session `OpenUri` requests happen
/// before the lock is taken.
///
/// With the `streaming` feature a player opened by
/// [`open_default`](Self::open_default) owns the rodio output stream, which
/// is neither `Send` nor `Sync`, so the player stays on the thread that
/// created it. Other threads drive it through a
/// [`session_handle`](Self::session_handle).
///
/// Positions passed to and reported by the player are playlist positions;
/// use [`file_order`](Self::file_order) and [`track_order`](Self::track_order)
/// to map them to file and track indices.
///
/// # Example
///
/// ```ignore
/// use retrotune_player::Player;
///
/// let player = Player::open_default(decoders)?;
/// player.add_file("castlevania.nsf")?;
/// player.load_file(0)?;
/// player.load_track(0)?;
/// player.start_or_resume()?;
/// ```
pub struct Player {
    engine: Arc<Mutex<Engine>>,
    decoders: Arc<Decoders>,
    #[cfg(feature = "streaming")]
    _stream: Option<rodio::OutputStream>,
}

impl Player {
    /// Create a player rendering into `device`.
    pub fn new(device: impl OutputDevice + 'static, decoders: Decoders) -> Self {
        let decoders = Arc::new(decoders);
        let engine = Engine::new(Box::new(device), Arc::clone(&decoders));
        Self {
            engine: Arc::new(Mutex::new(engine)),
            decoders,
            #[cfg(feature = "streaming")]
            _stream: None,
        }
    }

    /// Create a player on the system's default audio output.
    ///
    /// # Errors
    ///
    /// [`PlayerError::Device`] if no output device can be opened.
    #[cfg(feature = "streaming")]
    pub fn open_default(decoders: Decoders) -> Result<Self> {
        let (stream, sink, device) = crate::streaming::open_default_output()?;
        let sample_rate = decoders.sample_rate();
        let mut player = Self::new(device, decoders);
        sink.append(crate::streaming::EngineSource::new(
            Arc::downgrade(&player.engine),
            sample_rate,
        ));
        player._stream = Some(stream);
        Ok(player)
    }

    /// Render one block of interleaved stereo samples.
    ///
    /// Output devices call this from their audio thread. Hosts using
    /// [`ManualOutput`](crate::ManualOutput) call it themselves while
    /// [`is_playing`](Self::is_playing) is true.
    pub fn audio_callback(&self, out: &mut [i16]) {
        self.engine.lock().audio_callback(out);
    }

    /// Event callback registry.
    ///
    /// The returned guard holds the engine lock; drop it before calling any
    /// other player method.
    pub fn events(&self) -> MappedMutexGuard<'_, PlayerEvents> {
        MutexGuard::map(self.engine.lock(), |engine| &mut engine.events)
    }

    /// Attach a desktop media session and push the current state to it.
    pub fn set_session(&self, mut session: Box<dyn SessionService>) {
        session.attach(SessionHandle::new(&self.engine));
        let mut engine = self.engine.lock();
        engine.session = session;
        engine.sync_session();
    }

    /// Handle that routes desktop-session requests to this player.
    pub fn session_handle(&self) -> SessionHandle {
        SessionHandle::new(&self.engine)
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// Read, validate and append a file to the file playlist.
    ///
    /// Returns its playlist position. On error nothing changes.
    pub fn add_file(&self, path: impl AsRef<Path>) -> Result<usize> {
        let default_duration = self.engine.lock().options().default_duration_ms;
        let entry = FileEntry::read(path.as_ref(), &self.decoders, default_duration)?;
        Ok(self.engine.lock().add_entry(entry))
    }

    /// Add several files, collecting the failures instead of stopping at the first.
    pub fn add_files<P: AsRef<Path>>(&self, paths: impl IntoIterator<Item = P>) -> Vec<PlaylistLineError> {
        paths
            .into_iter()
            .enumerate()
            .filter_map(|(n, path)| {
                let path = path.as_ref();
                self.add_file(path).err().map(|error| PlaylistLineError {
                    line: n + 1,
                    path: path.to_path_buf(),
                    error,
                })
            })
            .collect()
    }

    /// Add every file listed in a playlist file.
    ///
    /// One path per line; blank lines and lines starting with `#` are
    /// skipped, relative paths are resolved against the playlist's
    /// directory. Entries that fail to load are reported and skipped.
    pub fn open_file_playlist(&self, path: impl AsRef<Path>) -> Result<Vec<PlaylistLineError>> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PlayerError::io(path, e))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));

        let mut failures = Vec::new();
        for (n, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let entry: PathBuf = base.join(line);
            if let Err(error) = self.add_file(&entry) {
                warn!(line = n + 1, path = %entry.display(), %error, "skipping playlist entry");
                failures.push(PlaylistLineError {
                    line: n + 1,
                    path: entry,
                    error,
                });
            }
        }
        Ok(failures)
    }

    /// Remove the file at a playlist position. Removing the loaded file
    /// unloads it and pauses output.
    pub fn remove_file(&self, position: usize) -> Result<()> {
        self.engine.lock().remove_file(position)
    }

    /// Number of files added.
    pub fn file_count(&self) -> usize {
        self.engine.lock().file_count()
    }

    /// Path of the file at a playlist position.
    pub fn file_path(&self, position: usize) -> Option<PathBuf> {
        self.engine
            .lock()
            .file_entry(position)
            .map(|entry| entry.path().to_path_buf())
    }

    /// First-track metadata of the file at a playlist position.
    pub fn file_metadata(&self, position: usize) -> Option<TrackMetadata> {
        self.engine
            .lock()
            .file_entry(position)
            .map(|entry| entry.metadata().clone())
    }

    /// Cached details of the file at a playlist position.
    pub fn file_entry(&self, position: usize) -> Option<FileEntry> {
        self.engine.lock().file_entry(position).cloned()
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Open the file at a playlist position. No track is started; on error
    /// the previously loaded file stays loaded.
    pub fn load_file(&self, position: usize) -> Result<()> {
        self.engine.lock().load_file(position)
    }

    /// Start the track at a track-playlist position.
    pub fn load_track(&self, position: usize) -> Result<()> {
        self.engine.lock().load_track(position)
    }

    /// Start output, loading the first track if none is.
    pub fn start_or_resume(&self) -> Result<()> {
        self.engine.lock().start_or_resume()
    }

    /// Pause output.
    pub fn pause(&self) {
        self.engine.lock().pause();
    }

    /// Toggle between playing and paused.
    pub fn play_pause(&self) -> Result<()> {
        self.engine.lock().play_pause()
    }

    /// Rewind to the first track of the first file and pause.
    pub fn stop(&self) -> Result<()> {
        self.engine.lock().stop()
    }

    /// Seek within the current track, clamped to [`length`](Self::length).
    pub fn seek(&self, ms: u64) -> Result<()> {
        self.engine.lock().seek(ms)
    }

    /// Seek relative to the current position.
    pub fn seek_relative(&self, offset_ms: i64) -> Result<()> {
        self.engine.lock().seek_relative(offset_ms)
    }

    /// Advance to the next track or file. Returns whether anything was loaded.
    pub fn next(&self) -> Result<bool> {
        self.engine.lock().next()
    }

    /// Step back to the previous track or file. Returns whether anything was loaded.
    pub fn prev(&self) -> Result<bool> {
        self.engine.lock().prev()
    }

    /// Shuffle a playlist; the current item keeps playing.
    pub fn shuffle(&self, list: List) {
        self.engine.lock().shuffle(list);
    }

    /// Swap an entry with its neighbour `offset` slots away. Returns its new position.
    pub fn move_item(&self, list: List, position: usize, offset: isize) -> usize {
        self.engine.lock().move_item(list, position, offset)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Whether no file is loaded.
    pub fn no_file_loaded(&self) -> bool {
        self.engine.lock().no_file_loaded()
    }

    /// Whether output is running.
    pub fn is_playing(&self) -> bool {
        self.engine.lock().is_playing()
    }

    /// Transport state.
    pub fn playback_state(&self) -> PlaybackState {
        self.engine.lock().playback_state()
    }

    /// Current position in milliseconds.
    pub fn position(&self) -> u64 {
        self.engine.lock().position()
    }

    /// Current track length plus the fade-out, in milliseconds.
    pub fn length(&self) -> u64 {
        self.engine.lock().length()
    }

    /// File-playlist position of the loaded file.
    pub fn current_file(&self) -> Option<usize> {
        self.engine.lock().current(List::Files)
    }

    /// Track-playlist position of the playing track.
    pub fn current_track(&self) -> Option<usize> {
        self.engine.lock().current(List::Tracks)
    }

    /// Number of tracks in the loaded file.
    pub fn track_count(&self) -> usize {
        self.engine
            .lock()
            .adapter()
            .map_or(0, |adapter| adapter.track_count())
    }

    /// Metadata of the track at a track-playlist position.
    pub fn track_metadata(&self, position: usize) -> Option<TrackMetadata> {
        let engine = self.engine.lock();
        let track = engine.track_index(position)?;
        engine.adapter()?.track_metadata_at(track).cloned()
    }

    /// Metadata of the playing track.
    pub fn current_metadata(&self) -> Option<TrackMetadata> {
        self.engine
            .lock()
            .adapter()
            .and_then(|adapter| adapter.track_metadata().cloned())
    }

    /// File indices in playlist order.
    pub fn file_order(&self) -> Vec<usize> {
        self.engine.lock().order(List::Files)
    }

    /// Track indices in playlist order.
    pub fn track_order(&self) -> Vec<usize> {
        self.engine.lock().order(List::Tracks)
    }

    /// Number of synthesis channels of the loaded file.
    pub fn channel_count(&self) -> usize {
        self.engine
            .lock()
            .adapter()
            .map_or(0, |adapter| adapter.channel_count())
    }

    /// Name of a synthesis channel.
    pub fn channel_name(&self, index: usize) -> Option<String> {
        self.engine
            .lock()
            .adapter()
            .and_then(|adapter| adapter.channel_name(index).map(str::to_string))
    }

    /// Whether the loaded file exposes several channels.
    pub fn is_multi_channel(&self) -> bool {
        self.engine
            .lock()
            .adapter()
            .is_some_and(|adapter| adapter.is_multi_channel())
    }

    /// Snapshot of the current settings.
    pub fn options(&self) -> PlayerOptions {
        self.engine.lock().options().clone()
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Mute or unmute a synthesis channel.
    pub fn mute_channel(&self, index: usize, mute: bool) {
        self.engine.lock().mute_channel(index, mute);
    }

    /// Fade-out length appended to every track. Zero disables it.
    pub fn set_fade(&self, ms: u64) {
        self.engine.lock().set_fade(ms);
    }

    /// Fade-in length at every track start. Zero disables it.
    pub fn set_fade_in(&self, ms: u64) {
        self.engine.lock().set_fade_in(ms);
    }

    /// Playback speed. Zero, negative and non-finite values are ignored.
    pub fn set_tempo(&self, tempo: f64) {
        self.engine.lock().set_tempo(tempo);
    }

    /// End tracks early on silence.
    pub fn set_silence_detection(&self, enabled: bool) {
        self.engine.lock().set_silence_detection(enabled);
    }

    /// Length assumed for tracks that declare none.
    pub fn set_default_duration(&self, ms: u64) {
        self.engine.lock().set_default_duration(ms);
    }

    /// Advance automatically when a track ends.
    pub fn set_autoplay(&self, autoplay: bool) {
        self.engine.lock().set_autoplay(autoplay);
    }

    /// Repeat the current track.
    pub fn set_track_repeat(&self, repeat: bool) {
        self.engine.lock().set_track_repeat(repeat);
    }

    /// Repeat the current file.
    pub fn set_file_repeat(&self, repeat: bool) {
        self.engine.lock().set_file_repeat(repeat);
    }

    /// Set the volume, clamped to [`MAX_VOLUME`](crate::MAX_VOLUME).
    pub fn set_volume(&self, volume: u8) {
        self.engine.lock().set_volume(volume);
    }

    /// Change the volume by `offset`, clamped to the valid range.
    pub fn set_volume_relative(&self, offset: i32) {
        self.engine.lock().set_volume_relative(offset);
    }

    /// Apply a settings snapshot through the individual setters.
    pub fn restore_options(&self, options: PlayerOptions) {
        self.engine.lock().restore_options(options);
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let engine = self.engine.lock();
        f.debug_struct("Player")
            .field("files", &engine.file_count())
            .field("current_file", &engine.current(List::Files))
            .field("current_track", &engine.current(List::Tracks))
            .field("state", &engine.playback_state())
            .finish()
    }
}
