//! Uniform playback surface over a loaded music container.

use retrotune_common::TrackMetadata;

use crate::error::Result;

/// Object-safe playback interface implemented by every container adapter.
///
/// The engine holds adapters as `Box<dyn FormatAdapter>` and never branches on
/// which variant is active. Output is interleaved stereo `i16`; times are in
/// milliseconds.
///
/// # Example
///
/// ```ignore
/// use retrotune_formats::{FormatAdapter, read_file};
///
/// let mut adapter = read_file(&bytes, &decoders, 180_000)?;
/// adapter.start_track(0)?;
/// adapter.set_fade(adapter.track_length(), 8_000);
///
/// let mut block = [0i16; 1024];
/// while !adapter.track_ended() {
///     adapter.play(&mut block)?;
///     // ... send block to audio device
/// }
/// ```
pub trait FormatAdapter: Send {
    /// Short format identifier, e.g. "SPC" or "GSF".
    fn format_name(&self) -> &str;

    /// Start track `track` from the beginning.
    ///
    /// Clears any armed fade-out; the caller re-arms it for the new track.
    fn start_track(&mut self, track: usize) -> Result<()>;

    /// Index of the track started last.
    fn current_track(&self) -> Option<usize>;

    /// Decode the next block into `out`.
    ///
    /// Safe to call at audio-thread cadence. On success the position advances
    /// by the number of samples produced.
    fn play(&mut self, out: &mut [i16]) -> Result<()>;

    /// Reposition to an absolute offset, re-applying any armed fade-out.
    fn seek(&mut self, ms: u64) -> Result<()>;

    /// Arm a fade-out of `length_ms` starting at `from_ms`. Zero length disarms.
    fn set_fade(&mut self, from_ms: u64, length_ms: u64);

    /// Arm a fade-in of `length_ms` from the start of every track. Zero disarms.
    fn set_fade_in(&mut self, length_ms: u64);

    /// Playback speed multiplier; zero, negative and non-finite values are ignored.
    fn set_tempo(&mut self, tempo: f64);

    /// Enable or disable end-of-track silence detection.
    fn set_silence_detection(&mut self, _enabled: bool) {}

    /// Length assumed for tracks that declare none.
    fn set_default_duration(&mut self, ms: u64);

    /// Length currently assumed for tracks that declare none.
    fn default_duration(&self) -> u64;

    /// Current playback offset.
    fn position(&self) -> u64;

    /// Number of tracks in the file.
    fn track_count(&self) -> usize;

    /// Metadata for any track of the file.
    fn track_metadata_at(&self, track: usize) -> Option<&TrackMetadata>;

    /// Metadata for the current track.
    fn track_metadata(&self) -> Option<&TrackMetadata> {
        self.current_track()
            .and_then(|track| self.track_metadata_at(track))
    }

    /// Playable length of the current track (declared, or the default duration).
    fn track_length(&self) -> u64 {
        self.track_metadata()
            .map(|meta| meta.effective_length(self.default_duration()))
            .unwrap_or(0)
    }

    /// Whether decoding has exhausted the track or the fade-out has elapsed.
    fn track_ended(&self) -> bool;

    /// Mute or unmute one synthesis channel. Ignored by single-channel formats.
    fn mute_channel(&mut self, _index: usize, _mute: bool) {}

    /// Number of synthesis channels.
    fn channel_count(&self) -> usize {
        1
    }

    /// Name of a synthesis channel.
    fn channel_name(&self, index: usize) -> Option<&str>;

    /// Whether the format exposes more than one channel.
    fn is_multi_channel(&self) -> bool {
        self.channel_count() > 1
    }
}
