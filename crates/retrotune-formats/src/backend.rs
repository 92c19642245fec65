//! Decoder backend seams.
//!
//! Actual emulation lives in third-party libraries. Each library is bound
//! once, behind one of the traits here, and registered in [`Decoders`] so
//! [`read_file`](crate::read_file) can construct adapters for it.
//!
//! Backends report errors as plain strings, mirroring the C libraries they
//! usually wrap; the adapters map them onto [`FormatError`](crate::FormatError).

use std::collections::HashMap;
use std::fmt;

use retrotune_common::{DEFAULT_SAMPLE_RATE, LengthInfo, TrackMetadata};

use crate::probe::{ChipFormat, Container};

/// Result type used by backend implementations.
pub type BackendResult<T> = std::result::Result<T, String>;

/// Tag and length information reported by a backend for one track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackInfo {
    /// Declared lengths.
    pub lengths: LengthInfo,
    /// Emulated system, empty if the file does not say.
    pub system: String,
    /// Game title.
    pub game: String,
    /// Song title.
    pub song: String,
    /// Author/composer.
    pub author: String,
    /// Copyright line.
    pub copyright: String,
    /// Free-form comment.
    pub comment: String,
    /// Ripper credit.
    pub dumper: String,
}

impl TrackInfo {
    /// Convert into metadata, substituting `fallback_system` for an empty system tag.
    pub fn into_metadata(self, fallback_system: &str) -> TrackMetadata {
        let system = if self.system.is_empty() {
            fallback_system.to_string()
        } else {
            self.system
        };
        TrackMetadata {
            length_ms: None,
            system,
            game: self.game,
            song: self.song,
            author: self.author,
            copyright: self.copyright,
            comment: self.comment,
            dumper: self.dumper,
        }
        .with_length(self.lengths)
    }
}

/// Surface of a multi-format chip-emulator library.
///
/// Output is interleaved stereo `i16` at the sample rate the emulator was
/// opened with. Times are in milliseconds of track time.
pub trait Emulator: Send {
    /// Number of tracks in the loaded file.
    fn track_count(&self) -> usize;

    /// Tag and length information for a track.
    fn track_info(&self, track: usize) -> BackendResult<TrackInfo>;

    /// Start a track from the beginning. Clears any armed fade.
    fn start_track(&mut self, track: usize) -> BackendResult<()>;

    /// Fill `out` with the next block of samples.
    fn play(&mut self, out: &mut [i16]) -> BackendResult<()>;

    /// Current track time.
    fn tell(&self) -> u64;

    /// Seek to an absolute track time. May reset the fade state.
    fn seek(&mut self, ms: u64) -> BackendResult<()>;

    /// Arm a native fade-out. A zero `length_ms` disarms it.
    fn set_fade(&mut self, start_ms: u64, length_ms: u64);

    /// Whether the track has ended (silence detected or fade complete).
    fn track_ended(&self) -> bool;

    /// Playback speed multiplier, 1.0 being normal.
    fn set_tempo(&mut self, tempo: f64);

    /// Disable end-of-track silence detection.
    fn ignore_silence(&mut self, ignore: bool);

    /// Number of synthesis voices.
    fn voice_count(&self) -> usize {
        1
    }

    /// Name of a synthesis voice.
    fn voice_name(&self, _index: usize) -> Option<&str> {
        None
    }

    /// Mute or unmute a synthesis voice.
    fn mute_voice(&mut self, _index: usize, _mute: bool) {}
}

/// Surface of a GSF streaming decoder.
///
/// The decoder plays exactly one song per file and only knows how to render
/// forward or restart from the top.
pub trait GsfDecoder: Send {
    /// Output sample rate.
    fn sample_rate(&self) -> u32 {
        DEFAULT_SAMPLE_RATE
    }

    /// Render the next block of interleaved stereo samples.
    fn render(&mut self, out: &mut [i16]) -> BackendResult<()>;

    /// Restart emulation from the beginning of the song.
    fn restart(&mut self) -> BackendResult<()>;
}

/// Opens an [`Emulator`] for file data at a sample rate.
pub type EmulatorFactory =
    Box<dyn Fn(&[u8], u32) -> BackendResult<Box<dyn Emulator>> + Send + Sync>;

/// Opens a [`GsfDecoder`] for file data at a sample rate.
pub type GsfFactory = Box<dyn Fn(&[u8], u32) -> BackendResult<Box<dyn GsfDecoder>> + Send + Sync>;

/// Registry of available decoder backends.
///
/// # Example
///
/// ```ignore
/// let mut decoders = Decoders::new();
/// decoders.register_emulator(ChipFormat::Spc, |data, rate| gme::open(data, rate));
/// let adapter = retrotune_formats::read_file(&bytes, &decoders, 180_000)?;
/// ```
pub struct Decoders {
    emulators: HashMap<ChipFormat, EmulatorFactory>,
    gsf: Option<GsfFactory>,
    sample_rate: u32,
}

impl Decoders {
    /// Empty registry producing 44.1 kHz output.
    ///
    /// No decoder is registered: [`read_file`](crate::read_file) rejects
    /// every container with [`FormatError::LoadFile`](crate::FormatError::LoadFile)
    /// until the host registers its backends.
    pub fn new() -> Self {
        Self {
            emulators: HashMap::new(),
            gsf: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }

    /// Output sample rate requested from backends.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Register the emulator backend for one chip format.
    pub fn register_emulator<F>(&mut self, format: ChipFormat, factory: F)
    where
        F: Fn(&[u8], u32) -> BackendResult<Box<dyn Emulator>> + Send + Sync + 'static,
    {
        self.emulators.insert(format, Box::new(factory));
    }

    /// Builder-style [`register_emulator`](Self::register_emulator).
    pub fn with_emulator<F>(mut self, format: ChipFormat, factory: F) -> Self
    where
        F: Fn(&[u8], u32) -> BackendResult<Box<dyn Emulator>> + Send + Sync + 'static,
    {
        self.register_emulator(format, factory);
        self
    }

    /// Register the GSF backend.
    pub fn register_gsf<F>(&mut self, factory: F)
    where
        F: Fn(&[u8], u32) -> BackendResult<Box<dyn GsfDecoder>> + Send + Sync + 'static,
    {
        self.gsf = Some(Box::new(factory));
    }

    /// Builder-style [`register_gsf`](Self::register_gsf).
    pub fn with_gsf<F>(mut self, factory: F) -> Self
    where
        F: Fn(&[u8], u32) -> BackendResult<Box<dyn GsfDecoder>> + Send + Sync + 'static,
    {
        self.register_gsf(factory);
        self
    }

    /// Emulator factory for a chip format.
    pub fn emulator(&self, format: ChipFormat) -> Option<&EmulatorFactory> {
        self.emulators.get(&format)
    }

    /// GSF factory.
    pub fn gsf(&self) -> Option<&GsfFactory> {
        self.gsf.as_ref()
    }

    /// Whether a backend is registered for a container.
    pub fn supports(&self, container: Container) -> bool {
        match container {
            Container::Chip(format) => self.emulators.contains_key(&format),
            Container::Gsf => self.gsf.is_some(),
        }
    }
}

impl Default for Decoders {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Decoders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<&str> = self.emulators.keys().map(|format| format.name()).collect();
        formats.sort_unstable();
        f.debug_struct("Decoders")
            .field("emulators", &formats)
            .field("gsf", &self.gsf.is_some())
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}
