//! Adapter over the shared chip-emulator backend.

use retrotune_common::{OUTPUT_CHANNELS, TrackMetadata, millis_to_samples};
use tracing::debug;

use crate::adapter::FormatAdapter;
use crate::backend::{Emulator, EmulatorFactory};
use crate::error::{FormatError, Result};
use crate::fade::{FadeEnvelope, FadeKind};
use crate::probe::ChipFormat;

/// Adapter for every format played by the chip-emulator library
/// (SPC, NSF, GBS, VGM, ...).
///
/// Fade-out is delegated to the emulator's native fade. Fade-in is not
/// something emulators offer, so it is applied here with a [`FadeEnvelope`].
pub struct ChipAdapter {
    format: ChipFormat,
    emu: Box<dyn Emulator>,
    tracks: Vec<TrackMetadata>,
    current: Option<usize>,
    sample_rate: u32,
    default_duration_ms: u64,
    /// Armed native fade as (from, length), re-applied after seeks.
    fade_out: Option<(u64, u64)>,
    fade_in_ms: u64,
    fade_in: Option<FadeEnvelope>,
    /// Output samples since track start, for the fade-in envelope.
    samples_out: u64,
}

impl ChipAdapter {
    /// Open file data with an emulator backend and cache every track's metadata.
    pub fn open(
        format: ChipFormat,
        data: &[u8],
        factory: &EmulatorFactory,
        sample_rate: u32,
        default_duration_ms: u64,
    ) -> Result<Self> {
        let emu = factory(data, sample_rate).map_err(FormatError::LoadFile)?;
        Self::from_emulator(format, emu, sample_rate, default_duration_ms)
    }

    /// Wrap an already opened emulator.
    pub fn from_emulator(
        format: ChipFormat,
        emu: Box<dyn Emulator>,
        sample_rate: u32,
        default_duration_ms: u64,
    ) -> Result<Self> {
        let count = emu.track_count();
        if count == 0 {
            return Err(FormatError::Header(format!(
                "{} file contains no tracks",
                format.name()
            )));
        }

        let tracks = (0..count)
            .map(|track| {
                emu.track_info(track)
                    .map(|info| info.into_metadata(format.system_name()))
                    .map_err(FormatError::LoadFile)
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(format = format.name(), tracks = count, "opened chip-emulator file");

        Ok(Self {
            format,
            emu,
            tracks,
            current: None,
            sample_rate,
            default_duration_ms,
            fade_out: None,
            fade_in_ms: 0,
            fade_in: None,
            samples_out: 0,
        })
    }

    /// Chip format of the loaded file.
    pub fn chip_format(&self) -> ChipFormat {
        self.format
    }

    fn arm_fade_in(&mut self) {
        self.fade_in = (self.fade_in_ms > 0).then(|| {
            FadeEnvelope::new(
                FadeKind::In,
                0,
                self.fade_in_ms,
                self.sample_rate,
                OUTPUT_CHANNELS,
            )
        });
    }
}

impl FormatAdapter for ChipAdapter {
    fn format_name(&self) -> &str {
        self.format.name()
    }

    fn start_track(&mut self, track: usize) -> Result<()> {
        if track >= self.tracks.len() {
            return Err(FormatError::LoadTrack(format!(
                "track {track} out of range ({} available)",
                self.tracks.len()
            )));
        }
        self.emu
            .start_track(track)
            .map_err(FormatError::LoadTrack)?;
        self.current = Some(track);
        self.fade_out = None;
        self.samples_out = 0;
        self.arm_fade_in();
        Ok(())
    }

    fn current_track(&self) -> Option<usize> {
        self.current
    }

    fn play(&mut self, out: &mut [i16]) -> Result<()> {
        self.emu.play(out).map_err(FormatError::Play)?;
        if let Some(fade) = &self.fade_in {
            fade.put_in(out, self.samples_out);
        }
        self.samples_out = self.samples_out.saturating_add(out.len() as u64);
        Ok(())
    }

    fn seek(&mut self, ms: u64) -> Result<()> {
        self.emu.seek(ms).map_err(FormatError::Seek)?;
        // Seeking restarts the track inside the emulator, dropping its fade.
        if let Some((from, length)) = self.fade_out {
            self.emu.set_fade(from, length);
        }
        self.samples_out = millis_to_samples(ms, self.sample_rate, OUTPUT_CHANNELS);
        Ok(())
    }

    fn set_fade(&mut self, from_ms: u64, length_ms: u64) {
        self.fade_out = (length_ms > 0).then_some((from_ms, length_ms));
        self.emu.set_fade(from_ms, length_ms);
    }

    fn set_fade_in(&mut self, length_ms: u64) {
        self.fade_in_ms = length_ms;
        self.arm_fade_in();
    }

    fn set_tempo(&mut self, tempo: f64) {
        if tempo.is_finite() && tempo > 0.0 {
            self.emu.set_tempo(tempo);
        }
    }

    fn set_silence_detection(&mut self, enabled: bool) {
        self.emu.ignore_silence(!enabled);
    }

    fn set_default_duration(&mut self, ms: u64) {
        self.default_duration_ms = ms;
    }

    fn default_duration(&self) -> u64 {
        self.default_duration_ms
    }

    fn position(&self) -> u64 {
        self.emu.tell()
    }

    fn track_count(&self) -> usize {
        self.tracks.len()
    }

    fn track_metadata_at(&self, track: usize) -> Option<&TrackMetadata> {
        self.tracks.get(track)
    }

    fn track_ended(&self) -> bool {
        self.emu.track_ended()
    }

    fn mute_channel(&mut self, index: usize, mute: bool) {
        if index < self.emu.voice_count() {
            self.emu.mute_voice(index, mute);
        }
    }

    fn channel_count(&self) -> usize {
        self.emu.voice_count().max(1)
    }

    fn channel_name(&self, index: usize) -> Option<&str> {
        self.emu.voice_name(index)
    }
}
