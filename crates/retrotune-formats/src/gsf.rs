//! Adapter over a GSF streaming decoder.

use retrotune_common::{OUTPUT_CHANNELS, TrackMetadata, millis_to_samples, samples_to_millis};
use tracing::debug;

use crate::adapter::FormatAdapter;
use crate::backend::{GsfDecoder, GsfFactory};
use crate::error::{FormatError, Result};
use crate::fade::{FadeEnvelope, FadeKind};
use crate::psf::PsfFile;

/// Interleaved samples decoded per step while fast-forwarding.
const SEEK_CHUNK: usize = 4096;

/// Adapter for Game Boy Advance GSF/miniGSF files.
///
/// The decoder only streams forward, so position is tracked here in output
/// samples. Seeking forward decodes and discards; seeking backward restarts
/// the song first. Both fade directions are applied with [`FadeEnvelope`]s.
pub struct GsfAdapter {
    decoder: Box<dyn GsfDecoder>,
    meta: TrackMetadata,
    started: bool,
    sample_rate: u32,
    default_duration_ms: u64,
    position: u64,
    fade_out: Option<FadeEnvelope>,
    fade_in_ms: u64,
    fade_in: Option<FadeEnvelope>,
    scratch: Vec<i16>,
}

impl GsfAdapter {
    /// Parse the tag block and open the decoder.
    pub fn open(data: &[u8], factory: &GsfFactory, sample_rate: u32, default_duration_ms: u64) -> Result<Self> {
        let psf = PsfFile::parse(data)?;
        if !psf.is_gsf() {
            return Err(FormatError::FileType);
        }
        let decoder = factory(data, sample_rate).map_err(FormatError::LoadFile)?;

        debug!(
            libraries = psf.libraries().len(),
            length_ms = ?psf.length_ms(),
            "opened GSF file"
        );
        Ok(Self::from_decoder(decoder, psf.metadata(), default_duration_ms))
    }

    /// Wrap an already opened decoder.
    pub fn from_decoder(decoder: Box<dyn GsfDecoder>, meta: TrackMetadata, default_duration_ms: u64) -> Self {
        Self {
            sample_rate: decoder.sample_rate(),
            decoder,
            meta,
            started: false,
            default_duration_ms,
            position: 0,
            fade_out: None,
            fade_in_ms: 0,
            fade_in: None,
            scratch: vec![0; SEEK_CHUNK],
        }
    }

    fn envelope(&self, kind: FadeKind, start_ms: u64, length_ms: u64) -> FadeEnvelope {
        FadeEnvelope::new(kind, start_ms, length_ms, self.sample_rate, OUTPUT_CHANNELS)
    }
}

impl FormatAdapter for GsfAdapter {
    fn format_name(&self) -> &str {
        "GSF"
    }

    fn start_track(&mut self, track: usize) -> Result<()> {
        if track != 0 {
            return Err(FormatError::LoadTrack(format!(
                "GSF files hold a single track, got index {track}"
            )));
        }
        self.decoder.restart().map_err(FormatError::LoadTrack)?;
        self.started = true;
        self.position = 0;
        self.fade_out = None;
        self.fade_in = (self.fade_in_ms > 0).then(|| self.envelope(FadeKind::In, 0, self.fade_in_ms));
        Ok(())
    }

    fn current_track(&self) -> Option<usize> {
        self.started.then_some(0)
    }

    fn play(&mut self, out: &mut [i16]) -> Result<()> {
        self.decoder.render(out).map_err(FormatError::Play)?;
        if let Some(fade) = &self.fade_in {
            fade.put_in(out, self.position);
        }
        if let Some(fade) = &self.fade_out {
            fade.put_in(out, self.position);
        }
        self.position = self.position.saturating_add(out.len() as u64);
        Ok(())
    }

    fn seek(&mut self, ms: u64) -> Result<()> {
        let target = millis_to_samples(ms, self.sample_rate, OUTPUT_CHANNELS);
        if target < self.position {
            self.decoder.restart().map_err(FormatError::Seek)?;
            self.position = 0;
        }
        while self.position < target {
            let n = (target - self.position).min(SEEK_CHUNK as u64) as usize;
            self.decoder
                .render(&mut self.scratch[..n])
                .map_err(FormatError::Seek)?;
            self.position += n as u64;
        }
        Ok(())
    }

    fn set_fade(&mut self, from_ms: u64, length_ms: u64) {
        self.fade_out = (length_ms > 0).then(|| self.envelope(FadeKind::Out, from_ms, length_ms));
    }

    fn set_fade_in(&mut self, length_ms: u64) {
        self.fade_in_ms = length_ms;
        self.fade_in = (length_ms > 0).then(|| self.envelope(FadeKind::In, 0, length_ms));
    }

    // The decoder runs at a fixed speed.
    fn set_tempo(&mut self, _tempo: f64) {}

    fn set_default_duration(&mut self, ms: u64) {
        self.default_duration_ms = ms;
    }

    fn default_duration(&self) -> u64 {
        self.default_duration_ms
    }

    fn position(&self) -> u64 {
        samples_to_millis(self.position, self.sample_rate, OUTPUT_CHANNELS)
    }

    fn track_count(&self) -> usize {
        1
    }

    fn track_metadata_at(&self, track: usize) -> Option<&TrackMetadata> {
        (track == 0).then_some(&self.meta)
    }

    fn track_ended(&self) -> bool {
        if !self.started {
            return false;
        }
        match &self.fade_out {
            Some(fade) => fade.is_finished(self.position),
            None => self.position() >= self.track_length(),
        }
    }

    fn channel_name(&self, index: usize) -> Option<&str> {
        (index == 0).then_some("GBA")
    }
}
