//! Scripted decoder backends and synthetic files for tests.
//!
//! Enabled with the `test-util` feature. The scripted backends produce a
//! constant signal, keep time exactly like a real emulator would, and record
//! every control call in a shared log that tests can inspect after the
//! backend has been boxed away inside an adapter.

use std::sync::Arc;

use parking_lot::Mutex;
use retrotune_common::{DEFAULT_SAMPLE_RATE, LengthInfo, OUTPUT_CHANNELS, millis_to_samples, samples_to_millis};

use crate::backend::{BackendResult, Decoders, Emulator, GsfDecoder, TrackInfo};
use crate::probe::ChipFormat;

#[derive(Debug)]
struct EmulatorLogState {
    started: Vec<usize>,
    fades: Vec<(u64, u64)>,
    seeks: Vec<u64>,
    muted: Vec<(usize, bool)>,
    tempo: f64,
    ignore_silence: bool,
}

/// Shared record of the calls made on a [`ScriptedEmulator`].
#[derive(Debug, Clone)]
pub struct EmulatorLog(Arc<Mutex<EmulatorLogState>>);

impl Default for EmulatorLog {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(EmulatorLogState {
            started: Vec::new(),
            fades: Vec::new(),
            seeks: Vec::new(),
            muted: Vec::new(),
            tempo: 1.0,
            ignore_silence: false,
        })))
    }
}

impl EmulatorLog {
    /// Tracks started, in order.
    pub fn started(&self) -> Vec<usize> {
        self.0.lock().started.clone()
    }

    /// Fades armed, as (start, length).
    pub fn fades(&self) -> Vec<(u64, u64)> {
        self.0.lock().fades.clone()
    }

    /// Seek targets, in order.
    pub fn seeks(&self) -> Vec<u64> {
        self.0.lock().seeks.clone()
    }

    /// Mute calls, as (voice, muted).
    pub fn muted(&self) -> Vec<(usize, bool)> {
        self.0.lock().muted.clone()
    }

    /// Last tempo applied.
    pub fn tempo(&self) -> f64 {
        self.0.lock().tempo
    }

    /// Whether silence detection is currently disabled.
    pub fn ignores_silence(&self) -> bool {
        self.0.lock().ignore_silence
    }
}

/// Chip emulator producing a constant signal.
///
/// A track ends once its armed fade has elapsed, or, while silence detection
/// is active, once its declared length has been played.
#[derive(Debug)]
pub struct ScriptedEmulator {
    tracks: Vec<TrackInfo>,
    voices: Vec<String>,
    sample_rate: u32,
    current: Option<usize>,
    samples: u64,
    fade: Option<(u64, u64)>,
    ignore_silence: bool,
    fail_play: bool,
    log: EmulatorLog,
}

impl ScriptedEmulator {
    /// Value of every sample rendered.
    pub const AMPLITUDE: i16 = 8_000;

    /// Emulator serving the given tracks at 44.1 kHz.
    pub fn new(tracks: Vec<TrackInfo>) -> Self {
        Self {
            tracks,
            voices: ["Square 1", "Square 2", "Triangle", "Noise"]
                .map(String::from)
                .to_vec(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            current: None,
            samples: 0,
            fade: None,
            ignore_silence: false,
            fail_play: false,
            log: EmulatorLog::default(),
        }
    }

    /// Open synthetic file data, deriving the track count from the header.
    ///
    /// Track `n` is titled "Track n+1" and lasts `track_length_ms` (zero
    /// leaves the length undeclared).
    pub fn open(data: &[u8], sample_rate: u32, track_length_ms: u64) -> BackendResult<Self> {
        let count_at = |offset: usize| data.get(offset).map_or(1, |&songs| usize::from(songs));
        let count = if data.starts_with(b"NESM\x1a") {
            count_at(6)
        } else if data.starts_with(b"GBS") {
            count_at(4)
        } else {
            1
        };
        let mut emu = Self::with_track_count(count, track_length_ms);
        emu.sample_rate = sample_rate;
        Ok(emu)
    }

    /// Emulator with `count` tracks titled "Track 1", "Track 2", ...
    pub fn with_track_count(count: usize, track_length_ms: u64) -> Self {
        let tracks = (0..count)
            .map(|n| TrackInfo {
                lengths: LengthInfo::explicit(track_length_ms),
                game: "Scripted".to_string(),
                song: format!("Track {}", n + 1),
                author: "Test".to_string(),
                ..Default::default()
            })
            .collect();
        Self::new(tracks)
    }

    /// Make every [`play`](Emulator::play) call fail.
    pub fn failing(mut self) -> Self {
        self.fail_play = true;
        self
    }

    /// Handle on the call log.
    pub fn log(&self) -> EmulatorLog {
        self.log.clone()
    }
}

impl Emulator for ScriptedEmulator {
    fn track_count(&self) -> usize {
        self.tracks.len()
    }

    fn track_info(&self, track: usize) -> BackendResult<TrackInfo> {
        self.tracks
            .get(track)
            .cloned()
            .ok_or_else(|| format!("no track {track}"))
    }

    fn start_track(&mut self, track: usize) -> BackendResult<()> {
        if track >= self.tracks.len() {
            return Err(format!("no track {track}"));
        }
        self.current = Some(track);
        self.samples = 0;
        self.fade = None;
        self.log.0.lock().started.push(track);
        Ok(())
    }

    fn play(&mut self, out: &mut [i16]) -> BackendResult<()> {
        if self.fail_play {
            return Err("emulation halted".to_string());
        }
        out.fill(Self::AMPLITUDE);
        self.samples = self.samples.saturating_add(out.len() as u64);
        Ok(())
    }

    fn tell(&self) -> u64 {
        samples_to_millis(self.samples, self.sample_rate, OUTPUT_CHANNELS)
    }

    fn seek(&mut self, ms: u64) -> BackendResult<()> {
        self.samples = millis_to_samples(ms, self.sample_rate, OUTPUT_CHANNELS);
        self.fade = None;
        self.log.0.lock().seeks.push(ms);
        Ok(())
    }

    fn set_fade(&mut self, start_ms: u64, length_ms: u64) {
        self.fade = (length_ms > 0).then_some((start_ms, length_ms));
        self.log.0.lock().fades.push((start_ms, length_ms));
    }

    fn track_ended(&self) -> bool {
        let position = self.tell();
        if let Some((start, length)) = self.fade {
            return position >= start.saturating_add(length);
        }
        let declared = self
            .current
            .and_then(|track| self.tracks.get(track))
            .map(|info| info.lengths.length_ms)
            .unwrap_or(0);
        !self.ignore_silence && declared > 0 && position >= declared
    }

    fn set_tempo(&mut self, tempo: f64) {
        self.log.0.lock().tempo = tempo;
    }

    fn ignore_silence(&mut self, ignore: bool) {
        self.ignore_silence = ignore;
        self.log.0.lock().ignore_silence = ignore;
    }

    fn voice_count(&self) -> usize {
        self.voices.len()
    }

    fn voice_name(&self, index: usize) -> Option<&str> {
        self.voices.get(index).map(String::as_str)
    }

    fn mute_voice(&mut self, index: usize, mute: bool) {
        self.log.0.lock().muted.push((index, mute));
    }
}

#[derive(Debug, Default)]
struct GsfLogState {
    restarts: usize,
    rendered: u64,
}

/// Shared record of the calls made on a [`ScriptedGsf`].
#[derive(Debug, Clone, Default)]
pub struct GsfLog(Arc<Mutex<GsfLogState>>);

impl GsfLog {
    /// Number of restarts.
    pub fn restarts(&self) -> usize {
        self.0.lock().restarts
    }

    /// Interleaved samples rendered since creation.
    pub fn rendered(&self) -> u64 {
        self.0.lock().rendered
    }
}

/// GSF decoder producing a constant signal.
#[derive(Debug, Default)]
pub struct ScriptedGsf {
    fail_render: bool,
    log: GsfLog,
}

impl ScriptedGsf {
    /// Value of every sample rendered.
    pub const AMPLITUDE: i16 = 6_000;

    /// Working decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every render call fail.
    pub fn failing(mut self) -> Self {
        self.fail_render = true;
        self
    }

    /// Handle on the call log.
    pub fn log(&self) -> GsfLog {
        self.log.clone()
    }
}

impl GsfDecoder for ScriptedGsf {
    fn render(&mut self, out: &mut [i16]) -> BackendResult<()> {
        if self.fail_render {
            return Err("GBA core crashed".to_string());
        }
        out.fill(Self::AMPLITUDE);
        self.log.0.lock().rendered += out.len() as u64;
        Ok(())
    }

    fn restart(&mut self) -> BackendResult<()> {
        self.log.0.lock().restarts += 1;
        Ok(())
    }
}

/// Registry with scripted backends for every container.
pub fn scripted_decoders(track_length_ms: u64) -> Decoders {
    let mut decoders = Decoders::new();
    for format in ChipFormat::ALL {
        decoders.register_emulator(format, move |data, rate| {
            ScriptedEmulator::open(data, rate, track_length_ms)
                .map(|emu| Box::new(emu) as Box<dyn Emulator>)
        });
    }
    decoders.register_gsf(|_, _| Ok(Box::new(ScriptedGsf::new()) as Box<dyn GsfDecoder>));
    decoders
}

/// Minimal SPC image (one track).
pub fn spc_file() -> Vec<u8> {
    let mut data = b"SNES-SPC700 Sound File Data v0.30".to_vec();
    data.resize(0x10180, 0);
    data
}

/// Minimal NSF image declaring `songs` songs.
pub fn nsf_file(songs: u8) -> Vec<u8> {
    let mut data = b"NESM\x1a\x01".to_vec();
    data.resize(0x80, 0);
    data[6] = songs;
    data[7] = 1;
    data
}

/// Minimal GBS image declaring `songs` songs.
pub fn gbs_file(songs: u8) -> Vec<u8> {
    let mut data = b"GBS\x01".to_vec();
    data.resize(0x70, 0);
    data[4] = songs;
    data[5] = 1;
    data
}

/// Minimal GSF image carrying a `[TAG]` block.
pub fn gsf_file(tags: &str) -> Vec<u8> {
    let mut data = b"PSF\x22".to_vec();
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&4u32.to_le_bytes());
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&[0x78, 0x9c, 0x03, 0x00]);
    if !tags.is_empty() {
        data.extend_from_slice(b"[TAG]");
        data.extend_from_slice(tags.as_bytes());
    }
    data
}
