//! Real-time output through rodio.
//!
//! The rodio mixer thread pulls samples from [`EngineSource`], which renders
//! whole blocks by locking the engine it was created for. The source holds a
//! weak reference, so each player has its own output context and dropping
//! the player ends the stream.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use retrotune_common::OUTPUT_CHANNELS;
use rodio::{OutputStream, Sink, Source};
use tracing::info;

use crate::device::OutputDevice;
use crate::engine::Engine;
use crate::error::{PlayerError, Result};
use crate::options::BLOCK_SAMPLES;

/// Source rendering engine blocks on demand.
pub(crate) struct EngineSource {
    engine: Weak<Mutex<Engine>>,
    sample_rate: u32,
    block: Vec<i16>,
    pos: usize,
}

impl EngineSource {
    pub(crate) fn new(engine: Weak<Mutex<Engine>>, sample_rate: u32) -> Self {
        Self {
            engine,
            sample_rate,
            block: vec![0; BLOCK_SAMPLES],
            pos: BLOCK_SAMPLES,
        }
    }
}

impl Iterator for EngineSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.pos >= self.block.len() {
            let engine = self.engine.upgrade()?;
            engine.lock().audio_callback(&mut self.block);
            self.pos = 0;
        }
        let sample = self.block[self.pos];
        self.pos += 1;
        Some(sample)
    }
}

impl Source for EngineSource {
    fn current_frame_len(&self) -> Option<usize> {
        let remaining = self.block.len().saturating_sub(self.pos);
        Some(if remaining == 0 { self.block.len() } else { remaining })
    }

    fn channels(&self) -> u16 {
        OUTPUT_CHANNELS
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// [`OutputDevice`] backed by a rodio sink.
pub(crate) struct SinkDevice {
    sink: Arc<Sink>,
}

impl OutputDevice for SinkDevice {
    fn resume(&mut self) {
        self.sink.play();
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }
}

/// Open the default output; the sink starts paused.
pub(crate) fn open_default_output() -> Result<(OutputStream, Arc<Sink>, SinkDevice)> {
    let (stream, handle) = OutputStream::try_default()
        .map_err(|e| PlayerError::Device(format!("failed to create audio stream: {e}")))?;
    let sink = Sink::try_new(&handle)
        .map_err(|e| PlayerError::Device(format!("failed to create audio sink: {e}")))?;
    sink.pause();
    let sink = Arc::new(sink);
    info!("opened default audio output");
    Ok((stream, Arc::clone(&sink), SinkDevice { sink }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_reports_stream_format() {
        let source = EngineSource::new(Weak::new(), 44_100);
        assert_eq!(source.channels(), 2);
        assert_eq!(source.sample_rate(), 44_100);
        assert_eq!(source.total_duration(), None);
    }

    #[test]
    fn source_ends_when_player_is_gone() {
        let mut source = EngineSource::new(Weak::new(), 44_100);
        assert_eq!(source.next(), None);
    }
}
