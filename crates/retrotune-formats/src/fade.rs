//! Exponential fade envelopes over interleaved 16-bit PCM.
//!
//! Gain is computed once per block of [`FADE_BLOCK_SIZE`] samples and halves
//! every `step` blocks, so a fade spans [`FADE_SHIFT`] halvings from unity
//! (`1 << 14`) down to `1 << 6`. The halving curve is approximated linearly
//! between powers of two, which keeps everything in integer arithmetic.

use retrotune_common::millis_to_samples;

/// Number of interleaved samples sharing one gain value.
pub const FADE_BLOCK_SIZE: usize = 512;

/// Number of gain halvings across a complete fade.
pub const FADE_SHIFT: u32 = 8;

const GAIN_SHIFT: u32 = 14;
const UNIT: i32 = 1 << GAIN_SHIFT;

/// Direction of a fade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeKind {
    /// Gain grows towards unity.
    In,
    /// Gain decays towards silence.
    Out,
}

/// A fade envelope anchored at an absolute sample offset.
///
/// The envelope is a pure function of sample position: it never changes once
/// built, so seeking only requires passing the new position to [`put_in`].
///
/// [`put_in`] is not idempotent. Applying it twice to the same buffer
/// compounds the attenuation; callers must apply it exactly once per block.
///
/// [`put_in`]: FadeEnvelope::put_in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeEnvelope {
    kind: FadeKind,
    start: u64,
    length: u64,
    step: u64,
}

impl FadeEnvelope {
    /// Build an envelope from millisecond parameters.
    ///
    /// `channels` is the interleave factor of the buffers passed to
    /// [`put_in`](Self::put_in).
    pub fn new(
        kind: FadeKind,
        start_ms: u64,
        length_ms: u64,
        sample_rate: u32,
        channels: u16,
    ) -> Self {
        let channels = channels.max(1);
        let divisor = (FADE_BLOCK_SIZE as u64 * u64::from(FADE_SHIFT) * 1000) / u64::from(channels);
        let step = (u64::from(sample_rate).saturating_mul(length_ms) / divisor).max(1);
        Self {
            kind,
            start: millis_to_samples(start_ms, sample_rate, channels),
            length: millis_to_samples(length_ms, sample_rate, channels),
            step,
        }
    }

    /// Fade direction.
    pub fn kind(&self) -> FadeKind {
        self.kind
    }

    /// Sample offset where the fade begins.
    pub fn start_sample(&self) -> u64 {
        self.start
    }

    /// Sample offset where the fade is complete.
    pub fn end_sample(&self) -> u64 {
        self.start.saturating_add(self.length)
    }

    /// Gain at an absolute sample offset, in units of `1 << 14`.
    pub fn gain_at(&self, position: u64) -> i32 {
        let elapsed_blocks = position.saturating_sub(self.start) / FADE_BLOCK_SIZE as u64;
        match self.kind {
            FadeKind::Out if position < self.start => UNIT,
            FadeKind::Out => int_log(elapsed_blocks, self.step),
            FadeKind::In => {
                let total_blocks = self.length / FADE_BLOCK_SIZE as u64;
                int_log(total_blocks.saturating_sub(elapsed_blocks), self.step)
            }
        }
    }

    /// Whether the envelope has run its course at `position`.
    ///
    /// A fade-out is finished once its gain drops below the last halving,
    /// or its window has elapsed; a fade-in once its window has elapsed.
    pub fn is_finished(&self, position: u64) -> bool {
        match self.kind {
            FadeKind::Out => {
                position >= self.end_sample() || self.gain_at(position) < (UNIT >> FADE_SHIFT)
            }
            FadeKind::In => position >= self.end_sample(),
        }
    }

    /// Scale `samples` in place. `elapsed` is the absolute sample offset of
    /// `samples[0]`.
    pub fn put_in(&self, samples: &mut [i16], elapsed: u64) {
        for (i, block) in samples.chunks_mut(FADE_BLOCK_SIZE).enumerate() {
            let gain = self.gain_at(elapsed.saturating_add((i * FADE_BLOCK_SIZE) as u64));
            if gain >= UNIT {
                continue;
            }
            for sample in block {
                *sample = ((i32::from(*sample) * gain) >> GAIN_SHIFT) as i16;
            }
        }
    }
}

/// `UNIT * 2^(-x / step)`, linear between powers of two.
fn int_log(x: u64, step: u64) -> i32 {
    let shift = x / step;
    if shift >= 31 {
        return 0;
    }
    let fraction = (u128::from(x - shift * step) * UNIT as u128 / u128::from(step)) as i32;
    ((UNIT - fraction) + (fraction >> 1)) >> shift
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_peaks(samples: &[i16]) -> Vec<i32> {
        samples
            .chunks(FADE_BLOCK_SIZE)
            .map(|block| block.iter().map(|s| i32::from(*s).abs()).max().unwrap_or(0))
            .collect()
    }

    #[test]
    fn fade_out_decays_monotonically() {
        let fade = FadeEnvelope::new(FadeKind::Out, 0, 1000, 44_100, 2);
        let mut buffer = vec![20_000i16; 88_200 + 4 * FADE_BLOCK_SIZE];
        fade.put_in(&mut buffer, 0);

        let peaks = block_peaks(&buffer);
        assert!(peaks.windows(2).all(|w| w[1] <= w[0]), "{peaks:?}");
        assert_eq!(peaks[0], 20_000);
        assert!(*peaks.last().unwrap() < 20_000 >> (FADE_SHIFT - 1));
    }

    #[test]
    fn fade_in_grows_monotonically() {
        let fade = FadeEnvelope::new(FadeKind::In, 0, 1000, 44_100, 2);
        assert_eq!(fade.kind(), FadeKind::In);
        let mut buffer = vec![-20_000i16; 88_200 + 4 * FADE_BLOCK_SIZE];
        fade.put_in(&mut buffer, 0);

        let peaks = block_peaks(&buffer);
        assert!(peaks.windows(2).all(|w| w[1] >= w[0]), "{peaks:?}");
        assert!(peaks[0] < 20_000 >> (FADE_SHIFT - 1));
        assert_eq!(*peaks.last().unwrap(), 20_000);
        // Negative input stays non-positive.
        assert!(buffer.iter().all(|s| *s <= 0));
    }

    #[test]
    fn samples_before_fade_out_start_are_untouched() {
        let fade = FadeEnvelope::new(FadeKind::Out, 2000, 500, 44_100, 2);
        let mut buffer = vec![1234i16; 4096];
        fade.put_in(&mut buffer, 0);
        assert!(buffer.iter().all(|s| *s == 1234));
    }

    #[test]
    fn elapsed_offset_selects_gain() {
        let fade = FadeEnvelope::new(FadeKind::Out, 0, 1000, 44_100, 2);
        let mut early = vec![10_000i16; FADE_BLOCK_SIZE];
        let mut late = early.clone();
        fade.put_in(&mut early, 0);
        fade.put_in(&mut late, 44_100);
        assert!(late[0] < early[0]);
    }

    #[test]
    fn zero_length_never_divides_by_zero() {
        let fade = FadeEnvelope::new(FadeKind::Out, 0, 0, 44_100, 2);
        assert_eq!(fade.end_sample(), 0);
        let mut buffer = vec![i16::MAX; 64 * FADE_BLOCK_SIZE];
        fade.put_in(&mut buffer, 0);
        assert_eq!(buffer[buffer.len() - 1], 0);
        assert!(fade.is_finished(0));

        let fade = FadeEnvelope::new(FadeKind::Out, 0, 1000, 44_100, 0);
        fade.put_in(&mut buffer, 0);
    }

    #[test]
    fn extreme_values_saturate_to_silence() {
        let fade = FadeEnvelope::new(FadeKind::Out, 0, 10, 44_100, 2);
        let mut buffer = vec![i16::MIN, i16::MAX];
        fade.put_in(&mut buffer, u64::MAX / 2);
        assert_eq!(buffer, vec![0, 0]);
    }

    #[test]
    fn fade_out_finishes_at_window_end() {
        let fade = FadeEnvelope::new(FadeKind::Out, 1000, 2000, 44_100, 2);
        assert_eq!(fade.start_sample(), 88_200);
        assert_eq!(fade.end_sample(), 88_200 * 3);
        assert!(!fade.is_finished(88_200));
        assert!(fade.is_finished(88_200 * 3));
    }
}
