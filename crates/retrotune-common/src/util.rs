//! Millisecond/sample conversion.
//!
//! Both directions split the value into whole seconds plus a remainder so the
//! intermediate products stay small, and so converting back and forth drifts
//! by at most one frame.

/// Convert a millisecond offset into an interleaved sample count.
///
/// `channels` is the interleave factor (2 for stereo), so the result counts
/// individual `i16` values, not frames.
#[inline]
pub fn millis_to_samples(ms: u64, sample_rate: u32, channels: u16) -> u64 {
    let rate = u64::from(sample_rate);
    let secs = ms / 1000;
    let rem = ms - secs * 1000;
    secs.saturating_mul(rate)
        .saturating_add(rem * rate / 1000)
        .saturating_mul(u64::from(channels))
}

/// Convert an interleaved sample count into milliseconds.
///
/// Returns 0 for a zero sample rate or channel count.
#[inline]
pub fn samples_to_millis(samples: u64, sample_rate: u32, channels: u16) -> u64 {
    let per_sec = u64::from(sample_rate) * u64::from(channels);
    if per_sec == 0 {
        return 0;
    }
    let secs = samples / per_sec;
    let rem = samples - secs * per_sec;
    secs.saturating_mul(1000).saturating_add(rem * 1000 / per_sec)
}
