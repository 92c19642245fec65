//! Common types shared by the retrotune playback crates.
//!
//! This crate holds the pieces that both the format adapters and the
//! playback engine need to agree on:
//!
//! - [`TrackMetadata`] - Per-track tag record (length, system, game, song, ...)
//! - [`MetadataFields`] - Accessor trait over metadata records
//! - [`LengthInfo`] / [`resolve_length`] - Unknown-length policy
//! - [`millis_to_samples`] / [`samples_to_millis`] - Canonical time conversion
//! - [`PlaybackState`] - Transport state reported to observers
//!
//! # Example
//!
//! ```
//! use retrotune_common::{millis_to_samples, samples_to_millis, DEFAULT_SAMPLE_RATE};
//!
//! let samples = millis_to_samples(1_500, DEFAULT_SAMPLE_RATE, 2);
//! assert_eq!(samples, 132_300);
//! assert_eq!(samples_to_millis(samples, DEFAULT_SAMPLE_RATE, 2), 1_500);
//! ```

#![warn(missing_docs)]

mod metadata;
mod playback;
mod util;

pub use metadata::{LengthInfo, MetadataFields, TrackMetadata, resolve_length};
pub use playback::PlaybackState;
pub use util::{millis_to_samples, samples_to_millis};

// ============================================================================
// Common Constants
// ============================================================================

/// Output sample rate used by every adapter (44.1 kHz CD quality).
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Number of interleaved output channels (stereo).
pub const OUTPUT_CHANNELS: u16 = 2;

/// Duration assumed for tracks that declare neither a length nor a loop (3 minutes).
pub const DEFAULT_TRACK_DURATION_MS: u64 = 180_000;
