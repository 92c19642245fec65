//! Retro game-music containers behind one playback interface.
//!
//! [`read_file`] probes raw file bytes, validates the container header and
//! returns a boxed [`FormatAdapter`] backed by whichever decoder is registered
//! for that container in [`Decoders`].
//!
//! # Supported containers
//!
//! | Container | Systems | Adapter |
//! |-----------|---------|---------|
//! | SPC, NSF/NSFE, GBS, VGM, GYM, AY, KSS, HES, SAP | SNES, NES, Game Boy, Sega, ZX Spectrum, MSX, PC Engine, Atari | [`ChipAdapter`] |
//! | GSF / miniGSF | Game Boy Advance | [`GsfAdapter`] |
//!
//! # Example
//!
//! ```ignore
//! use retrotune_formats::{Decoders, FormatAdapter, read_file};
//!
//! let decoders = Decoders::new(); // register backends here
//! let bytes = std::fs::read("castle.spc")?;
//! let mut adapter = read_file(&bytes, &decoders, 180_000)?;
//! adapter.start_track(0)?;
//! println!("{}", adapter.track_metadata().unwrap().display_title());
//! ```

#![warn(missing_docs)]

mod adapter;
mod backend;
mod chip;
mod error;
mod fade;
mod gsf;
mod probe;
mod psf;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use adapter::FormatAdapter;
pub use backend::{BackendResult, Decoders, Emulator, EmulatorFactory, GsfDecoder, GsfFactory, TrackInfo};
pub use chip::ChipAdapter;
pub use error::{FormatError, Result};
pub use fade::{FADE_BLOCK_SIZE, FADE_SHIFT, FadeEnvelope, FadeKind};
pub use gsf::GsfAdapter;
pub use probe::{ChipFormat, Container, detect};
pub use psf::{PSF_VERSION_GSF, PsfFile, parse_duration};

use tracing::debug;

/// Probe `data` and open it with the matching registered backend.
///
/// # Errors
///
/// - [`FormatError::FileType`] if no container signature matches
/// - [`FormatError::Header`] if the container header is malformed
/// - [`FormatError::LoadFile`] if no backend is registered for the container,
///   or the backend rejects the data
pub fn read_file(
    data: &[u8],
    decoders: &Decoders,
    default_duration_ms: u64,
) -> Result<Box<dyn FormatAdapter>> {
    let container = detect(data)?;
    debug!(container = container.name(), bytes = data.len(), "probed file");

    let rate = decoders.sample_rate();
    match container {
        Container::Chip(format) => {
            let factory = decoders
                .emulator(format)
                .ok_or_else(|| missing_backend(container))?;
            Ok(Box::new(ChipAdapter::open(format, data, factory, rate, default_duration_ms)?))
        }
        Container::Gsf => {
            let factory = decoders.gsf().ok_or_else(|| missing_backend(container))?;
            Ok(Box::new(GsfAdapter::open(data, factory, rate, default_duration_ms)?))
        }
    }
}

fn missing_backend(container: Container) -> FormatError {
    FormatError::LoadFile(format!("no decoder registered for {}", container.name()))
}
