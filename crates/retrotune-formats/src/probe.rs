//! Container detection by file signature.
//!
//! Only the fixed-size part of each header is checked here. Anything beyond
//! that (song tables, compressed sections, RAM images) is the decoder's job.

use std::fmt;

use crate::error::{FormatError, Result};
use crate::psf::PsfFile;

/// Formats handled by the shared chip-emulator backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipFormat {
    /// Super Nintendo SPC700 snapshot.
    Spc,
    /// NES Sound Format.
    Nsf,
    /// Extended NES Sound Format (chunked).
    Nsfe,
    /// Game Boy Sound System.
    Gbs,
    /// Video Game Music register log.
    Vgm,
    /// Genesis YM2612 register log.
    Gym,
    /// ZX Spectrum / Amstrad CPC Project AY.
    Ay,
    /// MSX KSS.
    Kss,
    /// PC Engine HES.
    Hes,
    /// Atari XL SAP.
    Sap,
}

impl ChipFormat {
    /// All chip formats, in probing order.
    pub const ALL: [ChipFormat; 10] = [
        ChipFormat::Spc,
        ChipFormat::Nsf,
        ChipFormat::Nsfe,
        ChipFormat::Gbs,
        ChipFormat::Vgm,
        ChipFormat::Gym,
        ChipFormat::Ay,
        ChipFormat::Kss,
        ChipFormat::Hes,
        ChipFormat::Sap,
    ];

    /// Short format identifier.
    pub fn name(self) -> &'static str {
        match self {
            ChipFormat::Spc => "SPC",
            ChipFormat::Nsf => "NSF",
            ChipFormat::Nsfe => "NSFE",
            ChipFormat::Gbs => "GBS",
            ChipFormat::Vgm => "VGM",
            ChipFormat::Gym => "GYM",
            ChipFormat::Ay => "AY",
            ChipFormat::Kss => "KSS",
            ChipFormat::Hes => "HES",
            ChipFormat::Sap => "SAP",
        }
    }

    /// Name of the emulated system, used when a file carries no system tag.
    pub fn system_name(self) -> &'static str {
        match self {
            ChipFormat::Spc => "Super Nintendo",
            ChipFormat::Nsf | ChipFormat::Nsfe => "Nintendo NES",
            ChipFormat::Gbs => "Game Boy",
            ChipFormat::Vgm => "Sega SMS/Genesis",
            ChipFormat::Gym => "Sega Genesis",
            ChipFormat::Ay => "ZX Spectrum",
            ChipFormat::Kss => "MSX",
            ChipFormat::Hes => "PC Engine",
            ChipFormat::Sap => "Atari XL",
        }
    }

    fn signatures(self) -> &'static [&'static [u8]] {
        match self {
            ChipFormat::Spc => &[b"SNES-SPC700 Sound File Data"],
            ChipFormat::Nsf => &[b"NESM\x1a"],
            ChipFormat::Nsfe => &[b"NSFE"],
            ChipFormat::Gbs => &[b"GBS"],
            ChipFormat::Vgm => &[b"Vgm "],
            ChipFormat::Gym => &[b"GYMX"],
            ChipFormat::Ay => &[b"ZXAYEMUL"],
            ChipFormat::Kss => &[b"KSCC", b"KSSX"],
            ChipFormat::Hes => &[b"HESM"],
            ChipFormat::Sap => &[b"SAP\r\n", b"SAP\n"],
        }
    }

    /// Minimum file size for a structurally complete header.
    fn min_size(self) -> usize {
        match self {
            // 0x100 header + 64 KiB RAM + DSP registers, without the extra RAM block
            ChipFormat::Spc => 0x10180,
            ChipFormat::Nsf => 0x80,
            ChipFormat::Nsfe => 8,
            ChipFormat::Gbs => 0x70,
            ChipFormat::Vgm => 0x40,
            ChipFormat::Gym => 0x1AC,
            ChipFormat::Ay => 0x14,
            ChipFormat::Kss => 0x10,
            ChipFormat::Hes => 0x20,
            ChipFormat::Sap => 5,
        }
    }

    fn matches(self, data: &[u8]) -> bool {
        self.signatures().iter().any(|sig| data.starts_with(sig))
    }

    fn validate(self, data: &[u8]) -> Result<()> {
        if data.len() < self.min_size() {
            return Err(FormatError::Header(format!(
                "{} header truncated: {} bytes, need at least {}",
                self.name(),
                data.len(),
                self.min_size()
            )));
        }
        match self {
            ChipFormat::Nsf | ChipFormat::Gbs => {
                let offset = if self == ChipFormat::Nsf { 0x06 } else { 0x04 };
                if data[offset] == 0 {
                    return Err(FormatError::Header(format!(
                        "{} declares no songs",
                        self.name()
                    )));
                }
            }
            ChipFormat::Kss if data.starts_with(b"KSSX") && data.len() < 0x20 => {
                return Err(FormatError::Header(
                    "KSSX extended header truncated".to_string(),
                ));
            }
            _ => {}
        }
        Ok(())
    }
}

impl fmt::Display for ChipFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A recognised container, naming the adapter variant that plays it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// Played by the shared chip-emulator backend.
    Chip(ChipFormat),
    /// Game Boy Advance GSF/miniGSF, played by the streaming backend.
    Gsf,
}

impl Container {
    /// Short format identifier.
    pub fn name(self) -> &'static str {
        match self {
            Container::Chip(format) => format.name(),
            Container::Gsf => "GSF",
        }
    }
}

/// Identify the container in `data` and validate its fixed header.
///
/// Returns [`FormatError::FileType`] for unknown signatures (including PSF
/// variants for other consoles) and [`FormatError::Header`] for recognised
/// but malformed headers.
pub fn detect(data: &[u8]) -> Result<Container> {
    if data.starts_with(b"PSF") {
        let psf = PsfFile::parse(data)?;
        return if psf.is_gsf() {
            Ok(Container::Gsf)
        } else {
            Err(FormatError::FileType)
        };
    }

    let format = ChipFormat::ALL
        .into_iter()
        .find(|format| format.matches(data))
        .ok_or(FormatError::FileType)?;
    format.validate(data)?;
    Ok(Container::Chip(format))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padded(prefix: &[u8], len: usize) -> Vec<u8> {
        let mut data = prefix.to_vec();
        data.resize(len, 0);
        data
    }

    #[test]
    fn detects_chip_formats() {
        let mut nsf = padded(b"NESM\x1a\x01", 0x80);
        nsf[0x06] = 3;
        assert_eq!(detect(&nsf), Ok(Container::Chip(ChipFormat::Nsf)));

        let spc = padded(b"SNES-SPC700 Sound File Data v0.30", 0x10200);
        assert_eq!(detect(&spc), Ok(Container::Chip(ChipFormat::Spc)));

        let mut gbs = padded(b"GBS\x01", 0x70);
        gbs[0x04] = 12;
        assert_eq!(detect(&gbs), Ok(Container::Chip(ChipFormat::Gbs)));

        let vgm = padded(b"Vgm ", 0x100);
        assert_eq!(detect(&vgm), Ok(Container::Chip(ChipFormat::Vgm)));

        let kss = padded(b"KSCC", 0x10);
        assert_eq!(detect(&kss), Ok(Container::Chip(ChipFormat::Kss)));
    }

    #[test]
    fn unknown_signature_is_file_type_error() {
        assert_eq!(detect(b"RIFF\0\0\0\0WAVE"), Err(FormatError::FileType));
        assert_eq!(detect(&[]), Err(FormatError::FileType));
    }

    #[test]
    fn truncated_header_is_header_error() {
        let spc = padded(b"SNES-SPC700 Sound File Data v0.30", 0x200);
        assert!(matches!(detect(&spc), Err(FormatError::Header(_))));

        let nsf = padded(b"NESM\x1a", 0x40);
        assert!(matches!(detect(&nsf), Err(FormatError::Header(_))));
    }

    #[test]
    fn zero_song_count_is_header_error() {
        let nsf = padded(b"NESM\x1a\x01", 0x80);
        let err = detect(&nsf).unwrap_err();
        assert_eq!(err, FormatError::Header("NSF declares no songs".to_string()));
    }

    #[test]
    fn psf_for_other_consoles_is_rejected() {
        // PSF1 (PlayStation) header with empty sections
        let psf1 = padded(b"PSF\x01", 16);
        assert_eq!(detect(&psf1), Err(FormatError::FileType));

        let gsf = padded(b"PSF\x22", 16);
        assert_eq!(detect(&gsf), Ok(Container::Gsf));
    }

    #[test]
    fn system_names_cover_every_format() {
        for format in ChipFormat::ALL {
            assert!(!format.system_name().is_empty());
            assert!(!format.name().is_empty());
        }
    }
}
