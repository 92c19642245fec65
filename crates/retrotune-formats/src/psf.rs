//! PSF container parsing (GSF and miniGSF).
//!
//! Layout:
//!
//! ```text
//! 0x00  "PSF"
//! 0x03  version byte (0x22 = GSF)
//! 0x04  reserved area size (u32 LE)
//! 0x08  compressed program size (u32 LE)
//! 0x0C  program CRC-32 (u32 LE)
//! 0x10  reserved area, then program
//!       optional "[TAG]" followed by key=value lines
//! ```

use retrotune_common::{LengthInfo, TrackMetadata};

use crate::error::{FormatError, Result};

/// Version byte identifying Game Boy Advance PSF files.
pub const PSF_VERSION_GSF: u8 = 0x22;

const HEADER_SIZE: usize = 16;
const TAG_MARKER: &[u8] = b"[TAG]";

/// Parsed PSF header and tag block. Sections are kept as offsets into the
/// original file data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsfFile {
    /// Console version byte.
    pub version: u8,
    /// Byte range of the reserved area.
    pub reserved: std::ops::Range<usize>,
    /// Byte range of the compressed program.
    pub program: std::ops::Range<usize>,
    /// CRC-32 of the compressed program, as declared.
    pub crc: u32,
    tags: Vec<(String, String)>,
}

impl PsfFile {
    /// Parse a PSF header and its optional tag block.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if !data.starts_with(b"PSF") {
            return Err(FormatError::FileType);
        }
        if data.len() < HEADER_SIZE {
            return Err(FormatError::Header(format!(
                "PSF header truncated: {} bytes",
                data.len()
            )));
        }

        let version = data[3];
        let reserved_size = read_u32(data, 4) as usize;
        let program_size = read_u32(data, 8) as usize;
        let crc = read_u32(data, 12);

        let reserved_end = HEADER_SIZE
            .checked_add(reserved_size)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                FormatError::Header(format!(
                    "reserved area of {reserved_size} bytes overruns the file"
                ))
            })?;
        let program_end = reserved_end
            .checked_add(program_size)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                FormatError::Header(format!(
                    "program section of {program_size} bytes overruns the file"
                ))
            })?;

        let tags = match data[program_end..].strip_prefix(TAG_MARKER) {
            Some(block) => parse_tags(block),
            None => Vec::new(),
        };

        Ok(Self {
            version,
            reserved: HEADER_SIZE..reserved_end,
            program: reserved_end..program_end,
            crc,
            tags,
        })
    }

    /// Whether this is a Game Boy Advance file.
    pub fn is_gsf(&self) -> bool {
        self.version == PSF_VERSION_GSF
    }

    /// Look up a tag by (case-insensitive) name.
    pub fn tag(&self, key: &str) -> Option<&str> {
        let key = key.to_ascii_lowercase();
        self.tags
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All tags in file order.
    pub fn tags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Library references (`_lib`, `_lib2`, ...) in load order.
    pub fn libraries(&self) -> Vec<&str> {
        let mut libs: Vec<&str> = self.tag("_lib").into_iter().collect();
        for n in 2.. {
            match self.tag(&format!("_lib{n}")) {
                Some(lib) => libs.push(lib),
                None => break,
            }
        }
        libs
    }

    /// Declared play length in milliseconds (`length` tag).
    pub fn length_ms(&self) -> Option<u64> {
        self.tag("length").and_then(parse_duration)
    }

    /// Declared fade length in milliseconds (`fade` tag).
    pub fn fade_ms(&self) -> Option<u64> {
        self.tag("fade").and_then(parse_duration)
    }

    /// Build track metadata from the tag block.
    pub fn metadata(&self) -> TrackMetadata {
        let text = |key: &str| self.tag(key).unwrap_or_default().to_string();
        let length = self.length_ms().map(LengthInfo::explicit).unwrap_or_default();
        TrackMetadata {
            system: "Game Boy Advance".to_string(),
            game: text("game"),
            song: text("title"),
            author: text("artist"),
            copyright: text("copyright"),
            comment: text("comment"),
            dumper: self
                .tag("gsfby")
                .or_else(|| self.tag("psfby"))
                .unwrap_or_default()
                .to_string(),
            ..Default::default()
        }
        .with_length(length)
    }
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// Parse `key=value` lines. Whitespace around keys and values is dropped,
/// keys are case-insensitive, and repeated keys are joined with newlines.
fn parse_tags(block: &[u8]) -> Vec<(String, String)> {
    let text = String::from_utf8_lossy(block);
    let mut tags: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        let value = value.trim();
        match tags.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => {
                existing.push('\n');
                existing.push_str(value);
            }
            None => tags.push((key, value.to_string())),
        }
    }
    tags
}

/// Parse a PSF duration (`[[h:]m:]s[.fff]`, `,` accepted as decimal mark)
/// into milliseconds. Durations that overflow `u64` are rejected.
pub fn parse_duration(text: &str) -> Option<u64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut parts: Vec<&str> = text.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    let seconds_part = parts.pop()?;
    let (whole, fraction) = match seconds_part.split_once(['.', ',']) {
        Some((whole, fraction)) => (whole, fraction),
        None => (seconds_part, ""),
    };

    let mut ms = parse_digits(whole)?.checked_mul(1000)?;
    if !fraction.is_empty() {
        if !fraction.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let digits: String = fraction.chars().chain("00".chars()).take(3).collect();
        ms = ms.checked_add(digits.parse::<u64>().ok()?)?;
    }

    let mut scale: u64 = 60_000;
    for unit in parts.iter().rev() {
        ms = ms.checked_add(parse_digits(unit)?.checked_mul(scale)?)?;
        scale = scale.saturating_mul(60);
    }
    Some(ms)
}

fn parse_digits(text: &str) -> Option<u64> {
    if text.is_empty() {
        return Some(0);
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
