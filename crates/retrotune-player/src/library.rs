//! Loaded file cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use retrotune_common::{MetadataFields, TrackMetadata};
use retrotune_formats::{Decoders, read_file};
use tracing::debug;

use crate::error::{PlayerError, Result};

/// A file added to the player: its bytes plus what was learned when it
/// was validated.
#[derive(Debug, Clone)]
pub struct FileEntry {
    path: PathBuf,
    data: Arc<[u8]>,
    format: String,
    track_count: usize,
    metadata: TrackMetadata,
}

impl FileEntry {
    /// Read `path` and validate it as a playable file.
    ///
    /// The file is opened once with the registered decoders so unsupported
    /// or corrupt files are rejected here rather than at load time.
    pub fn read(path: &Path, decoders: &Decoders, default_duration_ms: u64) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| PlayerError::io(path, e))?;
        Self::from_bytes(path, data, decoders, default_duration_ms)
    }

    /// Validate bytes that were read elsewhere.
    pub fn from_bytes(
        path: impl Into<PathBuf>,
        data: impl Into<Arc<[u8]>>,
        decoders: &Decoders,
        default_duration_ms: u64,
    ) -> Result<Self> {
        let path = path.into();
        let data = data.into();
        let adapter = read_file(&data, decoders, default_duration_ms)?;
        let entry = Self {
            format: adapter.format_name().to_string(),
            track_count: adapter.track_count(),
            metadata: adapter.track_metadata_at(0).cloned().unwrap_or_default(),
            path,
            data,
        };
        debug!(path = %entry.path.display(), format = %entry.format, tracks = entry.track_count, "validated file");
        Ok(entry)
    }

    /// Where the file was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Container format name.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// Number of tracks.
    pub fn track_count(&self) -> usize {
        self.track_count
    }

    /// Metadata of the first track.
    pub fn metadata(&self) -> &TrackMetadata {
        &self.metadata
    }

    /// Line for playlist display: `author - title (mm:ss)`, falling back to
    /// the file name when the file has no title.
    pub fn display_string(&self) -> String {
        let duration = self
            .length_ms()
            .map(|ms| {
                let secs = (ms / 1000).min(5999);
                format!(" ({:02}:{:02})", secs / 60, secs % 60)
            })
            .unwrap_or_default();

        let title = if self.song().is_empty() { self.game() } else { self.song() };
        if title.is_empty() {
            let stem = self
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("???");
            format!("{stem}{duration}")
        } else if self.author().is_empty() {
            format!("{title}{duration}")
        } else {
            format!("{} - {title}{duration}", self.author())
        }
    }
}

/// A file reads as its first track.
impl MetadataFields for FileEntry {
    fn song(&self) -> &str {
        &self.metadata.song
    }

    fn game(&self) -> &str {
        &self.metadata.game
    }

    fn author(&self) -> &str {
        &self.metadata.author
    }

    fn system(&self) -> &str {
        &self.metadata.system
    }

    fn copyright(&self) -> &str {
        &self.metadata.copyright
    }

    fn comment(&self) -> &str {
        &self.metadata.comment
    }

    fn dumper(&self) -> &str {
        &self.metadata.dumper
    }

    fn length_ms(&self) -> Option<u64> {
        self.metadata.length_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrotune_formats::FormatError;
    use retrotune_formats::testing::{gsf_file, nsf_file, scripted_decoders};

    #[test]
    fn validates_and_caches_first_track() {
        let entry =
            FileEntry::from_bytes("music/smb.nsf", nsf_file(4), &scripted_decoders(95_000), 180_000)
                .unwrap();
        assert_eq!(entry.format(), "NSF");
        assert_eq!(entry.track_count(), 4);
        assert_eq!(entry.metadata().song, "Track 1");
        assert_eq!(entry.display_string(), "Test - Track 1 (01:35)");
        assert_eq!(entry.system(), "Nintendo NES");
    }

    #[test]
    fn untitled_file_displays_stem() {
        let entry =
            FileEntry::from_bytes("rips/intro.minigsf", gsf_file(""), &scripted_decoders(0), 180_000)
                .unwrap();
        assert_eq!(entry.display_string(), "intro");
    }

    #[test]
    fn rejects_unknown_bytes() {
        let err = FileEntry::from_bytes("notes.txt", b"hello".to_vec(), &scripted_decoders(0), 180_000)
            .unwrap_err();
        assert!(matches!(err, PlayerError::Format(FormatError::FileType)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = FileEntry::read(Path::new("/nonexistent/x.spc"), &scripted_decoders(0), 180_000)
            .unwrap_err();
        assert!(matches!(err, PlayerError::Io { .. }));
    }
}
