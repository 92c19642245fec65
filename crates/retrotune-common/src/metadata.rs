//! Track metadata and the unknown-length policy.
//!
//! Retro music containers are inconsistent about durations: SPC and GSF files
//! carry an explicit length tag, NSF and GBS rarely declare anything, and VGM
//! files describe an intro followed by a loop. [`resolve_length`] turns all of
//! these into one playable length.

use serde::{Deserialize, Serialize};

/// Accessor trait over per-track metadata records.
pub trait MetadataFields {
    /// Get the song title.
    fn song(&self) -> &str;

    /// Get the game (or album) the song belongs to.
    fn game(&self) -> &str;

    /// Get the author/composer name.
    fn author(&self) -> &str;

    /// Get the emulated system name.
    ///
    /// Examples: "Super Nintendo", "Nintendo NES", "Game Boy Advance"
    fn system(&self) -> &str;

    /// Get the copyright line.
    ///
    /// Returns an empty string if the file carries none.
    fn copyright(&self) -> &str {
        ""
    }

    /// Get additional comments.
    fn comment(&self) -> &str {
        ""
    }

    /// Get the name of whoever ripped the file.
    fn dumper(&self) -> &str {
        ""
    }

    /// Get the declared track length in milliseconds, if known.
    fn length_ms(&self) -> Option<u64> {
        None
    }
}

/// Length information as declared by a container, all in milliseconds.
///
/// A value of zero means "not declared".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthInfo {
    /// Explicit total length.
    pub length_ms: u64,
    /// Length of the non-repeating introduction.
    pub intro_ms: u64,
    /// Length of one loop iteration.
    pub loop_ms: u64,
}

impl LengthInfo {
    /// Length info with an explicit total length only.
    pub fn explicit(length_ms: u64) -> Self {
        Self {
            length_ms,
            ..Self::default()
        }
    }

    /// Whether the container declared anything usable.
    pub fn is_known(&self) -> bool {
        self.length_ms > 0 || self.loop_ms > 0
    }
}

/// Resolve a playable length from declared length information.
///
/// Uses the explicit length when present, otherwise the intro plus two loop
/// iterations, otherwise `default_ms`.
pub fn resolve_length(info: LengthInfo, default_ms: u64) -> u64 {
    if info.length_ms > 0 {
        info.length_ms
    } else if info.loop_ms > 0 {
        info.intro_ms.saturating_add(info.loop_ms.saturating_mul(2))
    } else {
        default_ms
    }
}

/// Immutable metadata record for one track of a loaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    /// Track length in milliseconds as derived from the file, `None` if unknown.
    pub length_ms: Option<u64>,
    /// Emulated system.
    pub system: String,
    /// Game title.
    pub game: String,
    /// Song title.
    pub song: String,
    /// Author/composer.
    pub author: String,
    /// Copyright line.
    pub copyright: String,
    /// Free-form comment.
    pub comment: String,
    /// Ripper credit.
    pub dumper: String,
}

impl TrackMetadata {
    /// Create metadata for a system with every tag empty.
    pub fn for_system(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            ..Default::default()
        }
    }

    /// Build metadata whose length follows the unknown-length policy.
    ///
    /// `length_ms` is `None` only when the container declared nothing, in
    /// which case [`effective_length`](Self::effective_length) falls back to
    /// the configured default.
    pub fn with_length(mut self, info: LengthInfo) -> Self {
        self.length_ms = info.is_known().then(|| resolve_length(info, 0));
        self
    }

    /// Playable length in milliseconds, substituting `default_ms` when unknown.
    pub fn effective_length(&self, default_ms: u64) -> u64 {
        self.length_ms.unwrap_or(default_ms)
    }

    /// Title suitable for display: the song name, or the game name, or a placeholder.
    pub fn display_title(&self) -> &str {
        if !self.song.is_empty() {
            &self.song
        } else if !self.game.is_empty() {
            &self.game
        } else {
            "(unknown)"
        }
    }
}

impl MetadataFields for TrackMetadata {
    fn song(&self) -> &str {
        &self.song
    }

    fn game(&self) -> &str {
        &self.game
    }

    fn author(&self) -> &str {
        &self.author
    }

    fn system(&self) -> &str {
        &self.system
    }

    fn copyright(&self) -> &str {
        &self.copyright
    }

    fn comment(&self) -> &str {
        &self.comment
    }

    fn dumper(&self) -> &str {
        &self.dumper
    }

    fn length_ms(&self) -> Option<u64> {
        self.length_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_length_wins() {
        let info = LengthInfo {
            length_ms: 90_000,
            intro_ms: 5_000,
            loop_ms: 20_000,
        };
        assert_eq!(resolve_length(info, 180_000), 90_000);
    }

    #[test]
    fn loop_length_counts_two_iterations() {
        let info = LengthInfo {
            length_ms: 0,
            intro_ms: 5_000,
            loop_ms: 20_000,
        };
        assert_eq!(resolve_length(info, 180_000), 45_000);
    }

    #[test]
    fn undeclared_length_uses_default() {
        assert_eq!(resolve_length(LengthInfo::default(), 150_000), 150_000);
    }

    #[test]
    fn metadata_keeps_unknown_length_unresolved() {
        let meta = TrackMetadata::for_system("Nintendo NES").with_length(LengthInfo::default());
        assert_eq!(meta.length_ms, None);
        assert_eq!(meta.effective_length(120_000), 120_000);

        let meta = TrackMetadata::for_system("Super Nintendo").with_length(LengthInfo::explicit(64_000));
        assert_eq!(meta.length_ms, Some(64_000));
        assert_eq!(meta.effective_length(120_000), 64_000);
    }

    #[test]
    fn display_title_falls_back() {
        let mut meta = TrackMetadata::for_system("Game Boy");
        assert_eq!(meta.display_title(), "(unknown)");
        meta.game = "Kirby's Dream Land".into();
        assert_eq!(meta.display_title(), "Kirby's Dream Land");
        meta.song = "Green Greens".into();
        assert_eq!(meta.display_title(), "Green Greens");
    }
}
