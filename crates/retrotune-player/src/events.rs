//! Observer slots for engine notifications.
//!
//! Each event kind has exactly one slot; registering a callback replaces the
//! previous one. Callbacks run synchronously on the thread that triggered the
//! event (including the audio thread) while the engine lock is held, so they
//! must be quick and must not call back into the [`Player`](crate::Player).

use retrotune_common::TrackMetadata;

use crate::error::PlayerError;
use crate::playlist::List;

/// Callback registry, one slot per notification.
#[derive(Default)]
pub struct PlayerEvents {
    file_changed: Option<Box<dyn FnMut(usize) + Send>>,
    track_changed: Option<Box<dyn FnMut(usize, &TrackMetadata) + Send>>,
    position_changed: Option<Box<dyn FnMut(u64) + Send>>,
    track_ended: Option<Box<dyn FnMut() + Send>>,
    paused: Option<Box<dyn FnMut() + Send>>,
    played: Option<Box<dyn FnMut() + Send>>,
    volume_changed: Option<Box<dyn FnMut(u8) + Send>>,
    tempo_changed: Option<Box<dyn FnMut(f64) + Send>>,
    fade_changed: Option<Box<dyn FnMut(u64) + Send>>,
    repeat_changed: Option<Box<dyn FnMut(bool, bool) + Send>>,
    shuffled: Option<Box<dyn FnMut(List) + Send>>,
    error: Option<Box<dyn FnMut(&PlayerError) + Send>>,
    playlist_changed: Option<Box<dyn FnMut(List) + Send>>,
}

impl PlayerEvents {
    /// A file was loaded; receives its file-playlist position.
    pub fn on_file_changed(&mut self, f: impl FnMut(usize) + Send + 'static) {
        self.file_changed = Some(Box::new(f));
    }

    /// A track was started; receives its track-playlist position and metadata.
    pub fn on_track_changed(&mut self, f: impl FnMut(usize, &TrackMetadata) + Send + 'static) {
        self.track_changed = Some(Box::new(f));
    }

    /// Playback position moved, in milliseconds. Fired once per audio block.
    pub fn on_position_changed(&mut self, f: impl FnMut(u64) + Send + 'static) {
        self.position_changed = Some(Box::new(f));
    }

    /// The current track reached its end.
    pub fn on_track_ended(&mut self, f: impl FnMut() + Send + 'static) {
        self.track_ended = Some(Box::new(f));
    }

    /// Output was paused.
    pub fn on_paused(&mut self, f: impl FnMut() + Send + 'static) {
        self.paused = Some(Box::new(f));
    }

    /// Output was started or resumed.
    pub fn on_played(&mut self, f: impl FnMut() + Send + 'static) {
        self.played = Some(Box::new(f));
    }

    /// Volume changed; receives the new level.
    pub fn on_volume_changed(&mut self, f: impl FnMut(u8) + Send + 'static) {
        self.volume_changed = Some(Box::new(f));
    }

    /// Tempo changed.
    pub fn on_tempo_changed(&mut self, f: impl FnMut(f64) + Send + 'static) {
        self.tempo_changed = Some(Box::new(f));
    }

    /// Fade-out length changed.
    pub fn on_fade_changed(&mut self, f: impl FnMut(u64) + Send + 'static) {
        self.fade_changed = Some(Box::new(f));
    }

    /// Repeat flags changed; receives (track repeat, file repeat).
    pub fn on_repeat_changed(&mut self, f: impl FnMut(bool, bool) + Send + 'static) {
        self.repeat_changed = Some(Box::new(f));
    }

    /// A playlist was shuffled.
    pub fn on_shuffled(&mut self, f: impl FnMut(List) + Send + 'static) {
        self.shuffled = Some(Box::new(f));
    }

    /// An error happened outside a caller's reach (automatic track advance).
    pub fn on_error(&mut self, f: impl FnMut(&PlayerError) + Send + 'static) {
        self.error = Some(Box::new(f));
    }

    /// A playlist's contents or order changed.
    pub fn on_playlist_changed(&mut self, f: impl FnMut(List) + Send + 'static) {
        self.playlist_changed = Some(Box::new(f));
    }

    /// Drop every registered callback.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub(crate) fn file_changed(&mut self, position: usize) {
        if let Some(f) = &mut self.file_changed {
            f(position);
        }
    }

    pub(crate) fn track_changed(&mut self, position: usize, meta: &TrackMetadata) {
        if let Some(f) = &mut self.track_changed {
            f(position, meta);
        }
    }

    pub(crate) fn position_changed(&mut self, ms: u64) {
        if let Some(f) = &mut self.position_changed {
            f(ms);
        }
    }

    pub(crate) fn track_ended(&mut self) {
        if let Some(f) = &mut self.track_ended {
            f();
        }
    }

    pub(crate) fn paused(&mut self) {
        if let Some(f) = &mut self.paused {
            f();
        }
    }

    pub(crate) fn played(&mut self) {
        if let Some(f) = &mut self.played {
            f();
        }
    }

    pub(crate) fn volume_changed(&mut self, volume: u8) {
        if let Some(f) = &mut self.volume_changed {
            f(volume);
        }
    }

    pub(crate) fn tempo_changed(&mut self, tempo: f64) {
        if let Some(f) = &mut self.tempo_changed {
            f(tempo);
        }
    }

    pub(crate) fn fade_changed(&mut self, ms: u64) {
        if let Some(f) = &mut self.fade_changed {
            f(ms);
        }
    }

    pub(crate) fn repeat_changed(&mut self, track: bool, file: bool) {
        if let Some(f) = &mut self.repeat_changed {
            f(track, file);
        }
    }

    pub(crate) fn shuffled(&mut self, list: List) {
        if let Some(f) = &mut self.shuffled {
            f(list);
        }
    }

    pub(crate) fn error(&mut self, error: &PlayerError) {
        if let Some(f) = &mut self.error {
            f(error);
        }
    }

    pub(crate) fn playlist_changed(&mut self, list: List) {
        if let Some(f) = &mut self.playlist_changed {
            f(list);
        }
    }
}

impl std::fmt::Debug for PlayerEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registered = [
            ("file_changed", self.file_changed.is_some()),
            ("track_changed", self.track_changed.is_some()),
            ("position_changed", self.position_changed.is_some()),
            ("track_ended", self.track_ended.is_some()),
            ("paused", self.paused.is_some()),
            ("played", self.played.is_some()),
            ("volume_changed", self.volume_changed.is_some()),
            ("tempo_changed", self.tempo_changed.is_some()),
            ("fade_changed", self.fade_changed.is_some()),
            ("repeat_changed", self.repeat_changed.is_some()),
            ("shuffled", self.shuffled.is_some()),
            ("error", self.error.is_some()),
            ("playlist_changed", self.playlist_changed.is_some()),
        ];
        f.debug_list()
            .entries(registered.iter().filter(|(_, set)| *set).map(|(name, _)| name))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn last_registration_wins() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut events = PlayerEvents::default();

        let counter = Arc::clone(&first);
        events.on_paused(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&second);
        events.on_paused(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        events.paused();
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_slots_are_silent() {
        let mut events = PlayerEvents::default();
        events.track_changed(0, &TrackMetadata::default());
        events.error(&PlayerError::Device("gone".into()));
        assert_eq!(format!("{events:?}"), "[]");

        events.on_error(|_| {});
        assert_eq!(format!("{events:?}"), "[\"error\"]");
        events.clear();
        assert_eq!(format!("{events:?}"), "[]");
    }
}
