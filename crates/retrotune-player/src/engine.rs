//! Engine state behind the player lock.
//!
//! Every method here assumes the caller holds the engine lock. Composite
//! operations (`stop`, `next`, the audio callback's autoplay) call these
//! methods directly and never go back through [`Player`](crate::Player).

use std::sync::Arc;

use retrotune_common::PlaybackState;
use retrotune_formats::{Decoders, FormatAdapter, read_file};
use tracing::{debug, warn};

use crate::device::OutputDevice;
use crate::error::{PlayerError, Result};
use crate::events::PlayerEvents;
use crate::library::FileEntry;
use crate::options::{BLOCK_SAMPLES, MAX_VOLUME, PlayerOptions};
use crate::playlist::{List, OrderedPlaylist};
use crate::session::{LoopStatus, SessionRequest, SessionService};

pub(crate) struct Engine {
    decoders: Arc<Decoders>,
    device: Box<dyn OutputDevice>,
    pub(crate) session: Box<dyn SessionService>,
    pub(crate) events: PlayerEvents,
    options: PlayerOptions,
    files: Vec<FileEntry>,
    file_list: OrderedPlaylist,
    track_list: OrderedPlaylist,
    adapter: Option<Box<dyn FormatAdapter>>,
    scratch: Vec<i16>,
}

impl Engine {
    pub(crate) fn new(device: Box<dyn OutputDevice>, decoders: Arc<Decoders>) -> Self {
        Self {
            decoders,
            device,
            session: Box::new(crate::session::NoSession),
            events: PlayerEvents::default(),
            options: PlayerOptions::default(),
            files: Vec::new(),
            file_list: OrderedPlaylist::default(),
            track_list: OrderedPlaylist::default(),
            adapter: None,
            scratch: vec![0; BLOCK_SAMPLES],
        }
    }

    // ========================================================================
    // Files
    // ========================================================================

    pub(crate) fn decoders(&self) -> Arc<Decoders> {
        Arc::clone(&self.decoders)
    }

    pub(crate) fn add_entry(&mut self, entry: FileEntry) -> usize {
        self.files.push(entry);
        let position = self.file_list.len();
        self.file_list.push();
        self.events.playlist_changed(List::Files);
        position
    }

    pub(crate) fn remove_file(&mut self, position: usize) -> Result<()> {
        let len = self.file_list.len();
        let unloading = self.file_list.current() == Some(position);
        let index = self
            .file_list
            .remove(position)
            .ok_or(PlayerError::InvalidIndex { index: position, len })?;
        self.files.remove(index);

        if unloading {
            self.unload();
        }
        self.events.playlist_changed(List::Files);
        Ok(())
    }

    fn unload(&mut self) {
        debug!("unloading current file");
        self.device.pause();
        self.adapter = None;
        self.file_list.set_current(None);
        self.track_list.regen_with(0);
        self.session.set_playback_status(PlaybackState::Stopped);
        self.events.playlist_changed(List::Tracks);
    }

    pub(crate) fn file_count(&self) -> usize {
        self.files.len()
    }

    pub(crate) fn file_entry(&self, position: usize) -> Option<&FileEntry> {
        self.file_list
            .get(position)
            .and_then(|index| self.files.get(index))
    }

    // ========================================================================
    // Loading
    // ========================================================================

    pub(crate) fn load_file(&mut self, position: usize) -> Result<()> {
        let entry = self.file_entry(position).ok_or(PlayerError::InvalidIndex {
            index: position,
            len: self.file_list.len(),
        })?;

        let mut adapter = read_file(entry.data(), &self.decoders, self.options.default_duration_ms)?;
        adapter.set_silence_detection(self.options.silence_detection);
        adapter.set_fade_in(self.options.fade_in_ms);
        adapter.set_tempo(self.options.tempo);
        debug!(
            position,
            path = %entry.path().display(),
            tracks = adapter.track_count(),
            "loaded file"
        );

        self.track_list.regen_with(adapter.track_count());
        self.adapter = Some(adapter);
        self.file_list.set_current(Some(position));
        self.events.file_changed(position);
        self.events.playlist_changed(List::Tracks);
        Ok(())
    }

    pub(crate) fn load_track(&mut self, position: usize) -> Result<()> {
        let len = self.track_list.len();
        let (Some(adapter), Some(track)) = (self.adapter.as_mut(), self.track_list.get(position)) else {
            return Err(PlayerError::InvalidIndex { index: position, len });
        };

        adapter.start_track(track)?;
        let length = adapter.track_length();
        if self.options.fade_out_ms > 0 {
            adapter.set_fade(length, self.options.fade_out_ms);
        }
        adapter.set_tempo(self.options.tempo);
        self.track_list.set_current(Some(position));
        debug!(position, track, length_ms = length, "started track");

        if let Some(meta) = adapter.track_metadata() {
            self.session.set_metadata(meta);
            self.events.track_changed(position, meta);
        }
        Ok(())
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub(crate) fn no_file_loaded(&self) -> bool {
        self.adapter.is_none()
    }

    pub(crate) fn start_or_resume(&mut self) -> Result<()> {
        if self.no_file_loaded() {
            return Ok(());
        }
        if self.track_list.current().is_none() {
            self.load_track(0)?;
        }
        self.device.resume();
        self.session.set_playback_status(PlaybackState::Playing);
        self.events.played();
        Ok(())
    }

    pub(crate) fn pause(&mut self) {
        if self.no_file_loaded() {
            return;
        }
        self.device.pause();
        self.session.set_playback_status(PlaybackState::Paused);
        self.events.paused();
    }

    pub(crate) fn play_pause(&mut self) -> Result<()> {
        if self.device.is_paused() {
            self.start_or_resume()
        } else {
            self.pause();
            Ok(())
        }
    }

    pub(crate) fn stop(&mut self) -> Result<()> {
        if self.no_file_loaded() {
            return Ok(());
        }
        self.load_file(0)?;
        self.load_track(0)?;
        self.pause();
        self.session.set_playback_status(PlaybackState::Stopped);
        Ok(())
    }

    pub(crate) fn is_playing(&self) -> bool {
        !self.no_file_loaded() && !self.device.is_paused()
    }

    pub(crate) fn playback_state(&self) -> PlaybackState {
        match &self.adapter {
            None => PlaybackState::Stopped,
            Some(_) if self.device.is_paused() => PlaybackState::Paused,
            Some(_) => PlaybackState::Playing,
        }
    }

    pub(crate) fn position(&self) -> u64 {
        self.adapter.as_ref().map_or(0, |adapter| adapter.position())
    }

    /// Track length plus the configured fade-out, saturating at `u64::MAX`.
    pub(crate) fn length(&self) -> u64 {
        self.adapter.as_ref().map_or(0, |adapter| {
            adapter.track_length().saturating_add(self.options.fade_out_ms)
        })
    }

    pub(crate) fn seek(&mut self, ms: u64) -> Result<()> {
        let length = self.length();
        let Some(adapter) = self.adapter.as_mut() else {
            return Ok(());
        };
        let target = ms.min(length);
        adapter.seek(target)?;
        self.session.set_position(target);
        self.events.position_changed(target);
        Ok(())
    }

    pub(crate) fn seek_relative(&mut self, offset_ms: i64) -> Result<()> {
        let target = self.position().saturating_add_signed(offset_ms);
        self.seek(target)
    }

    /// Advance to the next track, falling through to the next file.
    ///
    /// Returns whether anything was loaded.
    pub(crate) fn next(&mut self) -> Result<bool> {
        if self.no_file_loaded() {
            return Ok(false);
        }
        if let Some(track) = self.track_list.next() {
            self.load_track(track)?;
            return Ok(true);
        }
        if let Some(file) = self.file_list.next() {
            self.load_file(file)?;
            self.load_track(0)?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Step back to the previous track, falling through to the last track of
    /// the previous file.
    pub(crate) fn prev(&mut self) -> Result<bool> {
        if self.no_file_loaded() {
            return Ok(false);
        }
        if let Some(track) = self.track_list.prev() {
            self.load_track(track)?;
            return Ok(true);
        }
        if let Some(file) = self.file_list.prev() {
            self.load_file(file)?;
            let last = self.track_list.len().saturating_sub(1);
            self.load_track(last)?;
            return Ok(true);
        }
        Ok(false)
    }

    // ========================================================================
    // Playlists
    // ========================================================================

    fn playlist(&self, list: List) -> &OrderedPlaylist {
        match list {
            List::Files => &self.file_list,
            List::Tracks => &self.track_list,
        }
    }

    fn playlist_mut(&mut self, list: List) -> &mut OrderedPlaylist {
        match list {
            List::Files => &mut self.file_list,
            List::Tracks => &mut self.track_list,
        }
    }

    pub(crate) fn order(&self, list: List) -> Vec<usize> {
        self.playlist(list).order().to_vec()
    }

    pub(crate) fn current(&self, list: List) -> Option<usize> {
        self.playlist(list).current()
    }

    pub(crate) fn shuffle(&mut self, list: List) {
        self.playlist_mut(list).shuffle();
        if list == List::Files {
            self.session.set_shuffle(true);
        }
        self.events.shuffled(list);
    }

    fn unshuffle(&mut self, list: List) {
        self.playlist_mut(list).restore_order();
        if list == List::Files {
            self.session.set_shuffle(false);
        }
        self.events.playlist_changed(list);
    }

    pub(crate) fn move_item(&mut self, list: List, position: usize, offset: isize) -> usize {
        let moved = self.playlist_mut(list).move_item(position, offset);
        if moved != position {
            self.events.playlist_changed(list);
        }
        moved
    }

    // ========================================================================
    // Tracks and channels
    // ========================================================================

    pub(crate) fn adapter(&self) -> Option<&dyn FormatAdapter> {
        self.adapter.as_deref()
    }

    pub(crate) fn track_index(&self, position: usize) -> Option<usize> {
        self.track_list.get(position)
    }

    pub(crate) fn mute_channel(&mut self, index: usize, mute: bool) {
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.mute_channel(index, mute);
        }
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub(crate) fn options(&self) -> &PlayerOptions {
        &self.options
    }

    pub(crate) fn set_fade(&mut self, ms: u64) {
        self.options.fade_out_ms = ms;
        if let Some(adapter) = self.adapter.as_mut() {
            if adapter.current_track().is_some() {
                let length = adapter.track_length();
                adapter.set_fade(length, ms);
            }
        }
        self.events.fade_changed(ms);
    }

    pub(crate) fn set_fade_in(&mut self, ms: u64) {
        self.options.fade_in_ms = ms;
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.set_fade_in(ms);
        }
    }

    pub(crate) fn set_tempo(&mut self, tempo: f64) {
        if !tempo.is_finite() || tempo <= 0.0 {
            warn!(tempo, "ignoring invalid tempo");
            return;
        }
        self.options.tempo = tempo;
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.set_tempo(tempo);
        }
        self.session.set_rate(tempo);
        self.events.tempo_changed(tempo);
    }

    pub(crate) fn set_silence_detection(&mut self, enabled: bool) {
        self.options.silence_detection = enabled;
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.set_silence_detection(enabled);
        }
    }

    pub(crate) fn set_default_duration(&mut self, ms: u64) {
        self.options.default_duration_ms = ms;
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.set_default_duration(ms);
            // The track length may have changed under an armed fade.
            if adapter.current_track().is_some() && self.options.fade_out_ms > 0 {
                let length = adapter.track_length();
                adapter.set_fade(length, self.options.fade_out_ms);
            }
        }
    }

    pub(crate) fn set_autoplay(&mut self, autoplay: bool) {
        self.options.autoplay = autoplay;
    }

    pub(crate) fn set_track_repeat(&mut self, repeat: bool) {
        self.options.track_repeat = repeat;
        self.track_list.set_repeat(repeat);
        self.repeat_changed();
    }

    pub(crate) fn set_file_repeat(&mut self, repeat: bool) {
        self.options.file_repeat = repeat;
        self.file_list.set_repeat(repeat);
        self.repeat_changed();
    }

    fn repeat_changed(&mut self) {
        let (track, file) = (self.options.track_repeat, self.options.file_repeat);
        self.session.set_loop_status(LoopStatus::from_flags(track, file));
        self.events.repeat_changed(track, file);
    }

    pub(crate) fn set_volume(&mut self, volume: u8) {
        let volume = volume.min(MAX_VOLUME);
        self.options.volume = volume;
        self.session.set_volume(self.options.normalized_volume());
        self.events.volume_changed(volume);
    }

    pub(crate) fn set_volume_relative(&mut self, offset: i32) {
        let volume = (i32::from(self.options.volume) + offset).clamp(0, i32::from(MAX_VOLUME));
        self.set_volume(volume as u8);
    }

    pub(crate) fn restore_options(&mut self, options: PlayerOptions) {
        self.set_default_duration(options.default_duration_ms);
        self.set_silence_detection(options.silence_detection);
        self.set_fade_in(options.fade_in_ms);
        self.set_fade(options.fade_out_ms);
        self.set_tempo(options.tempo);
        self.set_autoplay(options.autoplay);
        self.set_track_repeat(options.track_repeat);
        self.set_file_repeat(options.file_repeat);
        self.set_volume(options.volume);
    }

    /// Push the full current state to a newly attached session.
    pub(crate) fn sync_session(&mut self) {
        let status = self.playback_state();
        let position = self.position();
        let session = &mut self.session;
        session.set_playback_status(status);
        session.set_position(position);
        session.set_volume(self.options.normalized_volume());
        session.set_rate(self.options.tempo);
        session.set_loop_status(LoopStatus::from_flags(
            self.options.track_repeat,
            self.options.file_repeat,
        ));
        if let Some(meta) = self.adapter.as_ref().and_then(|adapter| adapter.track_metadata()) {
            session.set_metadata(meta);
        }
    }

    // ========================================================================
    // Session requests
    // ========================================================================

    pub(crate) fn handle_request(&mut self, request: SessionRequest) -> Result<()> {
        debug!(?request, "session request");
        match request {
            SessionRequest::Play => self.start_or_resume()?,
            SessionRequest::Pause => self.pause(),
            SessionRequest::PlayPause => self.play_pause()?,
            SessionRequest::Stop => self.stop()?,
            SessionRequest::Next => {
                self.next()?;
            }
            SessionRequest::Previous => {
                self.prev()?;
            }
            SessionRequest::Seek(offset) => self.seek_relative(offset)?,
            SessionRequest::SetPosition(ms) => self.seek(ms)?,
            SessionRequest::SetRate(rate) => self.set_tempo(rate),
            SessionRequest::SetShuffle(true) => self.shuffle(List::Files),
            SessionRequest::SetShuffle(false) => self.unshuffle(List::Files),
            SessionRequest::SetLoopStatus(status) => {
                self.set_track_repeat(status == LoopStatus::Track);
                self.set_file_repeat(status == LoopStatus::Playlist);
            }
            SessionRequest::SetVolume(volume) => {
                let level = (volume.clamp(0.0, 1.0) * f64::from(MAX_VOLUME)).round();
                self.set_volume(level as u8);
            }
            // Opened by `SessionHandle::dispatch` before it takes the lock.
            SessionRequest::OpenUri(uri) => warn!(%uri, "unopened file request reached the engine"),
        }
        Ok(())
    }

    /// Append an already read file and start playing its first track.
    pub(crate) fn play_entry(&mut self, entry: FileEntry) -> Result<()> {
        let position = self.add_entry(entry);
        self.load_file(position)?;
        self.load_track(0)?;
        self.start_or_resume()
    }

    // ========================================================================
    // Real-time rendering
    // ========================================================================

    /// Render one block into `out`.
    ///
    /// Runs on the audio thread. It does not allocate; decode errors are
    /// logged and leave the block silent.
    pub(crate) fn audio_callback(&mut self, out: &mut [i16]) {
        out.fill(0);
        let length = self.length();
        let Some(adapter) = self.adapter.as_mut() else {
            return;
        };
        if adapter.current_track().is_none() {
            return;
        }

        if adapter.track_ended() || adapter.position() > length {
            self.finish_track();
            return;
        }

        let volume = i32::from(self.options.volume);
        for chunk in out.chunks_mut(self.scratch.len()) {
            let block = &mut self.scratch[..chunk.len()];
            if let Err(e) = adapter.play(block) {
                warn!(error = %e, "decode failed, skipping block");
                break;
            }
            for (dst, sample) in chunk.iter_mut().zip(block.iter()) {
                let mixed = i32::from(*dst) + i32::from(*sample) * volume / i32::from(MAX_VOLUME);
                *dst = mixed.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
            }
        }

        let position = adapter.position();
        self.session.set_position(position);
        self.events.position_changed(position);
    }

    fn finish_track(&mut self) {
        debug!(position = self.position(), "track ended");
        self.device.pause();
        self.session.set_playback_status(PlaybackState::Paused);
        self.events.track_ended();

        if !self.options.autoplay {
            return;
        }
        match self.next() {
            Ok(true) => {
                self.device.resume();
                self.session.set_playback_status(PlaybackState::Playing);
                self.events.played();
            }
            Ok(false) => {}
            Err(e) => {
                warn!(error = %e, "automatic advance failed");
                self.events.error(&e);
            }
        }
    }
}
