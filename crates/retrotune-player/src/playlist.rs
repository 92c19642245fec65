//! Ordered playlists: an index permutation with a cursor.
//!
//! The engine keeps two of these, one over the loaded files and one over the
//! tracks of the current file. Positions in the playlist are what the cursor
//! and the transport work with; [`OrderedPlaylist::order`] maps a position to
//! the underlying file or track index.

use rand::Rng;
use rand::seq::SliceRandom;

/// Which of the engine's two playlists an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum List {
    /// Playlist over loaded files.
    Files,
    /// Playlist over the tracks of the current file.
    Tracks,
}

/// Permutation of `0..len` with an optional cursor and a repeat flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedPlaylist {
    order: Vec<usize>,
    current: Option<usize>,
    repeat: bool,
}

impl OrderedPlaylist {
    /// Identity playlist over `len` items.
    pub fn new(len: usize) -> Self {
        let mut playlist = Self::default();
        playlist.regen_with(len);
        playlist
    }

    /// Resize to `len` items, reset to identity order and clear the cursor.
    pub fn regen_with(&mut self, len: usize) {
        self.order.resize(len, 0);
        self.regen();
    }

    /// Reset to identity order, keeping the length, and clear the cursor.
    pub fn regen(&mut self) {
        for (index, value) in self.order.iter_mut().enumerate() {
            *value = index;
        }
        self.current = None;
    }

    /// Append the next index (`len`) at the end of the order.
    pub fn push(&mut self) -> usize {
        let index = self.order.len();
        self.order.push(index);
        index
    }

    /// Shuffle the order uniformly using the thread-local generator.
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::rng());
    }

    /// Shuffle the order uniformly. The cursor follows the item it selected.
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let selected = self.selected();
        self.order.shuffle(rng);
        if let Some(item) = selected {
            self.current = self.order.iter().position(|&value| value == item);
        }
    }

    /// Put the order back to identity. The cursor follows the item it selected.
    pub fn restore_order(&mut self) {
        let selected = self.selected();
        self.order.sort_unstable();
        self.current = selected;
    }

    /// Erase slot `position` and return the item it held.
    ///
    /// Remaining items above the removed one are renumbered down by one so
    /// the order stays a permutation of `0..len`. The cursor is left alone
    /// unless it now points past the end, in which case it is clamped to the
    /// last slot: removing a slot before the cursor shifts which item the
    /// cursor selects.
    pub fn remove(&mut self, position: usize) -> Option<usize> {
        if position >= self.order.len() {
            return None;
        }
        let removed = self.order.remove(position);
        for value in &mut self.order {
            if *value > removed {
                *value -= 1;
            }
        }
        if let Some(current) = self.current {
            if current >= self.order.len() {
                self.current = self.order.len().checked_sub(1);
            }
        }
        Some(removed)
    }

    /// Swap slot `position` with slot `position + offset`.
    ///
    /// Returns the moved item's new position, or `position` unchanged when
    /// either slot is out of bounds. The cursor follows the item it selected.
    pub fn move_item(&mut self, position: usize, offset: isize) -> usize {
        let Some(target) = position.checked_add_signed(offset) else {
            return position;
        };
        if position >= self.order.len() || target >= self.order.len() {
            return position;
        }
        self.order.swap(position, target);
        if self.current == Some(position) {
            self.current = Some(target);
        } else if self.current == Some(target) {
            self.current = Some(position);
        }
        target
    }

    /// Position after the cursor, or the cursor itself when repeating.
    ///
    /// With no cursor the first position is next. `None` means the list is
    /// exhausted.
    pub fn next(&self) -> Option<usize> {
        match self.current {
            Some(current) if self.repeat => Some(current),
            Some(current) => (current + 1 < self.order.len()).then_some(current + 1),
            None => (!self.order.is_empty()).then_some(0),
        }
    }

    /// Position before the cursor, or the cursor itself when repeating.
    pub fn prev(&self) -> Option<usize> {
        match self.current {
            Some(current) if self.repeat => Some(current),
            Some(current) => current.checked_sub(1),
            None => None,
        }
    }

    /// Item under the cursor.
    pub fn selected(&self) -> Option<usize> {
        self.current.and_then(|position| self.order.get(position).copied())
    }

    /// Item at a position.
    pub fn get(&self, position: usize) -> Option<usize> {
        self.order.get(position).copied()
    }

    /// Cursor position.
    pub fn current(&self) -> Option<usize> {
        self.current
    }

    /// Move the cursor. Out-of-range positions are rejected.
    pub fn set_current(&mut self, position: Option<usize>) -> bool {
        match position {
            Some(position) if position >= self.order.len() => false,
            _ => {
                self.current = position;
                true
            }
        }
    }

    /// The full order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Whether `next`/`prev` replay the cursor.
    pub fn repeat(&self) -> bool {
        self.repeat
    }

    /// Set the repeat flag.
    pub fn set_repeat(&mut self, repeat: bool) {
        self.repeat = repeat;
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the playlist holds no items.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
