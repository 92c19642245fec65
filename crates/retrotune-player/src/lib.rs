//! Playback engine for retro game-music collections.
//!
//! The [`Player`] keeps a playlist of files and, for the loaded file, a
//! playlist of its tracks. It drives a [`FormatAdapter`](retrotune_formats::FormatAdapter)
//! from a real-time output callback, advances through both playlists, and
//! reports what happens through [`PlayerEvents`] and an optional desktop
//! [`SessionService`].
//!
//! # Features
//!
//! - `streaming`: real-time output on the default audio device via rodio
//!   ([`Player::open_default`]).
//!
//! # Example
//!
//! ```ignore
//! use retrotune_player::{List, ManualOutput, Player};
//!
//! let player = Player::new(ManualOutput::new(), decoders);
//! player.add_file("zelda.spc")?;
//! player.add_file("metroid.nsf")?;
//! player.shuffle(List::Files);
//! player.load_file(0)?;
//! player.start_or_resume()?;
//!
//! let mut block = [0i16; retrotune_player::BLOCK_SAMPLES];
//! while player.is_playing() {
//!     player.audio_callback(&mut block);
//! }
//! ```

#![warn(missing_docs)]

mod device;
mod engine;
mod error;
mod events;
mod library;
mod options;
mod player;
mod playlist;
mod session;
#[cfg(feature = "streaming")]
mod streaming;

pub use device::{ManualOutput, OutputDevice};
pub use error::{PlayerError, PlaylistLineError, Result};
pub use events::PlayerEvents;
pub use library::FileEntry;
pub use options::{BLOCK_SAMPLES, MAX_VOLUME, PlayerOptions};
pub use player::Player;
pub use playlist::{List, OrderedPlaylist};
pub use session::{LoopStatus, NoSession, SessionHandle, SessionRequest, SessionService};

pub use retrotune_common::{MetadataFields, PlaybackState, TrackMetadata};
pub use retrotune_formats::{Decoders, FormatError};
