#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use retrotune_formats::testing::{ScriptedEmulator, gbs_file, nsf_file, scripted_decoders, spc_file};
use retrotune_formats::{ChipFormat, Decoders, Emulator};
use retrotune_player::{ManualOutput, Player};
use tempfile::TempDir;

/// Length of every scripted track.
pub const TRACK_MS: u64 = 1_000;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Scripted backends; SPC files report three tracks.
pub fn decoders() -> Decoders {
    let mut decoders = scripted_decoders(TRACK_MS);
    decoders.register_emulator(ChipFormat::Spc, |_, _| {
        Ok(Box::new(ScriptedEmulator::with_track_count(3, TRACK_MS)) as Box<dyn Emulator>)
    });
    decoders
}

pub fn player() -> Player {
    init_tracing();
    Player::new(ManualOutput::new(), decoders())
}

/// Temporary music directory.
pub struct Library {
    pub dir: TempDir,
}

impl Library {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn write(&self, name: &str, data: &[u8]) -> anyhow::Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, data)?;
        Ok(path)
    }

    /// a.spc (3 tracks) and b.nsf (2 tracks).
    pub fn standard(&self) -> anyhow::Result<(PathBuf, PathBuf)> {
        Ok((self.write("a.spc", &spc_file())?, self.write("b.nsf", &nsf_file(2))?))
    }

    pub fn single_track(&self) -> anyhow::Result<PathBuf> {
        self.write("single.gbs", &gbs_file(1))
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Collects values passed to an event callback.
pub fn recorder<T: Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl FnMut(T) + Send + 'static) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    (log, move |value| sink.lock().push(value))
}

/// Render blocks until the player stops or `max_blocks` have been rendered.
pub fn run(player: &Player, max_blocks: usize) -> usize {
    let mut block = vec![0i16; retrotune_player::BLOCK_SAMPLES];
    for n in 0..max_blocks {
        if !player.is_playing() {
            return n;
        }
        player.audio_callback(&mut block);
    }
    max_blocks
}
