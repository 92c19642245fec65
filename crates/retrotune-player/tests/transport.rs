mod common;

use common::{Library, TRACK_MS, player, recorder, run};
use retrotune_formats::FormatError;
use retrotune_formats::testing::{ScriptedEmulator, nsf_file};
use retrotune_player::{List, PlaybackState, PlayerError};

#[test]
fn next_walks_tracks_then_falls_through_to_next_file() -> anyhow::Result<()> {
    let library = Library::new()?;
    let (a, b) = library.standard()?;
    let player = player();

    assert_eq!(player.add_file(&a)?, 0);
    assert_eq!(player.add_file(&b)?, 1);
    assert_eq!(player.current_file(), None);

    player.load_file(0)?;
    assert_eq!(player.track_count(), 3);
    assert_eq!(player.track_order(), vec![0, 1, 2]);
    assert_eq!(player.current_track(), None);

    player.load_track(0)?;
    assert!(player.next()?);
    assert!(player.next()?);
    assert_eq!(player.current_file(), Some(0));
    assert_eq!(player.current_track(), Some(2));

    assert!(player.next()?);
    assert_eq!(player.current_file(), Some(1));
    assert_eq!(player.current_track(), Some(0));
    assert_eq!(player.track_count(), 2);

    assert!(player.next()?);
    assert!(!player.next()?);
    assert_eq!(player.current_track(), Some(1));
    Ok(())
}

#[test]
fn prev_falls_back_to_last_track_of_previous_file() -> anyhow::Result<()> {
    let library = Library::new()?;
    let (a, b) = library.standard()?;
    let player = player();
    player.add_file(&a)?;
    player.add_file(&b)?;

    player.load_file(1)?;
    player.load_track(0)?;
    assert!(player.prev()?);
    assert_eq!(player.current_file(), Some(0));
    assert_eq!(player.current_track(), Some(2));
    Ok(())
}

#[test]
fn corrupt_header_leaves_loaded_file_playing() -> anyhow::Result<()> {
    let library = Library::new()?;
    let (a, _) = library.standard()?;
    let corrupt = library.write("broken.nsf", &nsf_file(0))?;
    let player = player();

    player.add_file(&a)?;
    player.load_file(0)?;
    player.load_track(1)?;
    player.start_or_resume()?;

    let err = player.add_file(&corrupt).unwrap_err();
    assert!(matches!(err, PlayerError::Format(FormatError::Header(_))), "{err}");
    assert_eq!(player.file_count(), 1);
    assert_eq!(player.current_file(), Some(0));
    assert_eq!(player.current_track(), Some(1));

    let err = player.load_file(5).unwrap_err();
    assert!(matches!(err, PlayerError::InvalidIndex { index: 5, len: 1 }));
    assert_eq!(player.current_track(), Some(1));

    let mut block = [0i16; 256];
    player.audio_callback(&mut block);
    assert_eq!(block[0], ScriptedEmulator::AMPLITUDE);
    Ok(())
}

#[test]
fn missing_file_is_io_error() {
    let player = player();
    let err = player.add_file("/definitely/not/here.spc").unwrap_err();
    assert!(matches!(err, PlayerError::Io { .. }));
    assert_eq!(player.file_count(), 0);
}

#[test]
fn file_repeat_replays_single_track() -> anyhow::Result<()> {
    let library = Library::new()?;
    let player = player();
    player.add_file(library.single_track()?)?;
    player.set_file_repeat(true);
    player.load_file(0)?;
    player.load_track(0)?;

    for _ in 0..3 {
        assert!(player.next()?);
        assert_eq!(player.current_file(), Some(0));
        assert_eq!(player.current_track(), Some(0));
    }
    Ok(())
}

#[test]
fn track_repeat_wins_over_file_advance() -> anyhow::Result<()> {
    let library = Library::new()?;
    let (a, b) = library.standard()?;
    let player = player();
    player.add_file(&a)?;
    player.add_file(&b)?;
    player.set_track_repeat(true);
    player.load_file(0)?;
    player.load_track(2)?;

    assert!(player.next()?);
    assert_eq!(player.current_file(), Some(0));
    assert_eq!(player.current_track(), Some(2));
    Ok(())
}

#[test]
fn transport_is_inert_without_a_file() -> anyhow::Result<()> {
    let player = player();
    player.start_or_resume()?;
    player.pause();
    player.stop()?;
    player.seek(1_000)?;
    assert!(!player.next()?);
    assert!(!player.prev()?);
    assert!(player.no_file_loaded());
    assert_eq!(player.playback_state(), PlaybackState::Stopped);
    assert_eq!(player.length(), 0);
    Ok(())
}

#[test]
fn stop_rewinds_to_first_file_and_pauses() -> anyhow::Result<()> {
    let library = Library::new()?;
    let (a, b) = library.standard()?;
    let player = player();
    player.add_file(&a)?;
    player.add_file(&b)?;
    player.load_file(1)?;
    player.start_or_resume()?;
    assert_eq!(player.current_track(), Some(0));
    assert!(player.is_playing());

    player.stop()?;
    assert_eq!(player.current_file(), Some(0));
    assert_eq!(player.current_track(), Some(0));
    assert!(!player.is_playing());
    assert_eq!(player.playback_state(), PlaybackState::Paused);
    Ok(())
}

#[test]
fn seek_clamps_to_length_including_fade() -> anyhow::Result<()> {
    let library = Library::new()?;
    let (a, _) = library.standard()?;
    let player = player();
    player.add_file(&a)?;
    player.load_file(0)?;
    player.load_track(0)?;
    player.set_fade(500);

    assert_eq!(player.length(), TRACK_MS + 500);
    player.seek(10_000)?;
    assert_eq!(player.position(), TRACK_MS + 500);

    player.seek(200)?;
    player.seek_relative(-1_000)?;
    assert_eq!(player.position(), 0);
    player.seek_relative(300)?;
    assert_eq!(player.position(), 300);
    Ok(())
}

#[test]
fn huge_fade_saturates_length() -> anyhow::Result<()> {
    let library = Library::new()?;
    let (a, _) = library.standard()?;
    let player = player();
    player.add_file(&a)?;
    player.load_file(0)?;
    player.load_track(0)?;

    player.set_fade(u64::MAX);
    assert_eq!(player.length(), u64::MAX);
    player.seek(u64::MAX)?;
    assert!(player.position() > TRACK_MS);
    player.seek_relative(i64::MAX)?;
    player.seek(200)?;
    player.start_or_resume()?;

    let mut block = [0i16; 512];
    player.audio_callback(&mut block);
    assert!(player.is_playing());
    assert!(player.position() > 200);

    let options = player.options();
    player.restore_options(options.clone());
    assert_eq!(player.options(), options);
    assert_eq!(player.length(), u64::MAX);
    Ok(())
}

#[test]
fn track_end_pauses_without_autoplay() -> anyhow::Result<()> {
    let library = Library::new()?;
    let (a, _) = library.standard()?;
    let player = player();
    let (ended, mut on_ended) = recorder::<()>();
    player.events().on_track_ended(move || on_ended(()));

    player.add_file(&a)?;
    player.load_file(0)?;
    player.start_or_resume()?;
    let blocks = run(&player, 1_000);

    assert!(blocks < 1_000);
    assert_eq!(ended.lock().len(), 1);
    assert!(!player.is_playing());
    assert_eq!(player.current_track(), Some(0));
    Ok(())
}

#[test]
fn autoplay_runs_through_every_track() -> anyhow::Result<()> {
    let library = Library::new()?;
    let (a, b) = library.standard()?;
    let player = player();
    let (tracks, mut on_track) = recorder::<(usize, String)>();
    player
        .events()
        .on_track_changed(move |position, meta| on_track((position, meta.song.clone())));

    player.add_file(&a)?;
    player.add_file(&b)?;
    player.set_autoplay(true);
    player.load_file(0)?;
    player.start_or_resume()?;
    run(&player, 10_000);

    let tracks: Vec<usize> = tracks.lock().iter().map(|(position, _)| *position).collect();
    assert_eq!(tracks, vec![0, 1, 2, 0, 1]);
    assert_eq!(player.current_file(), Some(1));
    assert!(!player.is_playing());
    Ok(())
}

#[test]
fn shuffled_files_keep_current_and_remain_a_permutation() -> anyhow::Result<()> {
    let library = Library::new()?;
    let player = player();
    for n in 0..8 {
        player.add_file(library.write(&format!("{n}.nsf"), &nsf_file(1))?)?;
    }
    player.load_file(3)?;
    let playing = player.file_order()[3];

    let (shuffled, mut on_shuffled) = recorder::<List>();
    player.events().on_shuffled(move |list| on_shuffled(list));
    player.shuffle(List::Files);

    let mut order = player.file_order();
    let current = player.current_file().unwrap();
    assert_eq!(order[current], playing);
    order.sort_unstable();
    assert_eq!(order, (0..8).collect::<Vec<_>>());
    assert_eq!(*shuffled.lock(), vec![List::Files]);
    Ok(())
}

#[test]
fn moving_entries_reorders_file_playlist() -> anyhow::Result<()> {
    let library = Library::new()?;
    let (a, b) = library.standard()?;
    let player = player();
    player.add_file(&a)?;
    player.add_file(&b)?;

    assert_eq!(player.move_item(List::Files, 0, 1), 1);
    assert_eq!(player.file_order(), vec![1, 0]);
    assert_eq!(player.file_path(0).as_deref(), Some(b.as_path()));
    assert_eq!(player.move_item(List::Files, 1, 5), 1);
    Ok(())
}

#[test]
fn removing_loaded_file_unloads_it() -> anyhow::Result<()> {
    let library = Library::new()?;
    let (a, b) = library.standard()?;
    let player = player();
    player.add_file(&a)?;
    player.add_file(&b)?;
    player.load_file(1)?;
    player.start_or_resume()?;

    player.remove_file(1)?;
    assert!(player.no_file_loaded());
    assert!(!player.is_playing());
    assert_eq!(player.file_count(), 1);
    assert_eq!(player.file_order(), vec![0]);

    assert!(matches!(
        player.remove_file(4),
        Err(PlayerError::InvalidIndex { index: 4, len: 1 })
    ));
    Ok(())
}

#[test]
fn removing_earlier_file_keeps_cursor_slot() -> anyhow::Result<()> {
    let library = Library::new()?;
    let (a, b) = library.standard()?;
    let c = library.write("c.nsf", &nsf_file(4))?;
    let player = player();
    player.add_file(&a)?;
    player.add_file(&b)?;
    player.add_file(&c)?;
    player.load_file(1)?;

    player.remove_file(0)?;
    // The cursor still points at slot 1, which now holds c.nsf.
    assert_eq!(player.current_file(), Some(1));
    assert_eq!(player.file_path(1).as_deref(), Some(c.as_path()));
    assert!(!player.no_file_loaded());
    Ok(())
}
