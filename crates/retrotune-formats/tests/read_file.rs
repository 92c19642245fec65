use retrotune_formats::testing::{gbs_file, gsf_file, nsf_file, scripted_decoders, spc_file};
use retrotune_formats::{ChipFormat, Container, Decoders, Emulator, FormatError, detect, read_file};

#[test]
fn detects_every_chip_signature() {
    assert_eq!(detect(&spc_file()).unwrap(), Container::Chip(ChipFormat::Spc));
    assert_eq!(detect(&nsf_file(3)).unwrap(), Container::Chip(ChipFormat::Nsf));
    assert_eq!(detect(&gbs_file(2)).unwrap(), Container::Chip(ChipFormat::Gbs));
    assert_eq!(detect(&gsf_file("title=x\n")).unwrap(), Container::Gsf);
}

#[test]
fn unknown_bytes_are_file_type_errors() {
    assert!(matches!(
        read_file(b"RIFF....WAVEfmt ", &scripted_decoders(0), 180_000),
        Err(FormatError::FileType)
    ));
    // PSF for another console.
    let mut psx = gsf_file("");
    psx[3] = 0x01;
    assert!(matches!(detect(&psx), Err(FormatError::FileType)));
}

#[test]
fn malformed_headers_are_header_errors() {
    let decoders = scripted_decoders(0);
    assert!(matches!(
        read_file(&nsf_file(0), &decoders, 180_000),
        Err(FormatError::Header(_))
    ));
    let mut truncated = spc_file();
    truncated.truncate(0x100);
    assert!(matches!(
        read_file(&truncated, &decoders, 180_000),
        Err(FormatError::Header(_))
    ));
}

#[test]
fn nsf_exposes_every_song() {
    let adapter = read_file(&nsf_file(3), &scripted_decoders(30_000), 180_000).unwrap();
    assert_eq!(adapter.format_name(), "NSF");
    assert_eq!(adapter.track_count(), 3);
    let meta = adapter.track_metadata_at(2).unwrap();
    assert_eq!(meta.song, "Track 3");
    assert_eq!(meta.system, "Nintendo NES");
    assert_eq!(meta.length_ms, Some(30_000));
}

#[test]
fn gsf_metadata_comes_from_tags() {
    let data = gsf_file("title=Overworld\ngame=Minish Cap\nlength=2:00\n");
    let mut adapter = read_file(&data, &scripted_decoders(0), 180_000).unwrap();
    adapter.start_track(0).unwrap();
    assert_eq!(adapter.format_name(), "GSF");
    assert_eq!(adapter.track_length(), 120_000);
    assert_eq!(adapter.track_metadata().unwrap().display_title(), "Overworld");
}

#[test]
fn missing_backend_is_load_file_error() {
    let err = read_file(&spc_file(), &Decoders::new(), 180_000).err().unwrap();
    assert_eq!(err, FormatError::LoadFile("no decoder registered for SPC".to_string()));
}

#[test]
fn backend_rejection_is_load_file_error() {
    let decoders = Decoders::new().with_emulator(ChipFormat::Gbs, |_, _| {
        Err::<Box<dyn Emulator>, _>("bad bank layout".to_string())
    });
    assert!(decoders.supports(Container::Chip(ChipFormat::Gbs)));
    assert!(!decoders.supports(Container::Gsf));
    assert_eq!(
        read_file(&gbs_file(1), &decoders, 180_000).err(),
        Some(FormatError::LoadFile("bad bank layout".to_string()))
    );

    let decoders = decoders.with_gsf(|_, _| Err("no bios".to_string()));
    assert!(decoders.supports(Container::Gsf));
    assert_eq!(
        read_file(&gsf_file("title=x\n"), &decoders, 180_000).err(),
        Some(FormatError::LoadFile("no bios".to_string()))
    );
}

#[test]
fn played_chip_track_ends_after_fade() {
    let mut adapter = read_file(&spc_file(), &scripted_decoders(1_000), 180_000).unwrap();
    adapter.start_track(0).unwrap();
    adapter.set_silence_detection(false);
    adapter.set_fade(1_000, 500);

    let mut block = vec![0i16; 4410];
    let mut blocks = 0;
    while !adapter.track_ended() {
        adapter.play(&mut block).unwrap();
        blocks += 1;
        assert!(blocks < 100, "track never ended");
    }
    assert!(adapter.position() >= 1_500);
}
