//! Allocation-free render path tests.
//!
//! These tests verify that the audio-context path does not allocate once a
//! song is loaded: sequencing, envelope evaluation, note retriggers, song
//! end and command handling all run under `assert_no_alloc`.
//!
//! Just run `cargo test`; no feature flags needed.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

#[cfg(debug_assertions)]
#[global_allocator]
static A: AllocDisabler = AllocDisabler;

use ct_engine::{Command, Engine, Song};
use ct_master::{link, ControllerConfig, SongData, SAMPLE_RATE};
use ringbuf::traits::{Consumer, Producer};
use std::path::PathBuf;

fn load_demo() -> SongData {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/songs/demo.json");
    ct_formats::load_song_path(path).unwrap()
}

#[test]
fn engine_render_alloc_free() {
    let song = Box::new(Song::from_data(&load_demo()).unwrap());
    let mut engine = Engine::new();
    engine.handle_command(Command::LoadSong(song));
    engine.handle_command(Command::Play);

    let mut buffer = [0.0f32; 256];
    assert_no_alloc(|| {
        // Past the end of the song too: ended playback must stay quiet.
        for _ in 0..(SAMPLE_RATE as usize * 5 / buffer.len()) {
            engine.render(&mut buffer, &mut ());
        }
    });
}

#[test]
fn processor_alloc_free_across_reload() {
    let data = load_demo();
    let (mut control, mut processor) = link(&ControllerConfig::default());
    control
        .commands
        .try_push(Command::LoadSong(Box::new(Song::from_data(&data).unwrap())))
        .unwrap();
    control.commands.try_push(Command::Play).unwrap();

    let mut buffer = [0.0f32; 128];
    assert_no_alloc(|| {
        for _ in 0..100 {
            processor.process(&mut buffer);
        }
    });

    // Swap songs mid-playback; the old one leaves through the retired ring.
    control
        .commands
        .try_push(Command::LoadSong(Box::new(Song::from_data(&data).unwrap())))
        .unwrap();
    control.commands.try_push(Command::Stop).unwrap();
    control.commands.try_push(Command::Play).unwrap();
    assert_no_alloc(|| {
        for _ in 0..100 {
            processor.process(&mut buffer);
        }
    });

    assert!(control.retired.try_pop().is_some());
}
