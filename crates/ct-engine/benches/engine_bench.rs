use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ct_engine::{Command, Engine, Song};
use ct_ir::{Cell, Instrument, Pattern, SongData};

/// Every channel busy on every row, so the bench measures a full mix.
fn busy_song() -> SongData {
    let mut pattern = Pattern::new(32);
    for row in 0..pattern.rows() {
        for channel in 0..ct_ir::CHANNEL_COUNT {
            let note = ((row * 3 + channel * 5) % 15) as u8;
            pattern.set_cell(row, channel, Cell::encode(Some(note), Some(0), Some(48), None));
        }
    }
    SongData {
        instruments: vec![
            Instrument::from_breakpoints(&[(0.0, 0), (1.0, 40), (0.6, 200), (0.0, 800)])
                .with_loop(1, 3),
        ],
        bps: 32.0,
        patterns: vec![pattern; 4],
        ..SongData::default()
    }
}

fn render_buffer(c: &mut Criterion) {
    let data = busy_song();
    let mut engine = Engine::new();
    let mut buffer = [0.0f32; 512];

    c.bench_function("render 512 samples, 5 channels", |b| {
        b.iter(|| {
            if engine.song().map_or(true, |s| !s.is_playing()) {
                let song = Song::from_data(&data).expect("bench song is valid");
                engine.handle_command(Command::LoadSong(Box::new(song)));
                engine.handle_command(Command::Play);
            }
            engine.render(&mut buffer, &mut ());
            black_box(&buffer);
        })
    });
}

criterion_group!(benches, render_buffer);
criterion_main!(benches);
