//! chiptrack CLI: song inspection, real-time playback and WAV export.
//!
//! Usage:
//!   chiptrack info song.json
//!   chiptrack play song.json
//!   chiptrack render song.json --wav output.wav

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ct_master::{Controller, Notification, SongData, SAMPLE_RATE};

#[derive(Parser)]
#[command(name = "chiptrack", version, about = "Five-channel chip tracker player")]
struct Args {
    /// Log filter used when RUST_LOG is unset (e.g. "info", "ct_master=debug")
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print a summary of a song payload
    Info {
        song: PathBuf,
    },
    /// Play a song on the default audio device
    Play {
        song: PathBuf,
        /// Give up after this many seconds
        #[arg(long, default_value_t = 600.0)]
        max_seconds: f64,
    },
    /// Render a song to a 16-bit mono WAV file
    Render {
        song: PathBuf,
        #[arg(long)]
        wav: PathBuf,
        /// Stop rendering after this many seconds of audio
        #[arg(long, default_value_t = 300.0)]
        max_seconds: f64,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(log_level = %args.log_level, "logging initialized");

    match args.command {
        Cmd::Info { song } => info(&load(&song)?),
        Cmd::Play { song, max_seconds } => play(&load(&song)?, max_seconds),
        Cmd::Render {
            song,
            wav,
            max_seconds,
        } => render(&load(&song)?, &wav, max_seconds),
    }
}

fn load(path: &Path) -> Result<SongData> {
    ct_formats::load_song_path(path).with_context(|| format!("failed to load {}", path.display()))
}

fn seconds_to_samples(seconds: f64) -> usize {
    (seconds.max(0.0) * SAMPLE_RATE as f64) as usize
}

fn info(song: &SongData) -> Result<()> {
    let samples_per_row = song.samples_per_row();
    let rows: usize = song.patterns.iter().map(|p| p.rows()).sum();
    let seconds = rows as f64 * samples_per_row as f64 / SAMPLE_RATE as f64;

    println!("Tempo:       {} rows/s, {} ticks/beat", song.bps, song.tpb);
    println!("Row length:  {} samples", samples_per_row);
    println!("Patterns:    {} ({} rows)", song.patterns.len(), rows);
    for (index, pattern) in song.patterns.iter().enumerate() {
        let events = pattern.cells().iter().filter(|c| !c.is_empty()).count();
        println!("  {:02X}: {:3} rows, {:3} events", index, pattern.rows(), events);
    }
    println!("Instruments: {}", song.instruments.len());
    for (index, instrument) in song.instruments.iter().enumerate() {
        let length: u64 = instrument.envelope_duration.iter().map(|&d| d as u64).sum();
        print!("  {:X}: {} breakpoints, {} samples", index, instrument.len(), length);
        if let Some(sustain) = instrument.sustain {
            print!(", sustain {}", sustain);
        }
        if let Some(range) = instrument.loop_range() {
            print!(", loop {}..{}", range.start, range.end);
        }
        println!();
    }
    println!("Duration:    {:.2} s", seconds);
    Ok(())
}

fn play(song: &SongData, max_seconds: f64) -> Result<()> {
    let mut controller = Controller::new();
    controller.start_output().context("failed to open audio output")?;
    controller.load_song(song)?;
    controller.play()?;
    println!("Playing...");
    println!();

    let limit = Duration::try_from_secs_f64(max_seconds).ok();
    let started = Instant::now();
    'playback: while limit.map_or(true, |limit| started.elapsed() < limit) {
        for notification in controller.poll_notifications() {
            match notification {
                Notification::RowAdvanced { pattern_id, row } => {
                    print!("\rPat: {:02X} | Row: {:02X}", pattern_id, row);
                    let _ = std::io::stdout().flush();
                }
                Notification::SongEnded => break 'playback,
                Notification::Ready => {}
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    println!("\rDone.              ");
    tracing::debug!(elapsed = ?started.elapsed(), "playback finished");
    Ok(())
}

fn render(song: &SongData, path: &Path, max_seconds: f64) -> Result<()> {
    println!("Rendering to {} at {} Hz...", path.display(), SAMPLE_RATE);
    let samples = Controller::render_to_wav(song, seconds_to_samples(max_seconds), path)
        .with_context(|| format!("failed to render {}", path.display()))?;
    println!(
        "Rendered {} samples ({:.2} s)",
        samples,
        samples as f64 / SAMPLE_RATE as f64
    );
    Ok(())
}
