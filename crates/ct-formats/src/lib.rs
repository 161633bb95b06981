//! Song payload parsing for chiptrack.
//!
//! The `load-song` payload is JSON: instruments with camelCase envelope
//! fields, a tempo, and patterns as flat arrays of packed cells.

mod json;

pub use json::{load_song_json, load_song_path, save_song_json};

use ct_ir::SongError;
use thiserror::Error;

/// Error type for format parsing.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed song payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("song payload is not playable: {0}")]
    Invalid(#[from] SongError),
}
