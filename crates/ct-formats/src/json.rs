//! JSON encoding of the song payload.

use std::path::Path;

use ct_ir::SongData;

use crate::FormatError;

/// Parse and validate a song payload.
pub fn load_song_json(bytes: &[u8]) -> Result<SongData, FormatError> {
    let song: SongData = serde_json::from_slice(bytes)?;
    song.validate()?;
    tracing::debug!(
        patterns = song.patterns.len(),
        instruments = song.instruments.len(),
        bps = song.bps,
        "parsed song payload"
    );
    Ok(song)
}

/// Read, parse and validate a song payload from disk.
pub fn load_song_path(path: impl AsRef<Path>) -> Result<SongData, FormatError> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "loading song");
    let bytes = std::fs::read(path)?;
    load_song_json(&bytes)
}

/// Serialize a song payload as pretty-printed JSON.
pub fn save_song_json(song: &SongData) -> Result<String, FormatError> {
    Ok(serde_json::to_string_pretty(song)?)
}
