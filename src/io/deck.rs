//! Deck file I/O.
//!
//! Decks are stored as pretty-printed JSON.

use crate::Deck;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Writes a deck to a JSON file.
///
/// # Example
/// ```no_run
/// use emsim3d::Deck;
/// use emsim3d::io::write_deck;
/// use std::path::Path;
///
/// write_deck(Path::new("board.json"), &Deck::board_default()).unwrap();
/// ```
pub fn write_deck(path: &Path, deck: &Deck) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, deck)
        .with_context(|| format!("Failed to serialize deck to: {}", path.display()))?;
    writer.flush()?;

    Ok(())
}

/// Reads a deck from a JSON file.
pub fn read_deck(path: &Path) -> Result<Deck> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let reader = BufReader::new(file);

    let deck: Deck = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to deserialize deck from: {}", path.display()))?;

    Ok(deck)
}

/// Serializes a deck to a JSON string.
pub fn to_deck_string(deck: &Deck) -> Result<String> {
    serde_json::to_string_pretty(deck).context("Failed to serialize deck to string")
}

/// Deserializes a deck from a JSON string.
pub fn from_deck_string(json: &str) -> Result<Deck> {
    serde_json::from_str(json).context("Failed to deserialize deck from string")
}
