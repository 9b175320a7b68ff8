//! Shared test utilities for the bbcards test suite.
//!
//! Builds deck directories in temp dirs so tests can mutate them freely.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = deck_dir(&["What is ____?"], &["A cat", "A dog"]);
//! let expansion = add_deck(tmp.path(), "expansion", &[], &["Extra"]);
//! write_config(&expansion, "[card]\nrounded = true\n");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Temp directory with `black.txt` and `white.txt` holding the given cards.
/// An empty slice leaves that file out.
pub fn deck_dir(black: &[&str], white: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_decks(tmp.path(), black, white);
    tmp
}

/// Create `root/name` holding the given decks and return its path.
pub fn add_deck(root: &Path, name: &str, black: &[&str], white: &[&str]) -> PathBuf {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    write_decks(&dir, black, white);
    dir
}

fn write_decks(dir: &Path, black: &[&str], white: &[&str]) {
    for (file, cards) in [("black.txt", black), ("white.txt", white)] {
        if !cards.is_empty() {
            fs::write(dir.join(file), cards.join("\n") + "\n").unwrap();
        }
    }
}

pub fn write_config(dir: &Path, content: &str) {
    fs::write(dir.join("config.toml"), content).unwrap();
}

/// Write a small opaque PNG.
pub fn write_icon(path: &Path) {
    image::RgbaImage::from_pixel(8, 8, image::Rgba([200, 30, 30, 255]))
        .save(path)
        .unwrap();
}

/// Monospaced TrueType font checked into `tests/fixtures/fonts`.
pub fn fixture_font() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fonts/DejaVuSansMono.ttf")
}

/// Copy the fixture font into `dir` under `file_name`.
pub fn write_font(dir: &Path, file_name: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(file_name);
    fs::copy(fixture_font(), &path).unwrap();
    path
}

/// `n` distinct card lines.
pub fn numbered_cards(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("Card number {i}")).collect()
}
