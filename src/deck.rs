//! Deck files and deck directory discovery.
//!
//! A deck is a UTF-8 text file with one card per line. Blank lines are
//! skipped and surrounding whitespace is trimmed, so the card count is the
//! number of non-blank lines. Inside a card, `<br>` forces a line break and
//! [`markup`](crate::markup) tags set bold and italic runs.
//!
//! ## Directory layout
//!
//! ```text
//! party/
//! ├── black.txt     # black cards (optional if white.txt exists)
//! ├── white.txt     # white cards (optional if black.txt exists)
//! ├── icon.png      # drawn in the lower-left corner of every card (optional)
//! ├── config.toml   # deck configuration (optional)
//! └── expansion/    # picked up by --recursive
//!     └── white.txt
//! ```

use crate::markup::{Span, parse_markup, plain_text};
use crate::render::Ink;
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Deck file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error reading {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Which side of the game a deck belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckKind {
    Black,
    White,
}

impl DeckKind {
    /// Rendering order: black first, like the stream output.
    pub const ALL: [DeckKind; 2] = [DeckKind::Black, DeckKind::White];

    pub fn label(self) -> &'static str {
        match self {
            DeckKind::Black => "black",
            DeckKind::White => "white",
        }
    }

    pub fn source_file_name(self) -> &'static str {
        match self {
            DeckKind::Black => "black.txt",
            DeckKind::White => "white.txt",
        }
    }

    pub fn output_file_name(self) -> &'static str {
        match self {
            DeckKind::Black => "black_card.pdf",
            DeckKind::White => "white_card.pdf",
        }
    }

    /// Page fill behind the cards.
    pub fn background(self) -> Ink {
        match self {
            DeckKind::Black => Ink::Black,
            DeckKind::White => Ink::White,
        }
    }

    /// Text and line color on top of the background.
    pub fn foreground(self) -> Ink {
        match self {
            DeckKind::Black => Ink::White,
            DeckKind::White => Ink::Black,
        }
    }
}

/// One card: the raw line and its forced-break paragraphs as styled spans.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub text: String,
    pub paragraphs: Vec<Vec<Span>>,
}

impl Card {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            paragraphs: split_line_breaks(text)
                .iter()
                .map(|p| parse_markup(p))
                .collect(),
        }
    }

    /// Paragraph texts with markup removed.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.paragraphs.iter().map(|p| plain_text(p)).collect()
    }
}

/// Split card text on `<br>`, `<br/>` and `<br />` (any case).
///
/// - `"Cards<br>Against<br>Humanity"` → `["Cards", "Against", "Humanity"]`
/// - `"a<BR/> b"` → `["a", "b"]`
/// - `"<br>"` → `["", ""]`
pub fn split_line_breaks(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut rest = text;
    loop {
        match find_break(rest) {
            Some((start, end)) => {
                paragraphs.push(rest[..start].trim().to_string());
                rest = &rest[end..];
            }
            None => {
                paragraphs.push(rest.trim().to_string());
                return paragraphs;
            }
        }
    }
}

/// Byte range of the first `<br>` tag variant in `text`.
fn find_break(text: &str) -> Option<(usize, usize)> {
    let lower = text.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = lower[from..].find("<br") {
        let start = from + pos;
        let after = &lower[start + 3..];
        let tail = after.trim_start_matches(' ');
        let tail = tail.strip_prefix('/').unwrap_or(tail);
        if tail.starts_with('>') {
            let end = text.len() - tail.len() + 1;
            return Some((start, end));
        }
        from = start + 3;
    }
    None
}

/// Parse deck file content into cards, skipping blank lines and a leading
/// byte order mark.
pub fn parse_deck(content: &str) -> Vec<Card> {
    content
        .strip_prefix('\u{feff}')
        .unwrap_or(content)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Card::new)
        .collect()
}

/// An ordered list of cards loaded from one file.
#[derive(Debug, Clone, Serialize)]
pub struct Deck {
    pub kind: DeckKind,
    pub source: PathBuf,
    pub cards: Vec<Card>,
}

impl Deck {
    pub fn load(kind: DeckKind, path: &Path) -> Result<Self, DeckError> {
        if !path.is_file() {
            return Err(DeckError::NotFound(path.to_path_buf()));
        }
        let content =
            fs::read_to_string(path).map_err(|e| DeckError::Io(path.to_path_buf(), e))?;
        let cards = parse_deck(&content);
        debug!("loaded {} {} cards from {}", cards.len(), kind.label(), path.display());
        Ok(Self {
            kind,
            source: path.to_path_buf(),
            cards,
        })
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// The input files that make up one run's pair of decks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckSources {
    /// Deck name, used to prefix output files in recursive mode.
    pub name: String,
    /// Directory searched for `config.toml` and relative font paths.
    pub base_dir: PathBuf,
    pub black: Option<PathBuf>,
    pub white: Option<PathBuf>,
    pub icon: Option<PathBuf>,
}

impl DeckSources {
    /// Deck files found in `dir`, or `None` if it has neither deck file.
    pub fn from_directory(dir: &Path) -> Option<Self> {
        let existing = |name: &str| Some(dir.join(name)).filter(|p| p.is_file());
        let black = existing(DeckKind::Black.source_file_name());
        let white = existing(DeckKind::White.source_file_name());
        if black.is_none() && white.is_none() {
            return None;
        }
        Some(Self {
            name: directory_name(dir),
            base_dir: dir.to_path_buf(),
            black,
            white,
            icon: existing("icon.png"),
        })
    }

    pub fn path(&self, kind: DeckKind) -> Option<&Path> {
        match kind {
            DeckKind::Black => self.black.as_deref(),
            DeckKind::White => self.white.as_deref(),
        }
    }
}

fn directory_name(dir: &Path) -> String {
    let resolved = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "cards".to_string())
}

/// Find deck directories under `root`.
///
/// Without `recursive`, only `root` itself is considered. With it, every
/// directory in the tree that holds a deck file is returned, sorted by path.
pub fn discover_decks(root: &Path, recursive: bool) -> Result<Vec<DeckSources>, DeckError> {
    if !root.is_dir() {
        return Err(DeckError::NotFound(root.to_path_buf()));
    }
    if !recursive {
        return Ok(DeckSources::from_directory(root).into_iter().collect());
    }

    let mut decks = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(sources) = DeckSources::from_directory(entry.path()) {
            decks.push(sources);
        }
    }
    Ok(decks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // =========================================================================
    // line breaks
    // =========================================================================

    #[test]
    fn splits_on_br() {
        assert_eq!(
            split_line_breaks("Cards<br>Against<br>Humanity"),
            vec!["Cards", "Against", "Humanity"]
        );
    }

    #[test]
    fn br_variants_and_case() {
        assert_eq!(split_line_breaks("a<BR/> b<br />c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn no_break_is_single_paragraph() {
        assert_eq!(split_line_breaks("  Just one  "), vec!["Just one"]);
    }

    #[test]
    fn other_tags_survive_break_splitting() {
        assert_eq!(split_line_breaks("<b>bold</b> <brx>"), vec!["<b>bold</b> <brx>"]);
    }

    #[test]
    fn card_markup_becomes_spans() {
        let card = Card::new("<i>Italic</i> and <b>bold</b><br>next");
        assert_eq!(card.paragraph_texts(), vec!["Italic and bold", "next"]);
        assert_eq!(card.paragraphs[0].len(), 3);
        assert!(card.paragraphs[0][0].emphasis.italic);
        assert!(card.paragraphs[0][2].emphasis.bold);
        assert_eq!(card.text, "<i>Italic</i> and <b>bold</b><br>next");
    }

    #[test]
    fn lone_break_gives_two_empty_paragraphs() {
        assert_eq!(split_line_breaks("<br>"), vec!["", ""]);
    }

    // =========================================================================
    // parse_deck
    // =========================================================================

    #[test]
    fn blank_lines_are_skipped() {
        let cards = parse_deck("first\n\n   \nsecond\r\nthird\n");
        let texts: Vec<&str> = cards.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn byte_order_mark_is_dropped() {
        let cards = parse_deck("\u{feff}First card\nSecond\n");
        assert_eq!(cards[0].text, "First card");
        assert_eq!(cards[0].paragraph_texts(), vec!["First card"]);
        assert_eq!(cards.len(), 2);
    }

    #[test]
    fn duplicates_and_order_are_preserved() {
        let cards = parse_deck("b\na\nb\n");
        let texts: Vec<&str> = cards.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "a", "b"]);
    }

    #[test]
    fn load_missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = Deck::load(DeckKind::White, &tmp.path().join("white.txt")).unwrap_err();
        assert!(matches!(err, DeckError::NotFound(_)));
    }

    #[test]
    fn load_reads_cards() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("black.txt");
        fs::write(&path, "Why?<br>Because.\n\nWhat is ____?\n").unwrap();
        let deck = Deck::load(DeckKind::Black, &path).unwrap();
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.cards[0].paragraph_texts(), vec!["Why?", "Because."]);
        assert_eq!(deck.kind, DeckKind::Black);
    }

    // =========================================================================
    // inks
    // =========================================================================

    #[test]
    fn black_deck_is_white_on_black() {
        assert_eq!(DeckKind::Black.background(), Ink::Black);
        assert_eq!(DeckKind::Black.foreground(), Ink::White);
        assert_eq!(DeckKind::White.background(), Ink::White);
        assert_eq!(DeckKind::White.foreground(), Ink::Black);
    }

    // =========================================================================
    // discovery
    // =========================================================================

    #[test]
    fn directory_with_one_deck_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("white.txt"), "a\n").unwrap();
        let sources = DeckSources::from_directory(tmp.path()).unwrap();
        assert!(sources.black.is_none());
        assert_eq!(sources.white, Some(tmp.path().join("white.txt")));
        assert!(sources.icon.is_none());
    }

    #[test]
    fn directory_without_decks_is_none() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "a\n").unwrap();
        assert!(DeckSources::from_directory(tmp.path()).is_none());
    }

    #[test]
    fn icon_is_picked_up() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("black.txt"), "a\n").unwrap();
        fs::write(tmp.path().join("icon.png"), b"png").unwrap();
        let sources = DeckSources::from_directory(tmp.path()).unwrap();
        assert_eq!(sources.icon, Some(tmp.path().join("icon.png")));
    }

    #[test]
    fn discover_missing_root_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = discover_decks(&tmp.path().join("missing"), false).unwrap_err();
        assert!(matches!(err, DeckError::NotFound(_)));
    }

    #[test]
    fn discover_non_recursive_only_looks_at_root() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("nested");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("white.txt"), "a\n").unwrap();

        assert!(discover_decks(tmp.path(), false).unwrap().is_empty());
        assert_eq!(discover_decks(tmp.path(), true).unwrap().len(), 1);
    }

    #[test]
    fn discover_recursive_names_decks_after_directories() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("black.txt"), "a\n").unwrap();
        for name in ["b-expansion", "a-expansion"] {
            let dir = tmp.path().join(name);
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join("white.txt"), "a\n").unwrap();
        }
        fs::create_dir(tmp.path().join("empty")).unwrap();

        let decks = discover_decks(tmp.path(), true).unwrap();
        let names: Vec<&str> = decks.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(&names[1..], &["a-expansion", "b-expansion"]);
    }
}
