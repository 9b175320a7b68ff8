//! CLI output formatting for a run.
//!
//! # Output Format
//!
//! ```text
//! party
//!     black  12 cards   1 page   → out/black_card.pdf
//!     white  45 cards   3 pages  → out/white_card.pdf
//! expansion
//!     white   0 cards            (empty, skipped)
//!
//! Generated 2 documents, 57 cards, 4 pages
//! ```
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::generate::{DeckReport, RunReport};

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn deck_line(deck: &DeckReport) -> String {
    let counts = format!(
        "{} {:>9}",
        deck.kind.label(),
        plural(deck.cards, "card")
    );
    if deck.skipped {
        return format!("{}{counts}            (empty, skipped)", indent(1));
    }
    let mut line = format!("{}{counts} {:>8}", indent(1), plural(deck.pages, "page"));
    if let Some(path) = &deck.output {
        line.push_str(&format!("  → {}", path.display()));
    }
    if deck.clipped_cards > 0 {
        line.push_str(&format!(" ({} clipped)", deck.clipped_cards));
    }
    line
}

/// Format the run summary, grouped by deck directory.
pub fn format_run_report(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<&str> = None;

    for deck in &report.decks {
        if current != Some(deck.deck.as_str()) {
            lines.push(deck.deck.clone());
            current = Some(deck.deck.as_str());
        }
        lines.push(deck_line(deck));
    }

    let written: Vec<&DeckReport> = report.decks.iter().filter(|d| !d.skipped).collect();
    let cards: usize = written.iter().map(|d| d.cards).sum();
    let pages: usize = written.iter().map(|d| d.pages).sum();
    lines.push(String::new());
    lines.push(format!(
        "Generated {}, {}, {}",
        plural(written.len(), "document"),
        plural(cards, "card"),
        plural(pages, "page")
    ));
    lines
}

pub fn print_run_report(report: &RunReport) {
    for line in format_run_report(report) {
        println!("{}", line);
    }
}

/// The report as pretty JSON for `--json`.
pub fn format_run_report_json(report: &RunReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}
