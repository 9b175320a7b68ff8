//! Deck rendering.
//!
//! Combines [`CardGeometry`] placement and [`layout`](crate::layout) text
//! fitting, and drives a [`DocumentBackend`] page by page. Nothing here knows
//! about files or PDF; the caller owns the backend and serializes it.

use super::backend::{DocumentBackend, RenderError};
use super::params::{Icon, Ink, PlacedLine, PlacedText};
use crate::deck::{Card, DeckKind};
use crate::fonts::FontStyle;
use crate::geometry::{CardBox, CardGeometry, mm_to_pt, pt_to_mm};
use crate::layout::{FitParams, Run, TextBlock, shrink_to_fit};
use log::debug;
use serde::Serialize;

pub type Result<T> = std::result::Result<T, RenderError>;

/// Baseline of the first line sits this many ems below the box top.
const ASCENT: f64 = 0.8;
/// Space between the text area and the icon, in mm.
const ICON_GAP: f64 = 1.0;

/// How card faces are drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct CardStyle {
    /// Base face; markup emphasis is added on top of it.
    pub font_style: FontStyle,
    pub fit: FitParams,
    /// Icon height in mm.
    pub icon_size: f64,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            font_style: FontStyle::Bold,
            fit: FitParams::default(),
            icon_size: 0.3 * crate::geometry::MM_PER_INCH,
        }
    }
}

/// What one deck render produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeckStats {
    pub cards: usize,
    pub pages: usize,
    /// Cards whose text was cut off at the minimum font size.
    pub clipped_cards: usize,
}

/// Draw every card of a deck, plus an optional page of card backs.
///
/// An empty deck draws nothing and reports zero pages.
pub fn render_deck(
    backend: &mut impl DocumentBackend,
    geometry: &CardGeometry,
    kind: DeckKind,
    cards: &[Card],
    style: &CardStyle,
    icon: Option<&Icon>,
    back: Option<&Card>,
) -> Result<DeckStats> {
    let mut stats = DeckStats {
        cards: cards.len(),
        ..DeckStats::default()
    };
    if cards.is_empty() {
        return Ok(stats);
    }

    for (position, card) in cards.iter().enumerate() {
        let (_, slot) = geometry.page_and_slot(position);
        if slot == 0 {
            start_page(backend, geometry, kind)?;
            stats.pages += 1;
        }
        if draw_card(backend, geometry, slot, card, kind, style, icon)? {
            stats.clipped_cards += 1;
        }
    }

    if let Some(back) = back {
        start_page(backend, geometry, kind)?;
        stats.pages += 1;
        for slot in 0..geometry.slots_per_page() {
            draw_card(backend, geometry, slot, back, kind, style, None)?;
        }
    }

    debug!(
        "{} deck: {} cards on {} pages",
        kind.label(),
        stats.cards,
        stats.pages
    );
    Ok(stats)
}

fn start_page(
    backend: &mut impl DocumentBackend,
    geometry: &CardGeometry,
    kind: DeckKind,
) -> Result<()> {
    backend.begin_page(geometry.paper_width, geometry.paper_height)?;
    backend.fill_page(kind.background())
}

/// Draw one card into `slot`. Returns whether its text was clipped.
fn draw_card(
    backend: &mut impl DocumentBackend,
    geometry: &CardGeometry,
    slot: usize,
    card: &Card,
    kind: DeckKind,
    style: &CardStyle,
    icon: Option<&Icon>,
) -> Result<bool> {
    let cell = geometry.to_page(geometry.cell_for(slot));
    backend.stroke_rect(cell, geometry.corner_radius, Ink::CutLine)?;

    let area = geometry.to_page(geometry.box_for(slot));
    let icon_rect = icon.map(|icon| icon_rect(area, icon, style.icon_size));
    let text_height = match icon_rect {
        Some(rect) => (area.height - rect.height - ICON_GAP).max(0.0),
        None => area.height,
    };

    let paragraphs = styled_paragraphs(card, style.font_style);
    let block = {
        let measure = |text: &str, face: FontStyle, size: f64| backend.text_width(text, face, size);
        shrink_to_fit(
            &paragraphs,
            mm_to_pt(area.width),
            mm_to_pt(text_height),
            &style.fit,
            &measure,
        )
    };

    if !block.lines.is_empty() {
        backend.draw_text(&place_block(&block, area, kind.foreground()))?;
    }
    if let (Some(icon), Some(rect)) = (icon, icon_rect) {
        backend.draw_image(icon, rect, kind.background())?;
    }
    Ok(block.clipped)
}

/// Resolve each span's emphasis against the base face.
fn styled_paragraphs(card: &Card, base: FontStyle) -> Vec<Vec<Run>> {
    card.paragraphs
        .iter()
        .map(|spans| {
            spans
                .iter()
                .map(|span| Run::new(&span.text, span.emphasis.apply(base)))
                .collect()
        })
        .collect()
}

/// Position lines top-down from the box's top-left corner.
fn place_block(block: &TextBlock, area: CardBox, ink: Ink) -> PlacedText {
    let first = area.top() - pt_to_mm(block.font_size * ASCENT);
    let advance = pt_to_mm(block.line_height);
    PlacedText {
        lines: block
            .lines
            .iter()
            .enumerate()
            .map(|(i, line)| PlacedLine {
                runs: line.runs.clone(),
                x: area.left(),
                baseline: first - advance * i as f64,
            })
            .collect(),
        size: block.font_size,
        ink,
    }
}

/// Icon box in the lower-left corner of `area`, `size` mm tall.
fn icon_rect(area: CardBox, icon: &Icon, size: f64) -> CardBox {
    let height = size.min(area.height);
    let width = (height * icon.aspect()).min(area.width);
    let height = width / icon.aspect();
    CardBox {
        x: area.left(),
        y: area.bottom() + height,
        width,
        height,
    }
}
