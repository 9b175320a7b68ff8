//! Page geometry and card placement.
//!
//! Everything here is pure arithmetic: no I/O, no drawing. The renderer asks
//! [`CardGeometry`] where each card goes and hands the answer to a
//! [`DocumentBackend`](crate::render::DocumentBackend).
//!
//! ## Coordinate system
//!
//! Lengths are millimeters. The origin is the bottom-left corner of the card
//! grid, with y growing upward (the PDF convention). A [`CardBox`] is anchored
//! at its *top-left* corner, so its bottom edge is `y - height`.
//!
//! ```text
//!   row 5 ┌────┬────┬────┬────┐   ← slot 0 sits under the top edge
//!         │ 0  │ 1  │ 2  │ 3  │
//!   row 4 ├────┼────┼────┼────┤
//!         │ 4  │ 5  │ 6  │ 7  │
//!     …   …    …    …    …    …
//!   row 0 └────┴────┴────┴────┘   ← y = 0
//! ```
//!
//! Rows are numbered from the bottom, so slot `s` lives in row
//! `cards_high - s / cards_across`, which is the row index of its *top* edge.

use serde::Serialize;
use thiserror::Error;

pub const MM_PER_INCH: f64 = 25.4;
pub const PT_PER_INCH: f64 = 72.0;

/// Default card edge for `--small`, in inches.
pub const SMALL_CARD_INCHES: (f64, f64) = (2.0, 2.0);
/// Default card edge for `--large`, in inches (poker size plus bleed).
pub const LARGE_CARD_INCHES: (f64, f64) = (2.74, 3.74);

/// Radius used when rounded corners are requested, in inches.
pub const CORNER_RADIUS_INCHES: f64 = 1.0 / 8.0;

pub fn inches_to_mm(inches: f64) -> f64 {
    inches * MM_PER_INCH
}

pub fn pt_to_mm(pt: f64) -> f64 {
    pt * MM_PER_INCH / PT_PER_INCH
}

pub fn mm_to_pt(mm: f64) -> f64 {
    mm * PT_PER_INCH / MM_PER_INCH
}

#[derive(Error, Debug, PartialEq)]
pub enum GeometryError {
    #[error("Invalid card geometry: {0}")]
    InvalidGeometry(String),
}

/// A physical sheet size in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaperSize {
    pub name: &'static str,
    pub width: f64,
    pub height: f64,
}

impl PaperSize {
    /// US Letter, 8.5" × 11".
    pub const LETTER: PaperSize = PaperSize {
        name: "LETTER",
        width: 8.5 * MM_PER_INCH,
        height: 11.0 * MM_PER_INCH,
    };
}

/// Fixed layout constants, passed into the calculator rather than read from globals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConstants {
    /// Sheet used when cards are laid out in a grid.
    pub paper: PaperSize,
    /// Inset applied on every side of a card box so text survives trimming.
    pub safe_margin: f64,
    /// Radius applied when rounded corners are requested.
    pub corner_radius: f64,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            paper: PaperSize::LETTER,
            // 0.24in plus 4pt
            safe_margin: inches_to_mm(0.24) + pt_to_mm(4.0),
            corner_radius: inches_to_mm(CORNER_RADIUS_INCHES),
        }
    }
}

/// Derived page layout for one run.
///
/// Built once from the requested card size and flags; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardGeometry {
    pub card_width: f64,
    pub card_height: f64,
    /// `Some(radius)` when rounded corners were requested.
    pub corner_radius: Option<f64>,
    pub one_per_page: bool,
    pub paper_width: f64,
    pub paper_height: f64,
    pub cards_across: u32,
    pub cards_high: u32,
    /// Width of the card grid (`cards_across * card_width`).
    pub page_width: f64,
    /// Height of the card grid (`cards_high * card_height`).
    pub page_height: f64,
    pub margin_left: f64,
    pub margin_top: f64,
    pub safe_margin: f64,
}

/// A rectangle for one card slot, anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CardBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CardBox {
    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y - self.height
    }

    /// Strict overlap test; boxes that merely share an edge do not overlap.
    pub fn overlaps(&self, other: &CardBox) -> bool {
        const EPS: f64 = 1e-9;
        self.left() < other.right() - EPS
            && other.left() < self.right() - EPS
            && self.bottom() < other.top() - EPS
            && other.bottom() < self.top() - EPS
    }
}

impl CardGeometry {
    /// Compute the layout for a card of the given size in inches using the
    /// stock [`LayoutConstants`].
    ///
    /// # Examples
    /// ```
    /// # use bbcards::geometry::CardGeometry;
    /// let g = CardGeometry::compute(2.0, 2.0, false, false);
    /// assert_eq!((g.cards_across, g.cards_high), (4, 5));
    /// ```
    pub fn compute(
        card_width_in: f64,
        card_height_in: f64,
        rounded_corners: bool,
        one_per_page: bool,
    ) -> Self {
        Self::compute_with(
            card_width_in,
            card_height_in,
            rounded_corners,
            one_per_page,
            &LayoutConstants::default(),
        )
    }

    pub fn compute_with(
        card_width_in: f64,
        card_height_in: f64,
        rounded_corners: bool,
        one_per_page: bool,
        constants: &LayoutConstants,
    ) -> Self {
        let card_width = inches_to_mm(card_width_in);
        let card_height = inches_to_mm(card_height_in);

        let (paper_width, paper_height) = if one_per_page {
            (card_width, card_height)
        } else {
            (constants.paper.width, constants.paper.height)
        };

        let cards_across = grid_count(paper_width, card_width);
        let cards_high = grid_count(paper_height, card_height);

        let page_width = card_width * cards_across as f64;
        let page_height = card_height * cards_high as f64;

        Self {
            card_width,
            card_height,
            corner_radius: rounded_corners.then_some(constants.corner_radius),
            one_per_page,
            paper_width,
            paper_height,
            cards_across,
            cards_high,
            page_width,
            page_height,
            margin_left: (paper_width - page_width) / 2.0,
            margin_top: (paper_height - page_height) / 2.0,
            safe_margin: constants.safe_margin,
        }
    }

    /// Reject layouts that would produce an empty or inverted document.
    pub fn validate(&self) -> Result<(), GeometryError> {
        for (label, value) in [("width", self.card_width), ("height", self.card_height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GeometryError::InvalidGeometry(format!(
                    "card {label} must be positive, got {value:.2}mm"
                )));
            }
        }
        if self.cards_across == 0 || self.cards_high == 0 {
            return Err(GeometryError::InvalidGeometry(format!(
                "a {:.1}mm x {:.1}mm card does not fit on {:.1}mm x {:.1}mm paper",
                self.card_width, self.card_height, self.paper_width, self.paper_height
            )));
        }
        let min_edge = self.safe_margin * 2.0;
        if self.card_width <= min_edge || self.card_height <= min_edge {
            return Err(GeometryError::InvalidGeometry(format!(
                "cards must be larger than {min_edge:.1}mm on each side to leave a printable area"
            )));
        }
        Ok(())
    }

    pub fn slots_per_page(&self) -> usize {
        self.cards_across as usize * self.cards_high as usize
    }

    /// Number of pages needed for `card_count` cards.
    pub fn page_count(&self, card_count: usize) -> usize {
        match self.slots_per_page() {
            0 => 0,
            slots => card_count.div_ceil(slots),
        }
    }

    /// Map a position in the deck to `(page, slot)`, both zero-based.
    pub fn page_and_slot(&self, deck_position: usize) -> (usize, usize) {
        let slots = self.slots_per_page().max(1);
        (deck_position / slots, deck_position % slots)
    }

    /// `(column, row)` of a slot, with rows counted from the bottom.
    ///
    /// The row is the grid line at the slot's top edge, so slot 0 is in row
    /// `cards_high`. Rows go negative for slots past the end of the page.
    pub fn column_and_row(&self, slot: usize) -> (u32, i64) {
        let across = self.cards_across.max(1) as usize;
        let column = (slot % across) as u32;
        let row = self.cards_high as i64 - (slot / across) as i64;
        (column, row)
    }

    /// Full cell for a slot, without the safe-print inset.
    pub fn cell_for(&self, slot: usize) -> CardBox {
        let (column, row) = self.column_and_row(slot);
        CardBox {
            x: self.card_width * column as f64,
            y: self.card_height * row as f64,
            width: self.card_width,
            height: self.card_height,
        }
    }

    /// Printable box for a slot: the cell inset by the safe margin on all sides.
    pub fn box_for(&self, slot: usize) -> CardBox {
        let cell = self.cell_for(slot);
        CardBox {
            x: cell.x + self.safe_margin,
            y: cell.y - self.safe_margin,
            width: self.card_width - self.safe_margin * 2.0,
            height: self.card_height - self.safe_margin * 2.0,
        }
    }

    /// Translate a grid-relative box into page coordinates.
    pub fn to_page(&self, card_box: CardBox) -> CardBox {
        CardBox {
            x: card_box.x + self.margin_left,
            y: card_box.y + self.margin_top,
            ..card_box
        }
    }
}

fn grid_count(paper: f64, card: f64) -> u32 {
    if !card.is_finite() || card <= 0.0 || !paper.is_finite() {
        return 0;
    }
    (paper / card).floor().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn safe_margin() -> f64 {
        LayoutConstants::default().safe_margin
    }

    // =========================================================================
    // compute
    // =========================================================================

    #[test]
    fn small_cards_on_letter() {
        let g = CardGeometry::compute(2.0, 2.0, false, false);
        assert_eq!(g.cards_across, 4);
        assert_eq!(g.cards_high, 5);
        assert!(approx(g.card_width, 50.8));
        assert!(approx(g.paper_width, 215.9));
        assert!(approx(g.paper_height, 279.4));
        assert!(approx(g.page_width, 203.2));
        assert!(approx(g.page_height, 254.0));
        assert!(approx(g.margin_left, 6.35));
        assert!(approx(g.margin_top, 12.7));
        assert_eq!(g.corner_radius, None);
    }

    #[test]
    fn large_cards_on_letter() {
        let g = CardGeometry::compute(2.74, 3.74, false, false);
        assert_eq!((g.cards_across, g.cards_high), (3, 2));
        assert!(g.margin_left > 0.0);
        assert!(g.margin_top > 0.0);
    }

    #[test]
    fn one_per_page_uses_card_as_paper() {
        let g = CardGeometry::compute(2.74, 3.74, false, true);
        assert_eq!((g.cards_across, g.cards_high), (1, 1));
        assert!(approx(g.paper_width, g.card_width));
        assert!(approx(g.paper_height, g.card_height));
        assert!(approx(g.margin_left, 0.0));
        assert!(approx(g.margin_top, 0.0));
    }

    #[test]
    fn rounded_corners_use_eighth_inch_radius() {
        let g = CardGeometry::compute(2.0, 2.0, true, false);
        assert!(approx(g.corner_radius.unwrap(), 3.175));
    }

    #[test]
    fn compute_is_deterministic() {
        let a = CardGeometry::compute(2.5, 3.5, true, false);
        let b = CardGeometry::compute(2.5, 3.5, true, false);
        assert_eq!(a, b);
    }

    #[test]
    fn injected_paper_size_is_respected() {
        let a4 = PaperSize {
            name: "A4",
            width: 210.0,
            height: 297.0,
        };
        let constants = LayoutConstants {
            paper: a4,
            ..LayoutConstants::default()
        };
        let g = CardGeometry::compute_with(2.0, 2.0, false, false, &constants);
        assert_eq!((g.cards_across, g.cards_high), (4, 5));
        assert!(approx(g.paper_width, 210.0));
    }

    #[test]
    fn grid_and_margins_hold_for_every_card_that_fits() {
        let mut w = 0.7;
        while w <= 8.5 {
            let mut h = 0.7;
            while h <= 11.0 {
                let g = CardGeometry::compute(w, h, false, false);
                assert!(g.cards_across >= 1, "{w}x{h}");
                assert!(g.cards_high >= 1, "{w}x{h}");
                assert!(g.margin_left >= 0.0, "{w}x{h}");
                assert!(g.margin_top >= 0.0, "{w}x{h}");
                assert!(approx(g.margin_left * 2.0 + g.page_width, g.paper_width));
                assert!(approx(g.margin_top * 2.0 + g.page_height, g.paper_height));
                h += 0.35;
            }
            w += 0.35;
        }
    }

    // =========================================================================
    // validate
    // =========================================================================

    #[test]
    fn valid_geometry_passes() {
        assert!(CardGeometry::compute(2.0, 2.0, false, false).validate().is_ok());
        assert!(CardGeometry::compute(2.74, 3.74, true, true).validate().is_ok());
    }

    #[test]
    fn card_wider_than_paper_is_rejected() {
        let g = CardGeometry::compute(9.0, 2.0, false, false);
        assert_eq!(g.cards_across, 0);
        assert!(matches!(g.validate(), Err(GeometryError::InvalidGeometry(_))));
    }

    #[test]
    fn card_taller_than_paper_is_rejected() {
        let g = CardGeometry::compute(2.0, 12.0, false, false);
        assert_eq!(g.cards_high, 0);
        assert!(g.validate().is_err());
    }

    #[test]
    fn zero_and_negative_sizes_are_rejected() {
        assert!(CardGeometry::compute(0.0, 2.0, false, false).validate().is_err());
        assert!(CardGeometry::compute(2.0, -1.0, false, false).validate().is_err());
    }

    #[test]
    fn card_smaller_than_safe_area_is_rejected() {
        let g = CardGeometry::compute(0.5, 0.5, false, false);
        assert!(g.cards_across > 0);
        assert!(g.validate().is_err());
    }

    // =========================================================================
    // placement
    // =========================================================================

    #[test]
    fn first_slot_is_top_left() {
        let g = CardGeometry::compute(2.0, 2.0, false, false);
        assert_eq!(g.column_and_row(0), (0, 5));
        let b = g.box_for(0);
        assert!(approx(b.x, safe_margin()));
        assert!(approx(b.y, 5.0 * g.card_height - safe_margin()));
        assert!(approx(b.width, g.card_width - 2.0 * safe_margin()));
        assert!(approx(b.height, g.card_height - 2.0 * safe_margin()));
    }

    #[test]
    fn slots_fill_rows_left_to_right_then_downward() {
        let g = CardGeometry::compute(2.0, 2.0, false, false);
        assert_eq!(g.column_and_row(3), (3, 5));
        assert_eq!(g.column_and_row(4), (0, 4));
        assert_eq!(g.column_and_row(19), (3, 1));
        let last = g.cell_for(19);
        assert!(approx(last.bottom(), 0.0));
        assert!(approx(last.right(), g.page_width));
    }

    #[test]
    fn slots_tile_the_grid_without_overlap() {
        let g = CardGeometry::compute(2.0, 2.0, false, false);
        let cells: Vec<CardBox> = (0..g.slots_per_page()).map(|s| g.cell_for(s)).collect();
        let boxes: Vec<CardBox> = (0..g.slots_per_page()).map(|s| g.box_for(s)).collect();

        for i in 0..cells.len() {
            for j in (i + 1)..cells.len() {
                assert!(!cells[i].overlaps(&cells[j]), "cells {i} and {j} overlap");
                assert!(!boxes[i].overlaps(&boxes[j]), "boxes {i} and {j} overlap");
            }
        }

        let covered: f64 = cells.iter().map(|c| c.width * c.height).sum();
        assert!(approx(covered, g.page_width * g.page_height));

        for (cell, b) in cells.iter().zip(&boxes) {
            assert!(b.left() > cell.left() && b.right() < cell.right());
            assert!(b.bottom() > cell.bottom() && b.top() < cell.top());
            assert!(cell.left() >= 0.0 && cell.bottom() >= -1e-9);
            assert!(cell.right() <= g.page_width + 1e-9);
            assert!(cell.top() <= g.page_height + 1e-9);
        }
    }

    #[test]
    fn out_of_range_slot_lands_below_the_sheet() {
        let g = CardGeometry::compute(2.0, 2.0, false, false);
        let b = g.box_for(g.slots_per_page());
        assert!(b.top() < 0.0);
    }

    #[test]
    fn to_page_adds_margins() {
        let g = CardGeometry::compute(2.0, 2.0, false, false);
        let b = g.to_page(g.box_for(0));
        assert!(approx(b.x, g.margin_left + safe_margin()));
        assert!(approx(b.y, g.margin_top + g.page_height - safe_margin()));
        assert!(b.top() < g.paper_height);
    }

    // =========================================================================
    // pagination
    // =========================================================================

    #[test]
    fn twenty_three_cards_take_two_pages() {
        let g = CardGeometry::compute(2.0, 2.0, false, false);
        assert_eq!(g.slots_per_page(), 20);
        assert_eq!(g.page_count(23), 2);
        assert_eq!(g.page_and_slot(19), (0, 19));
        assert_eq!(g.page_and_slot(20), (1, 0));
        assert_eq!(g.page_and_slot(22), (1, 2));
    }

    #[test]
    fn page_count_edges() {
        let g = CardGeometry::compute(2.0, 2.0, false, false);
        assert_eq!(g.page_count(0), 0);
        assert_eq!(g.page_count(1), 1);
        assert_eq!(g.page_count(20), 1);
        assert_eq!(g.page_count(21), 2);
    }

    #[test]
    fn unit_conversions_round_trip() {
        assert!(approx(mm_to_pt(25.4), 72.0));
        assert!(approx(pt_to_mm(72.0), 25.4));
        assert!(approx(inches_to_mm(2.0), 50.8));
    }
}
