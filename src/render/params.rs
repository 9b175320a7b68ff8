//! Plain data handed to a [`DocumentBackend`](super::DocumentBackend).
//!
//! These types say *what* to draw and where; the backend decides how.
//! Positions are page coordinates in millimeters with the origin at the
//! bottom-left corner of the sheet. Font sizes are points.

use super::backend::RenderError;
use crate::layout::Run;
use std::path::Path;

/// The handful of colors a card sheet uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ink {
    Black,
    White,
    /// Thin trim guides around each card cell.
    CutLine,
}

impl Ink {
    /// RGB components in `0.0..=1.0`.
    pub fn rgb(self) -> (f64, f64, f64) {
        match self {
            Ink::Black => (0.0, 0.0, 0.0),
            Ink::White => (1.0, 1.0, 1.0),
            Ink::CutLine => (0.6, 0.6, 0.6),
        }
    }

    pub fn rgb8(self) -> [u8; 3] {
        let (r, g, b) = self.rgb();
        [r, g, b].map(|c| (c * 255.0).round() as u8)
    }
}

/// One line of styled runs, drawn left to right from its baseline origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub runs: Vec<Run>,
    pub x: f64,
    pub baseline: f64,
}

impl PlacedLine {
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A block of lines sharing one size and color.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub lines: Vec<PlacedLine>,
    pub size: f64,
    pub ink: Ink,
}

/// A decoded card icon, kept as straight RGBA.
#[derive(Debug, Clone, PartialEq)]
pub struct Icon {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Icon {
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let image = image::open(path)
            .map_err(|e| RenderError::Image(path.to_path_buf(), e.to_string()))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(RenderError::Image(
                path.to_path_buf(),
                "image has no pixels".to_string(),
            ));
        }
        Ok(Self {
            width,
            height,
            rgba: image.into_raw(),
        })
    }

    /// Width over height.
    pub fn aspect(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Composite over a solid background, dropping the alpha channel.
    pub fn flatten(&self, background: Ink) -> Vec<u8> {
        let bg = background.rgb8();
        self.rgba
            .chunks_exact(4)
            .flat_map(|px| {
                let alpha = px[3] as f64 / 255.0;
                [0, 1, 2].map(|i| {
                    (px[i] as f64 * alpha + bg[i] as f64 * (1.0 - alpha)).round() as u8
                })
            })
            .collect()
    }
}
