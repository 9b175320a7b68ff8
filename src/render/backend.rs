//! Drawing backend trait and shared error type.
//!
//! [`DocumentBackend`] is the whole contract between the card layout code and
//! whatever produces the document: start a page, paint shapes, text and
//! images onto it, measure text, and serialize. The production
//! implementation is [`PdfBackend`](super::pdf_backend::PdfBackend).

use super::params::{Icon, Ink, PlacedText};
use crate::fonts::FontStyle;
use crate::geometry::CardBox;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Font error: {0}")]
    Font(String),
    #[error("Unknown font family '{0}' (available: {1})")]
    UnknownFamily(String, String),
    #[error("Cannot load image {0}: {1}")]
    Image(PathBuf, String),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("Document has no pages")]
    EmptyDocument,
}

/// Everything the card renderer needs from a document producer.
pub trait DocumentBackend {
    /// Start a new page of the given size (mm). Drawing goes to the newest page.
    fn begin_page(&mut self, width: f64, height: f64) -> Result<(), RenderError>;

    /// Paint the whole current page.
    fn fill_page(&mut self, ink: Ink) -> Result<(), RenderError>;

    /// Outline a rectangle, optionally with rounded corners.
    fn stroke_rect(
        &mut self,
        rect: CardBox,
        corner_radius: Option<f64>,
        ink: Ink,
    ) -> Result<(), RenderError>;

    /// Draw pre-positioned lines of text, switching faces between runs.
    fn draw_text(&mut self, text: &PlacedText) -> Result<(), RenderError>;

    /// Draw an image stretched to `rect`, composited over `background`.
    fn draw_image(&mut self, icon: &Icon, rect: CardBox, background: Ink)
    -> Result<(), RenderError>;

    /// Advance width of `text` in points.
    fn text_width(&self, text: &str, style: FontStyle, size: f64) -> f64;

    /// Serialize the finished document.
    fn finish(self) -> Result<Vec<u8>, RenderError>;
}
