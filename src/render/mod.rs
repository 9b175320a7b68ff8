//! Card sheet rendering.
//!
//! | Concern | Where |
//! |---|---|
//! | **Contract** | [`DocumentBackend`] trait, [`RenderError`] |
//! | **Draw data** | [`Ink`], [`PlacedText`], [`Icon`] |
//! | **PDF output** | [`PdfBackend`] on `printpdf`, faces loaded up front in [`FontFaces`] |
//! | **Text metrics** | [`FaceMetrics`]: `skrifa` for font files, width classes for built-ins |
//! | **Decks** | [`render_deck`]: pagination, cut lines, fitted text, icons, backs |
//!
//! The split mirrors the rest of the crate: geometry and text fitting are
//! pure, the backend is the only place that touches a document.

pub mod backend;
pub mod metrics;
pub mod operations;
mod params;
pub mod pdf_backend;

pub use backend::{DocumentBackend, RenderError};
pub use metrics::FaceMetrics;
pub use operations::{CardStyle, DeckStats, render_deck};
pub use params::{Icon, Ink, PlacedLine, PlacedText};
pub use pdf_backend::{FontFaces, PdfBackend};
