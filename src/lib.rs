//! # bbcards
//!
//! Printable PDF sheets of black and white party-game cards. Each deck is a
//! text file with one card per line; the output is one PDF per deck with the
//! cards laid out in a grid, ready to print and cut.
//!
//! # Architecture: Plan, Render, Write
//!
//! ```text
//! 1. Plan     flags + config.toml + deck files  →  DeckJob       (validation)
//! 2. Render   DeckJob                           →  PDF bytes     (DocumentBackend)
//! 3. Write    PDF bytes                         →  files / stdout
//! ```
//!
//! Every input is resolved and checked in the plan step (geometry, fonts,
//! deck files, icon), so a bad input never leaves half the output behind.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Grid size, margins, safe-print inset and slot placement; pure arithmetic |
//! | [`fonts`] | Font directory scan, `Family_Bold_Italic.ttf` naming, style fallback |
//! | [`deck`] | Deck file parsing, `<br>` breaks, deck directory discovery |
//! | [`markup`] | `<b>`/`<i>` card markup into emphasis spans |
//! | [`layout`] | Word wrap and shrink-to-fit of styled runs over a text measure |
//! | [`render`] | [`render::DocumentBackend`] trait, `printpdf` backend, deck drawing |
//! | [`config`] | Layered `config.toml` loading, validation, and CLI overrides |
//! | [`generate`] | The plan/render/write pipeline and its error type |
//! | [`output`] | CLI summary formatting |
//!
//! # Design Decisions
//!
//! ## Backend Behind a Trait
//!
//! The deck renderer only talks to [`render::DocumentBackend`]. Tests record
//! drawing calls with a mock backend and assert on pages, boxes, and text
//! without producing or parsing a PDF.
//!
//! ## Built-in Fonts First
//!
//! Helvetica, Times and Courier are the PDF base-14 families and need no
//! font files. Custom families from a font directory are added next to them
//! and never replace a name that is already registered.
//!
//! ## Geometry as Data
//!
//! Paper size, safe margin and corner radius live in
//! [`geometry::LayoutConstants`] and are passed in, so every layout rule can
//! be checked with plain numbers.

pub mod config;
pub mod deck;
pub mod fonts;
pub mod generate;
pub mod geometry;
pub mod layout;
pub mod markup;
pub mod output;
pub mod render;

#[cfg(test)]
pub(crate) mod test_helpers;
