//! Text advance widths for layout.
//!
//! | Face | Source |
//! |---|---|
//! | TrueType / OpenType file | `skrifa` horizontal metrics via the font's charmap |
//! | PDF built-in (Helvetica, Times, Courier) | width classes close to the standard AFM widths |
//!
//! Built-in faces are not embedded, so there is no font program to read.
//! The width classes are within a few percent of the real Helvetica widths,
//! which is plenty for choosing a shrink-to-fit size.

use super::backend::RenderError;
use crate::fonts::{BuiltinFamily, FontStyle};
use skrifa::instance::{LocationRef, Size};
use skrifa::{FontRef, GlyphId, MetadataProvider};
use std::sync::Arc;

/// How one face measures text.
#[derive(Debug, Clone)]
pub enum FaceMetrics {
    Builtin { family: BuiltinFamily, style: FontStyle },
    /// Raw font file bytes, validated on construction and shared between styles.
    File(Arc<Vec<u8>>),
}

impl FaceMetrics {
    /// Wrap font file bytes, failing early if `skrifa` cannot parse them.
    pub fn from_font_data(data: Vec<u8>) -> Result<Self, RenderError> {
        FontRef::new(&data).map_err(|e| RenderError::Font(e.to_string()))?;
        Ok(Self::File(Arc::new(data)))
    }

    /// Advance width of `text` at `size` points, in points.
    pub fn text_width(&self, text: &str, size: f64) -> f64 {
        match self {
            FaceMetrics::Builtin { family, style } => {
                let units: f64 = text
                    .chars()
                    .map(|c| builtin_char_width(*family, *style, c))
                    .sum();
                units * size / 1000.0
            }
            FaceMetrics::File(data) => file_text_width(data.as_slice(), text, size),
        }
    }
}

fn file_text_width(data: &[u8], text: &str, size: f64) -> f64 {
    let Ok(font) = FontRef::new(data) else {
        return 0.0;
    };
    let charmap = font.charmap();
    let metrics = font.glyph_metrics(Size::new(size as f32), LocationRef::default());
    text.chars()
        .map(|c| {
            let glyph = charmap.map(c).unwrap_or(GlyphId::NOTDEF);
            metrics.advance_width(glyph).unwrap_or(0.0) as f64
        })
        .sum()
}

/// Approximate width of `c` in 1/1000 em for a base-14 face.
pub fn builtin_char_width(family: BuiltinFamily, style: FontStyle, c: char) -> f64 {
    if family == BuiltinFamily::Courier {
        return 600.0;
    }

    let base = match c {
        ' ' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' => 278.0,
        'i' | 'j' | 'l' => 222.0,
        'f' | 't' | 'r' | 'I' | '(' | ')' | '[' | ']' | '-' | '"' => 333.0,
        'm' => 833.0,
        'w' => 722.0,
        'M' => 833.0,
        'W' => 944.0,
        '_' | '0'..='9' | '$' | '?' => 556.0,
        'C' | 'D' | 'G' | 'H' | 'N' | 'O' | 'Q' | 'R' | 'U' => 722.0,
        'A'..='Z' => 667.0,
        'a'..='z' => 556.0,
        '@' => 1015.0,
        '%' => 889.0,
        '&' => 667.0,
        c if c.is_whitespace() => 278.0,
        _ => 556.0,
    };

    let weight = if style.is_bold() { 1.06 } else { 1.0 };
    let family_scale = match family {
        BuiltinFamily::Times => 0.9,
        _ => 1.0,
    };
    base * weight * family_scale
}
