//! Word wrapping and shrink-to-fit for card text.
//!
//! Pure functions over a [`TextMeasure`]; the backend supplies the real font
//! metrics, tests supply a fixed-advance stand-in.
//!
//! Sizes and widths are in points. A block of `n` lines at size `s` with
//! spacing `k` is `s + (n - 1) * s * k` tall: one full em for the first line
//! and one line advance for every line after it.

use crate::fonts::FontStyle;
use log::warn;

/// Anything that can tell how wide a run of text is.
pub trait TextMeasure {
    /// Advance width of `text` in `style` at `size` points, in points.
    fn text_width(&self, text: &str, style: FontStyle, size: f64) -> f64;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, FontStyle, f64) -> f64,
{
    fn text_width(&self, text: &str, style: FontStyle, size: f64) -> f64 {
        self(text, style, size)
    }
}

/// Text drawn in one face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub style: FontStyle,
}

impl Run {
    pub fn new(text: &str, style: FontStyle) -> Self {
        Self {
            text: text.to_string(),
            style,
        }
    }
}

/// One line of styled runs. Adjacent runs never share a style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub runs: Vec<Run>,
}

impl Line {
    /// The line's text without styling.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }

    pub fn width(&self, size: f64, measure: &impl TextMeasure) -> f64 {
        self.runs
            .iter()
            .map(|r| measure.text_width(&r.text, r.style, size))
            .sum()
    }

    fn char_count(&self) -> usize {
        self.runs.iter().map(|r| r.text.chars().count()).sum()
    }

    fn last_style(&self) -> Option<FontStyle> {
        self.runs.last().map(|r| r.style)
    }

    fn push_str(&mut self, text: &str, style: FontStyle) {
        if text.is_empty() {
            return;
        }
        match self.runs.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.runs.push(Run::new(text, style)),
        }
    }

    fn push_char(&mut self, ch: char, style: FontStyle) {
        let mut buf = [0u8; 4];
        self.push_str(ch.encode_utf8(&mut buf), style);
    }

    fn pop_char(&mut self) {
        if let Some(last) = self.runs.last_mut() {
            last.text.pop();
            if last.text.is_empty() {
                self.runs.pop();
            }
        }
    }

    fn append(&mut self, other: &Line) {
        for run in &other.runs {
            self.push_str(&run.text, run.style);
        }
    }
}

/// Limits for [`shrink_to_fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitParams {
    /// Starting font size.
    pub max_size: f64,
    /// Smallest size tried before clipping.
    pub min_size: f64,
    /// Decrement between attempts.
    pub step: f64,
    /// Line advance as a multiple of the font size.
    pub line_spacing: f64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            max_size: 30.0,
            min_size: 6.0,
            step: 0.5,
            line_spacing: 0.9,
        }
    }
}

/// Text laid out at one size.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub font_size: f64,
    /// Distance between consecutive baselines.
    pub line_height: f64,
    pub lines: Vec<Line>,
    /// Lines were dropped because even `min_size` overflowed.
    pub clipped: bool,
}

impl TextBlock {
    pub fn height(&self) -> f64 {
        block_height(self.lines.len(), self.font_size, self.line_height)
    }
}

fn block_height(lines: usize, size: f64, line_height: f64) -> f64 {
    match lines {
        0 => 0.0,
        n => size + (n - 1) as f64 * line_height,
    }
}

/// Split runs into whitespace-separated words, keeping each character's style.
fn words(paragraph: &[Run]) -> Vec<Line> {
    let mut words = Vec::new();
    let mut word = Line::default();
    for run in paragraph {
        for ch in run.text.chars() {
            if ch.is_whitespace() {
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            } else {
                word.push_char(ch, run.style);
            }
        }
    }
    if !word.is_empty() {
        words.push(word);
    }
    words
}

/// Wrap one paragraph to `max_width`.
///
/// Words wider than the line are broken between characters. An empty
/// paragraph yields a single empty line so forced breaks stay visible.
/// The space between two words takes the style of the word before it.
pub fn wrap_paragraph(
    paragraph: &[Run],
    max_width: f64,
    size: f64,
    measure: &impl TextMeasure,
) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = Line::default();

    for word in words(paragraph) {
        let mut candidate = current.clone();
        if let Some(style) = candidate.last_style() {
            candidate.push_str(" ", style);
        }
        candidate.append(&word);
        if candidate.width(size, measure) <= max_width {
            current = candidate;
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if word.width(size, measure) <= max_width {
            current = word;
        } else {
            let mut pieces = break_word(&word, max_width, size, measure);
            current = pieces.pop().unwrap_or_default();
            lines.extend(pieces);
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

fn break_word(word: &Line, max_width: f64, size: f64, measure: &impl TextMeasure) -> Vec<Line> {
    let mut pieces = Vec::new();
    let mut piece = Line::default();
    for run in &word.runs {
        for ch in run.text.chars() {
            piece.push_char(ch, run.style);
            if piece.width(size, measure) > max_width && piece.char_count() > 1 {
                piece.pop_char();
                pieces.push(std::mem::take(&mut piece));
                piece.push_char(ch, run.style);
            }
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Wrap every paragraph at `size`.
pub fn wrap_paragraphs(
    paragraphs: &[Vec<Run>],
    max_width: f64,
    size: f64,
    measure: &impl TextMeasure,
) -> Vec<Line> {
    paragraphs
        .iter()
        .flat_map(|p| wrap_paragraph(p, max_width, size, measure))
        .collect()
}

/// Find the largest size in `[min_size, max_size]` at which the paragraphs
/// fit a `width` × `height` box.
///
/// If nothing fits at `min_size`, the block is returned at `min_size` with
/// the overflowing lines dropped and `clipped` set.
pub fn shrink_to_fit(
    paragraphs: &[Vec<Run>],
    width: f64,
    height: f64,
    params: &FitParams,
    measure: &impl TextMeasure,
) -> TextBlock {
    let step = if params.step > 0.0 { params.step } else { 0.5 };
    let mut size = params.max_size.max(params.min_size);

    loop {
        let line_height = size * params.line_spacing;
        let lines = wrap_paragraphs(paragraphs, width, size, measure);
        let fits_width = lines.iter().all(|l| l.width(size, measure) <= width);
        if fits_width && block_height(lines.len(), size, line_height) <= height {
            return TextBlock {
                font_size: size,
                line_height,
                lines,
                clipped: false,
            };
        }

        if size <= params.min_size {
            return clip(lines, size, line_height, height);
        }
        size = (size - step).max(params.min_size);
    }
}

fn clip(mut lines: Vec<Line>, size: f64, line_height: f64, height: f64) -> TextBlock {
    let keep = if height < size || line_height <= 0.0 {
        1
    } else {
        (((height - size) / line_height).floor() as usize + 1).max(1)
    };
    let clipped = lines.len() > keep;
    if clipped {
        warn!(
            "card text does not fit at {size}pt, dropping {} line(s)",
            lines.len() - keep
        );
        lines.truncate(keep);
    }
    TextBlock {
        font_size: size,
        line_height,
        lines,
        clipped,
    }
}
