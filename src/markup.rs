//! Inline card markup.
//!
//! Card text may carry a few HTML-like tags:
//!
//! | Markup | Effect |
//! |---|---|
//! | `<b>…</b>`, `<strong>…</strong>` | bold |
//! | `<i>…</i>`, `<em>…</em>` | italic |
//! | `<u>`, `<strikethrough>`, `<sub>`, `<sup>`, `<font …>`, `<color …>`, `<link …>` | tag dropped, text kept |
//! | `&lt;` `&gt;` `&amp;` | `<` `>` `&` |
//!
//! Emphasis adds to the card's base style, so `<i>` on a bold card is bold
//! italic. Tags nest. A closing tag without an opener is ignored and an
//! unclosed tag runs to the end of the paragraph. Anything else between angle
//! brackets is printed as written. `<br>` never reaches this module: cards
//! are split into paragraphs first.

use crate::fonts::FontStyle;
use serde::Serialize;

/// Emphasis requested by markup, before the card's base style is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Emphasis {
    pub bold: bool,
    pub italic: bool,
}

impl Emphasis {
    pub fn apply(self, base: FontStyle) -> FontStyle {
        FontStyle::from_flags(base.is_bold() || self.bold, base.is_italic() || self.italic)
    }
}

/// A stretch of text with one emphasis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    pub emphasis: Emphasis,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tag {
    Bold,
    Italic,
    Dropped,
}

impl Tag {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "b" | "strong" => Some(Tag::Bold),
            "i" | "em" => Some(Tag::Italic),
            "u" | "strikethrough" | "sub" | "sup" | "font" | "color" | "link" => Some(Tag::Dropped),
            _ => None,
        }
    }
}

/// Recognize `body` (the text between `<` and `>`) as a markup tag.
/// Returns the tag and whether it closes.
fn parse_tag(body: &str) -> Option<(Tag, bool)> {
    let (closing, rest) = match body.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    let name_len = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    let (name, attributes) = rest.split_at(name_len);
    let tag = Tag::from_name(&name.to_ascii_lowercase())?;
    // Only the dropped formatting tags take attributes, e.g. <color rgb="ff0000">
    let attributes_ok = attributes.trim().is_empty()
        || (tag == Tag::Dropped && !closing && attributes.starts_with(char::is_whitespace));
    attributes_ok.then_some((tag, closing))
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn push_span(spans: &mut Vec<Span>, text: &str, emphasis: Emphasis) {
    if text.is_empty() {
        return;
    }
    let text = decode_entities(text);
    match spans.last_mut() {
        Some(last) if last.emphasis == emphasis => last.text.push_str(&text),
        _ => spans.push(Span { text, emphasis }),
    }
}

/// Split one paragraph into emphasis spans.
///
/// - `"plain"` → `[("plain", none)]`
/// - `"<i>Italic</i> and <b>bold</b>"` → `[("Italic", italic), (" and ", none), ("bold", bold)]`
/// - `"1 < 2"` → `[("1 < 2", none)]`
pub fn parse_markup(paragraph: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let (mut bold, mut italic) = (0u32, 0u32);
    let emphasis = |bold: u32, italic: u32| Emphasis {
        bold: bold > 0,
        italic: italic > 0,
    };

    let mut rest = paragraph;
    let mut literal = String::new();
    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>').map(|i| open + i) else {
            break;
        };
        literal.push_str(&rest[..open]);
        match parse_tag(&rest[open + 1..close]) {
            Some((tag, closing)) => {
                push_span(&mut spans, &literal, emphasis(bold, italic));
                literal.clear();
                let depth = match tag {
                    Tag::Bold => &mut bold,
                    Tag::Italic => &mut italic,
                    Tag::Dropped => {
                        rest = &rest[close + 1..];
                        continue;
                    }
                };
                *depth = if closing {
                    depth.saturating_sub(1)
                } else {
                    *depth + 1
                };
            }
            None => literal.push_str(&rest[open..=close]),
        }
        rest = &rest[close + 1..];
    }
    literal.push_str(rest);
    push_span(&mut spans, &literal, emphasis(bold, italic));
    spans
}

/// The text of `spans` with markup removed.
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}
