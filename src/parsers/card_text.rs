//! Parsing of the card description string the gallery puts in each image's
//! `alt` attribute, e.g. `"Jinx, Loose Cannon Color: Red, Purple. Type: Champion"`.
//!
//! The source text is authored by hand on an external site, so every function
//! here is total: unknown color tokens are dropped, a missing color marker
//! means "no colors", and only a missing name rejects the element.

use once_cell::sync::Lazy;
use regex::Regex;

use super::collapse_whitespace;
use crate::models::Color;

static COLOR_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bcolou?rs?\s*:")
        .expect("Invalid color marker regex")
});

// Where the color list stops: a sentence break or the next labelled field.
static COLOR_LIST_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.|\btype\s*:|\bsuper\s*:|\btags\s*:|\bhow to\b")
        .expect("Invalid color list terminator regex")
});

static COLOR_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*(?:,|/|&|\band\b)\s*")
        .expect("Invalid color split regex")
});

/// Characters trimmed off the end of a name when they separate it from the
/// color marker ("Jinx — Color: Red").
const NAME_SEPARATORS: &[char] = &['—', '–', '-', '|', ':', ',', ';', '.'];

/// Name and colors pulled out of one description string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardText {
    pub name: String,
    pub colors: Vec<Color>,
}

/// Parse one description string. Returns `None` when no name can be derived.
pub fn extract(text: &str) -> Option<CardText> {
    let marker = COLOR_MARKER.find(text);

    let name = match marker {
        Some(m) => name_before_marker(&text[..m.start()]),
        None => collapse_whitespace(text),
    };
    if name.is_empty() {
        return None;
    }

    let colors = match marker {
        Some(m) => parse_colors(&text[m.end()..]),
        None => Vec::new(),
    };

    Some(CardText { name, colors })
}

// Attribute values arrive already entity-decoded, so only whitespace is touched.
fn name_before_marker(raw: &str) -> String {
    collapse_whitespace(raw)
        .trim_end_matches(|c: char| c.is_whitespace() || NAME_SEPARATORS.contains(&c))
        .to_string()
}

/// Colors listed after the marker, in order of appearance, without repeats.
pub fn parse_colors(list: &str) -> Vec<Color> {
    let list = match COLOR_LIST_END.find(list) {
        Some(end) => &list[..end.start()],
        None => list,
    };

    let mut colors = Vec::new();
    for token in COLOR_SPLIT.split(list) {
        if let Some(color) = Color::from_token(token) {
            if !colors.contains(&color) {
                colors.push(color);
            }
        }
    }
    colors
}
