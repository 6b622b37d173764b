pub mod card_text;

pub use card_text::*;

/// Trim and collapse every run of whitespace to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
