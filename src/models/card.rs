use serde::{Deserialize, Serialize};
use std::fmt;

use super::COLOR_SEPARATOR;

/// The six domain colors a card can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
    Green,
    Purple,
    Orange,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Purple,
        Color::Orange,
        Color::Yellow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Blue => "Blue",
            Color::Green => "Green",
            Color::Purple => "Purple",
            Color::Orange => "Orange",
            Color::Yellow => "Yellow",
        }
    }

    /// Case-insensitive lookup of a single token. Surrounding whitespace is ignored.
    pub fn from_token(token: &str) -> Option<Self> {
        let token = token.trim();
        Color::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(token))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One normalized card as written to the store.
///
/// Fields are read-only after construction; `colorString` is always derived
/// from `colors` by [`CardRecord::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "StoredCard")]
pub struct CardRecord {
    id: u32,
    name: String,
    image: String,
    text: String,
    colors: Vec<Color>,
    #[serde(rename = "colorString")]
    color_string: String,
}

impl CardRecord {
    pub fn new(id: u32, name: String, image: String, text: String, colors: Vec<Color>) -> Self {
        let color_string = join_colors(&colors);
        Self {
            id,
            name,
            image,
            text,
            colors,
            color_string,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn color_string(&self) -> &str {
        &self.color_string
    }
}

pub fn join_colors(colors: &[Color]) -> String {
    colors
        .iter()
        .map(Color::as_str)
        .collect::<Vec<_>>()
        .join(COLOR_SEPARATOR)
}

// On-disk shape. The stored colorString is ignored and rebuilt from colors.
#[derive(Deserialize)]
struct StoredCard {
    id: u32,
    name: String,
    image: String,
    text: String,
    colors: Vec<Color>,
}

impl From<StoredCard> for CardRecord {
    fn from(stored: StoredCard) -> Self {
        CardRecord::new(stored.id, stored.name, stored.image, stored.text, stored.colors)
    }
}
