use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use super::{CardRecord, Color};

/// Non-fatal conditions raised during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum RunWarning {
    /// The scroll driver hit its round cap before the element count settled.
    PartialLoad { rounds: u32, elements: usize },
    /// The run completed but no card survived extraction.
    EmptyResult,
}

impl fmt::Display for RunWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunWarning::PartialLoad { rounds, elements } => write!(
                f,
                "PartialLoadWarning: content still growing after {} rounds ({} elements loaded)",
                rounds, elements
            ),
            RunWarning::EmptyResult => write!(f, "EmptyResultWarning: no cards extracted"),
        }
    }
}

/// Where the records of a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CardSource {
    StaticHtml,
    Browser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColorCount {
    pub color: Color,
    pub cards: usize,
}

/// Summary returned from a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub records: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub warnings: Vec<RunWarning>,
    pub source: CardSource,
    pub scroll_rounds: u32,
    pub elements_seen: usize,
    pub by_color: Vec<ColorCount>,
    pub output_path: PathBuf,
    pub started_at: DateTime<Local>,
    pub elapsed_ms: u128,
}

impl RunReport {
    pub fn has_warning(&self, warning: &RunWarning) -> bool {
        self.warnings.contains(warning)
    }
}

/// Per-color card totals, in the enumeration's declared order. Colors with no
/// cards are omitted.
pub fn color_breakdown(cards: &[CardRecord]) -> Vec<ColorCount> {
    Color::ALL
        .iter()
        .map(|&color| ColorCount {
            color,
            cards: cards.iter().filter(|c| c.colors().contains(&color)).count(),
        })
        .filter(|count| count.cards > 0)
        .collect()
}
