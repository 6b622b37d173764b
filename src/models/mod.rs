pub mod card;
pub mod report;

pub use card::*;
pub use report::*;

/// Separator used to build `colorString` from `colors`.
pub const COLOR_SEPARATOR: &str = ", ";
