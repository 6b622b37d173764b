use std::path::PathBuf;
use thiserror::Error;

/// Fatal failures of a scrape run. Anything that does not abort the run is a
/// [`crate::models::RunWarning`] instead.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("Card extraction failed: {0}")]
    Extraction(String),

    #[error("Failed to persist cards to {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ScrapeError {
    pub fn navigation(url: &str, reason: impl ToString) -> Self {
        ScrapeError::Navigation {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScrapeError::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Short kind name used in logs and the binary's exit message.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Launch(_) => "LaunchError",
            ScrapeError::Navigation { .. } => "NavigationError",
            ScrapeError::Extraction(_) => "ExtractionError",
            ScrapeError::Persistence { .. } => "PersistenceError",
            ScrapeError::Http(_) => "HttpError",
            ScrapeError::Config(_) => "ConfigError",
        }
    }
}

pub type ScrapeResult<T> = std::result::Result<T, ScrapeError>;
