use async_trait::async_trait;

use crate::error::ScrapeError;
use crate::models::CardRecord;

mod json;
pub use json::JsonFileStore;

#[async_trait]
pub trait CardStore: Send + Sync {
    /// Replace the whole stored collection with `cards`.
    async fn replace_all(&self, cards: &[CardRecord]) -> Result<(), ScrapeError>;
    /// Everything currently stored; empty if nothing has been written yet.
    async fn load_all(&self) -> Result<Vec<CardRecord>, ScrapeError>;
}
