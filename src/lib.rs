//! Scraper for the Riftbound TCG card gallery.
//!
//! A run launches a headless browser, scrolls the gallery until lazily
//! loaded cards stop appearing, parses each card image's description into a
//! [`models::CardRecord`], and atomically replaces the JSON card store.

pub mod browser;
pub mod config;
pub mod error;
pub mod models;
pub mod parsers;
pub mod scrapers;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::{ScrapeError, ScrapeResult};
pub use models::{CardRecord, Color, RunReport, RunWarning};
pub use scrapers::{scrape_now, BatchCollector, RunState};
