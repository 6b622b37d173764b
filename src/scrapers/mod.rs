//! One scrape run, from browser launch to the persisted card file.

use chrono::{DateTime, Local};
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

mod normalize;
mod static_page;

pub use normalize::{normalize, resolve_image, Normalized};
pub use static_page::{fetch_static_cards, parse_cards_html};

use crate::browser::{drive_scroll, ChromeLauncher, Launcher, PageSession, ScrollOutcome};
use crate::config::Config;
use crate::error::ScrapeError;
use crate::models::{color_breakdown, CardSource, RunReport, RunWarning};
use crate::storage::{CardStore, JsonFileStore};
use crate::utils::http::create_client;

/// Progress of a run. `Errored` replaces the final `Closed` when the run
/// fails; the session is released either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    SessionOpen,
    Navigated,
    Scrolling,
    Extracting,
    Persisted,
    Closed,
    Errored,
}

pub struct BatchCollector {
    config: Arc<Config>,
    launcher: Box<dyn Launcher>,
    store: Box<dyn CardStore>,
    http: Option<Client>,
    history: Vec<RunState>,
}

impl BatchCollector {
    pub fn new(config: Arc<Config>, launcher: Box<dyn Launcher>, store: Box<dyn CardStore>) -> Self {
        Self {
            config,
            launcher,
            store,
            http: None,
            history: vec![RunState::Idle],
        }
    }

    /// Chrome launcher and JSON store at `config.output_path`.
    pub fn from_config(config: Arc<Config>) -> Result<Self, ScrapeError> {
        config.validate()?;
        let launcher = Box::new(ChromeLauncher::new(&config));
        let store = Box::new(JsonFileStore::new(config.output_path.clone()));
        let mut collector = Self::new(config.clone(), launcher, store);
        if config.static_first {
            collector = collector.with_http_client(create_client(&config)?);
        }
        Ok(collector)
    }

    /// HTTP client for the static first pass. Without one the pass is skipped.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn state(&self) -> RunState {
        self.history.last().copied().unwrap_or(RunState::Idle)
    }

    /// Every state the last run passed through, starting with `Idle`.
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state: {:?} -> {:?}", self.state(), next);
        self.history.push(next);
    }

    fn fail(&mut self, err: ScrapeError) -> ScrapeError {
        error!("Scrape run failed ({}): {}", err.kind(), err);
        self.transition(RunState::Errored);
        err
    }

    /// Execute one full run and return its report, or the fatal error that
    /// ended it.
    pub async fn run(&mut self) -> Result<RunReport, ScrapeError> {
        let started_at = Local::now();
        let timer = Instant::now();
        self.history = vec![RunState::Idle];

        info!("Starting card scrape of {}", self.config.target_url);

        if self.config.static_first {
            match self.try_static(started_at, timer).await {
                Ok(Some(report)) => return Ok(report),
                Ok(None) => info!("Static pass found no cards, falling back to the browser"),
                Err(e) => return Err(self.fail(e)),
            }
        }

        let mut session = match self.launcher.open(self.config.headless).await {
            Ok(session) => session,
            Err(e) => return Err(self.fail(e)),
        };
        self.transition(RunState::SessionOpen);

        let result = self.browse(session.as_mut(), started_at, timer).await;
        session.close().await;

        match result {
            Ok(report) => {
                self.transition(RunState::Closed);
                Ok(report)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    async fn browse(
        &mut self,
        session: &mut dyn PageSession,
        started_at: DateTime<Local>,
        timer: Instant,
    ) -> Result<RunReport, ScrapeError> {
        let config = self.config.clone();

        session.navigate(&config.target_url).await?;
        self.transition(RunState::Navigated);

        self.transition(RunState::Scrolling);
        let outcome = drive_scroll(&*session, &config.card_selector, &config.scroll).await;

        self.transition(RunState::Extracting);
        let raw = session.query_all(&config.card_selector).await?;
        info!("Found {} card elements", raw.len());
        let normalized = normalize(&raw, &config.target_url);

        self.persist(&normalized).await?;

        Ok(self.report(normalized, Some(outcome), CardSource::Browser, started_at, timer))
    }

    /// Returns `Ok(None)` when the static HTML has no usable cards. HTTP
    /// failures are not fatal here; only persistence is.
    async fn try_static(
        &mut self,
        started_at: DateTime<Local>,
        timer: Instant,
    ) -> Result<Option<RunReport>, ScrapeError> {
        let Some(client) = self.http.clone() else {
            return Ok(None);
        };

        let raw = match fetch_static_cards(&client, &self.config).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Static pass failed: {}", e);
                return Ok(None);
            }
        };

        let normalized = normalize(&raw, &self.config.target_url);
        if normalized.cards.is_empty() {
            return Ok(None);
        }

        self.transition(RunState::Extracting);
        self.persist(&normalized).await?;
        self.transition(RunState::Closed);

        Ok(Some(self.report(normalized, None, CardSource::StaticHtml, started_at, timer)))
    }

    async fn persist(&mut self, normalized: &Normalized) -> Result<(), ScrapeError> {
        info!(
            "Extracted {} cards ({} rejected, {} duplicates)",
            normalized.cards.len(),
            normalized.rejected,
            normalized.duplicates
        );
        for card in normalized.cards.iter().take(5) {
            debug!("Scraped: {} - Colors: {}", card.name(), card.color_string());
        }

        self.store.replace_all(&normalized.cards).await?;
        self.transition(RunState::Persisted);
        Ok(())
    }

    fn report(
        &self,
        normalized: Normalized,
        outcome: Option<ScrollOutcome>,
        source: CardSource,
        started_at: DateTime<Local>,
        timer: Instant,
    ) -> RunReport {
        let mut warnings = Vec::new();
        if let Some(outcome) = outcome.filter(|o| !o.converged) {
            warnings.push(RunWarning::PartialLoad {
                rounds: outcome.rounds,
                elements: outcome.elements,
            });
        }
        if normalized.cards.is_empty() {
            warnings.push(RunWarning::EmptyResult);
        }
        for warning in &warnings {
            warn!("{}", warning);
        }

        let by_color = color_breakdown(&normalized.cards);
        for count in &by_color {
            info!("  - {}: {} cards", count.color, count.cards);
        }

        let elapsed_ms = timer.elapsed().as_millis();
        info!("Scraped {} cards in {:.1} seconds", normalized.cards.len(), elapsed_ms as f64 / 1000.0);

        RunReport {
            records: normalized.cards.len(),
            rejected: normalized.rejected,
            duplicates: normalized.duplicates,
            warnings,
            source,
            scroll_rounds: outcome.map(|o| o.rounds).unwrap_or(0),
            elements_seen: outcome.map(|o| o.elements).unwrap_or(0),
            by_color,
            output_path: self.config.output_path.clone(),
            started_at,
            elapsed_ms,
        }
    }
}

/// Run a scrape with `config`, optionally overriding the output path and the
/// headless flag.
pub async fn scrape_now(
    mut config: Config,
    output_path: Option<PathBuf>,
    headless: Option<bool>,
) -> Result<RunReport, ScrapeError> {
    if let Some(path) = output_path {
        config.output_path = path;
    }
    if let Some(headless) = headless {
        config.headless = headless;
    }
    BatchCollector::from_config(Arc::new(config))?.run().await
}
