//! Scroll convergence: keep scrolling until the number of matching elements
//! stops growing for `stability_rounds` consecutive rounds, or the round cap
//! is reached.

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::PageSession;
use crate::config::ScrollSettings;

const FIRST_ELEMENT_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScrollOutcome {
    pub rounds: u32,
    pub elements: usize,
    /// False when the round cap was hit while content was still arriving.
    pub converged: bool,
}

/// Scroll `page` until the count of `selector` matches settles.
///
/// Never fails: script errors and idle-wait timeouts only make a round count
/// as non-growing.
pub async fn drive_scroll(
    page: &dyn PageSession,
    selector: &str,
    settings: &ScrollSettings,
) -> ScrollOutcome {
    let mut last_count = wait_for_first_element(page, selector, settings).await;
    let mut stable_rounds = 0;
    let mut rounds = 0;

    info!("Scrolling for lazy content ({} elements initially)", last_count);

    while rounds < settings.max_rounds {
        rounds += 1;

        if let Err(e) = page.scroll_to_bottom().await {
            warn!("Scroll command failed in round {}: {}", rounds, e);
        }

        let count = if wait_with_retries(page, settings, rounds).await {
            match page.count(selector).await {
                Ok(count) => count,
                Err(e) => {
                    warn!("Element count failed in round {}: {}", rounds, e);
                    last_count
                }
            }
        } else {
            last_count
        };

        if count > last_count {
            debug!("Round {}: {} -> {} elements", rounds, last_count, count);
            last_count = count;
            stable_rounds = 0;
        } else {
            stable_rounds += 1;
            debug!(
                "Round {}: no growth ({} elements, {}/{} stable)",
                rounds, last_count, stable_rounds, settings.stability_rounds
            );
        }

        if stable_rounds >= settings.stability_rounds {
            info!("Content converged after {} rounds with {} elements", rounds, last_count);
            return ScrollOutcome {
                rounds,
                elements: last_count,
                converged: true,
            };
        }
    }

    warn!(
        "Round cap of {} reached before content converged ({} elements)",
        settings.max_rounds, last_count
    );
    ScrollOutcome {
        rounds,
        elements: last_count,
        converged: false,
    }
}

/// Poll until at least one element matches or `initial_wait` runs out.
/// Returns the count seen last, which is 0 on timeout.
async fn wait_for_first_element(page: &dyn PageSession, selector: &str, settings: &ScrollSettings) -> usize {
    let deadline = Instant::now() + settings.initial_wait();
    loop {
        match page.count(selector).await {
            Ok(count) if count > 0 => return count,
            Ok(_) => {}
            Err(e) => debug!("Element count failed while waiting for first render: {}", e),
        }
        if Instant::now() >= deadline {
            warn!(
                "No element matched {} within {:?}, scrolling anyway",
                selector,
                settings.initial_wait()
            );
            return 0;
        }
        tokio::time::sleep(FIRST_ELEMENT_POLL).await;
    }
}

async fn wait_with_retries(page: &dyn PageSession, settings: &ScrollSettings, round: u32) -> bool {
    let attempts = settings.wait_retries + 1;
    for attempt in 1..=attempts {
        match tokio::time::timeout(settings.wait_timeout(), page.wait_for_idle(settings.idle_wait())).await {
            Ok(Ok(())) => return true,
            Ok(Err(e)) => debug!("Round {} idle wait failed (attempt {}/{}): {}", round, attempt, attempts, e),
            Err(_) => debug!(
                "Round {} idle wait timed out after {:?} (attempt {}/{})",
                round,
                settings.wait_timeout(),
                attempt,
                attempts
            ),
        }
    }
    warn!("Round {}: page never settled, counting as no growth", round);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::RawCard;
    use crate::error::ScrapeError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    /// Page whose element count follows `growth`: after the n-th scroll the
    /// count is `growth[n]` (the last entry repeats).
    struct ScriptedPage {
        growth: Vec<usize>,
        scrolls: AtomicU32,
        waits: AtomicU32,
        wait_mode: WaitMode,
        created: Instant,
        /// Nothing matches until this much time has passed.
        render_delay: Duration,
    }

    enum WaitMode {
        Settles,
        Fails,
        Hangs,
    }

    impl ScriptedPage {
        fn new(growth: Vec<usize>, wait_mode: WaitMode) -> Self {
            Self {
                growth,
                scrolls: AtomicU32::new(0),
                waits: AtomicU32::new(0),
                wait_mode,
                created: Instant::now(),
                render_delay: Duration::ZERO,
            }
        }

        fn rendering_after(mut self, delay: Duration) -> Self {
            self.render_delay = delay;
            self
        }
    }

    #[async_trait]
    impl PageSession for ScriptedPage {
        async fn navigate(&mut self, _url: &str) -> Result<(), ScrapeError> {
            Ok(())
        }

        async fn query_all(&self, _selector: &str) -> Result<Vec<RawCard>, ScrapeError> {
            Ok(Vec::new())
        }

        async fn evaluate(&self, _script: &str) -> Result<serde_json::Value, ScrapeError> {
            Ok(serde_json::Value::Null)
        }

        async fn count(&self, _selector: &str) -> Result<usize, ScrapeError> {
            if self.created.elapsed() < self.render_delay {
                return Ok(0);
            }
            let scrolls = self.scrolls.load(Ordering::SeqCst) as usize;
            Ok(self.growth[scrolls.min(self.growth.len() - 1)])
        }

        async fn scroll_to_bottom(&self) -> Result<(), ScrapeError> {
            self.scrolls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn wait_for_idle(&self, _idle: Duration) -> Result<(), ScrapeError> {
            self.waits.fetch_add(1, Ordering::SeqCst);
            match self.wait_mode {
                WaitMode::Settles => Ok(()),
                WaitMode::Fails => Err(ScrapeError::Extraction("page gone".to_string())),
                WaitMode::Hangs => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(())
                }
            }
        }

        async fn close(&mut self) {}
    }

    fn settings(stability_rounds: u32, max_rounds: u32) -> ScrollSettings {
        ScrollSettings {
            stability_rounds,
            max_rounds,
            idle_wait_ms: 0,
            wait_timeout_ms: 20,
            wait_retries: 2,
            initial_wait_ms: 0,
        }
    }

    #[tokio::test]
    async fn converges_within_threshold_after_growth_stops() {
        // Grows on rounds 1..=4, flat afterwards.
        let page = ScriptedPage::new(vec![10, 20, 30, 40, 50], WaitMode::Settles);
        let outcome = drive_scroll(&page, "img", &settings(2, 30)).await;

        assert!(outcome.converged);
        assert_eq!(outcome.elements, 50);
        assert_eq!(outcome.rounds, 4 + 2);
    }

    #[tokio::test]
    async fn static_page_converges_after_threshold_rounds() {
        let page = ScriptedPage::new(vec![12], WaitMode::Settles);
        let outcome = drive_scroll(&page, "img", &settings(3, 30)).await;

        assert_eq!(
            outcome,
            ScrollOutcome {
                rounds: 3,
                elements: 12,
                converged: true
            }
        );
    }

    #[tokio::test]
    async fn single_idle_round_does_not_end_scrolling() {
        // Stalls for one round mid-way, then keeps growing.
        let page = ScriptedPage::new(vec![10, 20, 20, 30, 40], WaitMode::Settles);
        let outcome = drive_scroll(&page, "img", &settings(2, 30)).await;

        assert!(outcome.converged);
        assert_eq!(outcome.elements, 40);
        assert_eq!(outcome.rounds, 6);
    }

    #[tokio::test]
    async fn waits_for_a_late_first_render_before_counting_rounds() {
        let page = ScriptedPage::new(vec![5], WaitMode::Settles).rendering_after(Duration::from_millis(150));
        let mut settings = settings(2, 10);
        settings.initial_wait_ms = 2_000;

        let outcome = drive_scroll(&page, "img", &settings).await;

        assert_eq!(
            outcome,
            ScrollOutcome {
                rounds: 2,
                elements: 5,
                converged: true
            }
        );
    }

    #[tokio::test]
    async fn gives_up_on_first_render_after_initial_wait() {
        let page = ScriptedPage::new(vec![5], WaitMode::Settles).rendering_after(Duration::from_secs(60));
        let mut settings = settings(2, 10);
        settings.initial_wait_ms = 100;

        let outcome = drive_scroll(&page, "img", &settings).await;

        assert!(outcome.converged);
        assert_eq!(outcome.elements, 0);
        assert_eq!(outcome.rounds, 2);
    }

    #[tokio::test]
    async fn round_cap_reports_partial_load() {
        let growth: Vec<usize> = (0..100).map(|n| n * 10).collect();
        let page = ScriptedPage::new(growth, WaitMode::Settles);
        let outcome = drive_scroll(&page, "img", &settings(2, 5)).await;

        assert!(!outcome.converged);
        assert_eq!(outcome.rounds, 5);
        assert_eq!(outcome.elements, 50);
        assert_eq!(page.scrolls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn failed_waits_are_retried_then_count_as_no_growth() {
        let page = ScriptedPage::new(vec![5, 100], WaitMode::Fails);
        let outcome = drive_scroll(&page, "img", &settings(2, 10)).await;

        // The count is never re-read, so growth is never observed.
        assert!(outcome.converged);
        assert_eq!(outcome.elements, 5);
        assert_eq!(outcome.rounds, 2);
        assert_eq!(page.waits.load(Ordering::SeqCst), 2 * 3);
    }

    #[tokio::test]
    async fn hung_waits_time_out() {
        let page = ScriptedPage::new(vec![7], WaitMode::Hangs);
        let outcome = drive_scroll(&page, "img", &settings(1, 10)).await;

        assert!(outcome.converged);
        assert_eq!(outcome.rounds, 1);
        assert_eq!(page.waits.load(Ordering::SeqCst), 3);
    }
}
