//! Product card discovery and page extraction
//!
//! Cards are discovered through a cascade of selectors with a structural
//! fallback script, retried after scrolling to trigger lazy rendering. Only
//! session loss is reported as an error; every other failure degrades to
//! fewer (or zero) records.

use crate::browser::{BrowserResult, BrowserSession, Locator, Tolerate};
use crate::config::TimingConfig;
use crate::crawler::fields::{parse_card, CardFields};
use crate::crawler::scripts;
use crate::record::ProductRecord;
use std::path::PathBuf;
use tokio::time::sleep;

/// Card selectors, tried in order; the first with any match wins
pub const CARD_SELECTORS: [&str; 5] = [
    "div.q-card.q-hoverable",
    "div.q-card",
    "div.my-card",
    "div.q-card.my-card",
    r#"div[class*="card"]"#,
];

const DISCOVERY_ATTEMPTS: u32 = 3;
const CARD_ATTEMPTS: u32 = 3;

/// Per-page inputs for extraction
#[derive(Debug, Clone)]
pub struct ExtractSettings<'a> {
    pub timing: &'a TimingConfig,
    pub public_image_base: &'a str,
    /// Where to save a screenshot when no cards can be found
    pub screenshot_path: PathBuf,
}

/// Extracts every product record on the current page
///
/// Installation service cards are dropped. Returns an empty list when no
/// cards are found after all discovery attempts.
pub async fn extract_page<S: BrowserSession>(
    session: &mut S,
    category: &str,
    settings: &ExtractSettings<'_>,
) -> BrowserResult<Vec<ProductRecord>> {
    let cards = discover_cards(session, settings.timing).await?;

    if cards.is_empty() {
        tracing::warn!("No product cards found for {}; saving screenshot", category);
        let saved = session
            .screenshot(&settings.screenshot_path)
            .await
            .tolerate("saving a diagnostic screenshot")?;
        if saved.is_some() {
            tracing::info!("Screenshot saved to {}", settings.screenshot_path.display());
        }
        return Ok(Vec::new());
    }

    tracing::info!("Found {} cards on the current page of {}", cards.len(), category);

    let mut records = Vec::with_capacity(cards.len());
    for (index, card) in cards.iter().enumerate() {
        let Some(fields) = read_card(session, card, settings.timing).await? else {
            tracing::warn!("Skipping card {}/{} after repeated failures", index + 1, cards.len());
            continue;
        };

        if fields.is_installation_service() {
            tracing::info!(
                "Skipping installation service: {}",
                fields.name.as_deref().unwrap_or_default()
            );
            continue;
        }

        records.push(fields.into_record(category, settings.public_image_base));
    }

    Ok(records)
}

/// Finds product cards on the current page
pub async fn discover_cards<S: BrowserSession>(
    session: &mut S,
    timing: &TimingConfig,
) -> BrowserResult<Vec<S::Element>> {
    for attempt in 1..=DISCOVERY_ATTEMPTS {
        sleep(timing.page_settle()).await;

        for selector in CARD_SELECTORS {
            let found = session
                .find_all(&Locator::css(selector))
                .await
                .tolerate("looking for product cards")?
                .unwrap_or_default();

            if !found.is_empty() {
                tracing::debug!("{} cards matched {}", found.len(), selector);
                return Ok(found);
            }
        }

        let structural = session
            .select_by_script(scripts::STRUCTURAL_CARDS, Vec::new())
            .await
            .tolerate("locating cards by structure")?
            .unwrap_or_default();

        if !structural.is_empty() {
            tracing::debug!("{} cards found by structure", structural.len());
            return Ok(structural);
        }

        if attempt < DISCOVERY_ATTEMPTS {
            tracing::info!(
                "No cards yet (attempt {}/{}); scrolling to load more",
                attempt,
                DISCOVERY_ATTEMPTS
            );
            scroll_step(session, 0.5, timing).await?;
            scroll_step(session, 1.0, timing).await?;
        }
    }

    Ok(Vec::new())
}

async fn scroll_step<S: BrowserSession>(
    session: &mut S,
    fraction: f64,
    timing: &TimingConfig,
) -> BrowserResult<()> {
    session
        .scroll_page(fraction)
        .await
        .tolerate("scrolling the page")?;
    sleep(timing.scroll_settle()).await;
    Ok(())
}

/// Reads one card's fields, retrying transient failures
async fn read_card<S: BrowserSession>(
    session: &mut S,
    card: &S::Element,
    timing: &TimingConfig,
) -> BrowserResult<Option<CardFields>> {
    for attempt in 1..=CARD_ATTEMPTS {
        sleep(timing.card_settle()).await;

        match session.outer_html(card).await {
            Ok(html) => return Ok(Some(parse_card(&html))),
            Err(e) if e.is_session_lost() => return Err(e),
            Err(e) => {
                tracing::warn!("Card read failed (attempt {}/{}): {}", attempt, CARD_ATTEMPTS, e);
                if attempt < CARD_ATTEMPTS {
                    sleep(timing.card_retry_delay()).await;
                }
            }
        }
    }

    Ok(None)
}
