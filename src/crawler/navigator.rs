//! Category navigation
//!
//! Category tiles are plain `div`s whose markup has drifted between
//! releases, so a tile is located through an ordered cascade of lookups and
//! the first non-empty result is clicked.

use crate::browser::{BrowserError, BrowserResult, BrowserSession, ClickMode, Locator, Tolerate};
use crate::config::TimingConfig;
use crate::crawler::overlay::{dismiss_overlay, STRAY_TARGETS};
use crate::crawler::scripts;
use crate::NavigationError;
use serde_json::json;
use tokio::time::sleep;

/// Rendered product card that confirms a category opened
pub const PRODUCT_CARD: &str = "div.q-card.my-card";

/// Tiles scanned by the substring lookup
pub const CATEGORY_TILE: &str = "div.text-teal-10.q-pa-md.text-center";

/// Attempts at seeing product cards after clicking a category
const CONTENT_ATTEMPTS: u32 = 3;

/// One way of finding a category tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryLookup {
    /// XPath match on the tile's whole normalized text
    ExactText,
    /// Script search for a tile whose text contains the name
    ScriptSearch,
    /// Case-insensitive substring scan over tile texts
    SubstringScan,
}

/// Lookups in the order they are tried
pub const CATEGORY_CASCADE: [CategoryLookup; 3] = [
    CategoryLookup::ExactText,
    CategoryLookup::ScriptSearch,
    CategoryLookup::SubstringScan,
];

impl CategoryLookup {
    /// Runs this lookup; recoverable failures count as no match
    pub async fn find<S: BrowserSession>(
        &self,
        session: &mut S,
        category: &str,
    ) -> BrowserResult<Option<S::Element>> {
        let found = match self {
            Self::ExactText => session
                .find_all(&Locator::xpath(exact_text_xpath(category)))
                .await
                .tolerate("matching category text")?
                .and_then(|elements| elements.into_iter().next()),
            Self::ScriptSearch => session
                .select_by_script(scripts::CATEGORY_SEARCH, vec![json!(category)])
                .await
                .tolerate("searching categories by script")?
                .and_then(|elements| elements.into_iter().next()),
            Self::SubstringScan => substring_scan(session, category).await?,
        };

        Ok(found)
    }
}

/// XPath for a teal tile whose normalized text equals `category`
pub fn exact_text_xpath(category: &str) -> String {
    format!(
        "//div[contains(concat(' ', normalize-space(@class), ' '), ' text-teal-10 ') \
         and normalize-space(.) = {}]",
        xpath_literal(category)
    )
}

/// Quotes a string as an XPath 1.0 literal
///
/// XPath has no escape syntax, so values containing both quote kinds are
/// assembled with `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|part| format!("'{}'", part))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

async fn substring_scan<S: BrowserSession>(
    session: &mut S,
    category: &str,
) -> BrowserResult<Option<S::Element>> {
    let Some(tiles) = session
        .find_all(&Locator::css(CATEGORY_TILE))
        .await
        .tolerate("listing category tiles")?
    else {
        return Ok(None);
    };

    let wanted = category.to_lowercase();
    for tile in tiles {
        if let Some(text) = session.text(&tile).await.tolerate("reading a tile")? {
            if text.to_lowercase().contains(&wanted) {
                return Ok(Some(tile));
            }
        }
    }

    Ok(None)
}

/// Opens a category and waits for its product cards
///
/// # Arguments
///
/// * `session` - Logged-in browser session
/// * `category` - Category name as shown on its tile
/// * `timing` - Settle delays and card wait bounds
///
/// # Returns
///
/// * `Ok(())` - At least one product card rendered
/// * `Err(NavigationError::NotFound)` - No lookup found the tile
/// * `Err(NavigationError::NoContent)` - The tile was clicked but no cards appeared
/// * `Err(NavigationError::Browser)` - Session loss, or the click itself failed
pub async fn go_to_category<S: BrowserSession>(
    session: &mut S,
    category: &str,
    timing: &TimingConfig,
) -> Result<(), NavigationError> {
    tracing::info!("Opening category {}", category);
    sleep(timing.page_settle()).await;

    dismiss_overlay(session, STRAY_TARGETS).await?;

    let mut tile = None;
    for lookup in CATEGORY_CASCADE {
        if let Some(found) = lookup.find(session, category).await? {
            tracing::debug!("Category {} found via {:?}", category, lookup);
            tile = Some(found);
            break;
        }
    }

    let tile = tile.ok_or_else(|| NavigationError::NotFound(category.to_string()))?;

    session
        .scroll_into_view(&tile)
        .await
        .tolerate("scrolling to the category")?;
    sleep(timing.click_settle()).await;
    session.click(&tile, ClickMode::Synthetic).await?;

    wait_for_cards(session, category, timing).await
}

async fn wait_for_cards<S: BrowserSession>(
    session: &mut S,
    category: &str,
    timing: &TimingConfig,
) -> Result<(), NavigationError> {
    let locator = Locator::css(PRODUCT_CARD);
    let mut last_error = None;

    for attempt in 1..=CONTENT_ATTEMPTS {
        match session.wait_for(&locator, timing.card_wait_timeout()).await {
            Ok(_) => {
                tracing::info!("Category {} loaded", category);
                return Ok(());
            }
            Err(e) if e.is_session_lost() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(
                    "No product cards yet for {} (attempt {}/{}): {}",
                    category,
                    attempt,
                    CONTENT_ATTEMPTS,
                    e
                );
                last_error = Some(e);
            }
        }

        if attempt < CONTENT_ATTEMPTS {
            sleep(timing.content_retry_delay()).await;
        }
    }

    Err(NavigationError::NoContent {
        category: category.to_string(),
        source: last_error.unwrap_or_else(|| BrowserError::NotFound(PRODUCT_CARD.to_string())),
    })
}
