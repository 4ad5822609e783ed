//! Pagination control
//!
//! The storefront paginates with a button whose icon glyph is
//! `fast_forward` (or, on some pages, whose label says "próxima"). A
//! disabled or missing button ends the category.

use crate::browser::{BrowserResult, BrowserSession, ClickMode, Tolerate};
use crate::config::TimingConfig;
use crate::crawler::scripts;
use tokio::time::sleep;

/// Advances to the next page if there is one
///
/// # Returns
///
/// * `Ok(true)` - The next page button was clicked
/// * `Ok(false)` - No enabled next page button, or it could not be clicked
/// * `Err(BrowserError::SessionLost)` - The session died
pub async fn has_next_page<S: BrowserSession>(
    session: &mut S,
    timing: &TimingConfig,
) -> BrowserResult<bool> {
    let button = session
        .select_by_script(scripts::NEXT_PAGE_BUTTON, Vec::new())
        .await
        .tolerate("looking for the next page button")?
        .and_then(|found| found.into_iter().next());

    let Some(button) = button else {
        tracing::info!("No further pages");
        return Ok(false);
    };

    session
        .scroll_into_view(&button)
        .await
        .tolerate("scrolling to the next page button")?;
    sleep(timing.click_settle()).await;

    let clicked = session
        .click(&button, ClickMode::Synthetic)
        .await
        .tolerate("clicking the next page button")?;

    if clicked.is_none() {
        return Ok(false);
    }

    sleep(timing.page_load_settle()).await;
    Ok(true)
}
