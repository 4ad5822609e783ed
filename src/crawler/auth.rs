//! Portal login
//!
//! Login drives the form the way a user would: fill both inputs, press
//! "Entrar" with a real click, then wait for the application layout. The
//! welcome dialog that follows is closed best-effort.

use crate::browser::{BrowserError, BrowserSession, ClickMode, Locator};
use crate::config::{Credentials, SiteConfig, TimingConfig};
use crate::crawler::overlay::{dismiss_overlay, OverlayOutcome, LOGIN_TARGETS};
use crate::LoginError;
use tokio::time::sleep;

pub const USERNAME_INPUT: &str = "input[aria-label='Informe seu usuário']";
pub const PASSWORD_INPUT: &str = "input[aria-label='Informe sua senha']";
pub const SUBMIT_BUTTON: &str = "//button[.//span[contains(normalize-space(.), 'Entrar')]]";
/// Root element that only exists once the user is logged in
pub const APP_LAYOUT: &str = "div.q-layout";

/// Logs in to the portal
///
/// # Arguments
///
/// * `session` - Open browser session
/// * `site` - Storefront addresses
/// * `credentials` - Portal username and password
/// * `timing` - Settle delays and the layout wait bound
///
/// # Returns
///
/// * `Ok(())` - The logged-in layout is showing
/// * `Err(LoginError)` - A form element was missing, the layout never
///   appeared or the session was lost
pub async fn login<S: BrowserSession>(
    session: &mut S,
    site: &SiteConfig,
    credentials: &Credentials,
    timing: &TimingConfig,
) -> Result<(), LoginError> {
    tracing::info!("Logging in at {}", site.login_url);
    session.navigate(&site.login_url).await?;
    sleep(timing.page_settle()).await;

    let username = find_field(session, Locator::css(USERNAME_INPUT)).await?;
    session.fill(&username, &credentials.username).await?;

    let password = find_field(session, Locator::css(PASSWORD_INPUT)).await?;
    session.fill(&password, &credentials.password).await?;

    let submit = find_field(session, Locator::xpath(SUBMIT_BUTTON)).await?;
    session.click(&submit, ClickMode::Interactive).await?;

    match session
        .wait_for(&Locator::css(APP_LAYOUT), timing.login_timeout())
        .await
    {
        Ok(_) => {}
        Err(BrowserError::Timeout { .. }) => {
            return Err(LoginError::LayoutMissing(timing.login_timeout_secs))
        }
        Err(e) => return Err(e.into()),
    }
    tracing::info!("Login succeeded");

    sleep(timing.overlay_settle()).await;
    match dismiss_overlay(session, LOGIN_TARGETS).await? {
        OverlayOutcome::Absent => tracing::debug!("No welcome dialog after login"),
        OverlayOutcome::Dismissed(_) => {}
        OverlayOutcome::Stuck => tracing::warn!("Welcome dialog left open; continuing"),
    }

    Ok(())
}

async fn find_field<S: BrowserSession>(
    session: &mut S,
    locator: Locator,
) -> Result<S::Element, LoginError> {
    match session.find_all(&locator).await {
        Ok(found) => found
            .into_iter()
            .next()
            .ok_or_else(|| LoginError::FieldMissing(locator.as_str().to_string())),
        Err(e) if e.is_session_lost() => Err(e.into()),
        Err(e) => {
            tracing::debug!("Lookup for {} failed: {}", locator.as_str(), e);
            Err(LoginError::FieldMissing(locator.as_str().to_string()))
        }
    }
}
