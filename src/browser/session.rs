//! Browser session traits and error types
//!
//! The crawl loop talks to the browser only through `BrowserSession`, so the
//! same navigation and extraction code runs against a real WebDriver session
//! or an in-memory one.

use crate::StartError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};

/// Interval between lookups while waiting for an element
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Message fragments that mean the session or its window is gone
///
/// Matched case-insensitively against driver error messages that do not
/// carry a structured error code.
const SESSION_LOST_SIGNATURES: &[&str] = &[
    "invalid session id",
    "no such window",
    "window not found",
    "target window already closed",
    "session deleted",
    "chrome not reachable",
    "browser has closed the connection",
    "disconnected",
    "connection refused",
    "connection reset",
    "broken pipe",
    "browser process exited",
    "unable to connect",
];

/// Errors that can occur while talking to the browser
#[derive(Debug, Clone, Error)]
pub enum BrowserError {
    #[error("Browser session lost: {0}")]
    SessionLost(String),

    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Timed out after {waited_ms}ms waiting for {what}")]
    Timeout { what: String, waited_ms: u64 },

    #[error("Stale element reference: {0}")]
    StaleElement(String),

    #[error("Script error: {0}")]
    Script(String),

    #[error("Browser error: {0}")]
    Other(String),
}

impl BrowserError {
    /// Returns true if the session must be restarted before continuing
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::SessionLost(_))
    }

    /// Classifies a driver failure from its message
    ///
    /// Session-loss signatures win over every other category because a dead
    /// session also produces "not found" and timeout symptoms.
    pub fn classify(message: &str) -> Self {
        let lowered = message.to_lowercase();

        if SESSION_LOST_SIGNATURES
            .iter()
            .any(|signature| lowered.contains(signature))
        {
            Self::SessionLost(message.to_string())
        } else if lowered.contains("stale element") {
            Self::StaleElement(message.to_string())
        } else if lowered.contains("no such element") {
            Self::NotFound(message.to_string())
        } else if lowered.contains("javascript error") {
            Self::Script(message.to_string())
        } else if lowered.contains("timeout") || lowered.contains("timed out") {
            Self::Timeout {
                what: message.to_string(),
                waited_ms: 0,
            }
        } else {
            Self::Other(message.to_string())
        }
    }
}

/// Result type for browser operations
pub type BrowserResult<T> = Result<T, BrowserError>;

/// Absorbs recoverable browser failures while letting session loss through
pub trait Tolerate<T> {
    /// Maps recoverable failures to `Ok(None)` after logging them
    ///
    /// Session loss is returned as an error so the caller can abort and
    /// let the orchestrator restart the session.
    fn tolerate(self, context: &str) -> BrowserResult<Option<T>>;
}

impl<T> Tolerate<T> for BrowserResult<T> {
    fn tolerate(self, context: &str) -> BrowserResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_session_lost() => Err(e),
            Err(e) => {
                tracing::debug!("Ignoring failure while {}: {}", context, e);
                Ok(None)
            }
        }
    }
}

/// How an element should be located
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// The raw selector or expression
    pub fn as_str(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }
}

/// How a click is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMode {
    /// Dispatched from script on the element itself; immune to overlapping layers
    Synthetic,
    /// A native pointer click through the driver
    Interactive,
}

/// A live browser session that owns one page
///
/// Implementations are driven sequentially by a single caller; every
/// method takes `&mut self`.
#[async_trait]
pub trait BrowserSession: Send {
    /// Handle to an element on the current page
    type Element: Clone + Send + Sync;

    /// Loads a URL in the current window
    async fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    /// Returns every element matching the locator (possibly none)
    async fn find_all(&mut self, locator: &Locator) -> BrowserResult<Vec<Self::Element>>;

    /// Runs a script that returns an element, a list of elements or null
    async fn select_by_script(
        &mut self,
        script: &str,
        args: Vec<Value>,
    ) -> BrowserResult<Vec<Self::Element>>;

    /// Runs a script and returns its JSON result
    async fn run_script(&mut self, script: &str, args: Vec<Value>) -> BrowserResult<Value>;

    /// Visible text of an element
    async fn text(&mut self, element: &Self::Element) -> BrowserResult<String>;

    /// Serialized markup of an element and its descendants
    async fn outer_html(&mut self, element: &Self::Element) -> BrowserResult<String>;

    /// Clears an input and types a value into it
    async fn fill(&mut self, element: &Self::Element, value: &str) -> BrowserResult<()>;

    /// Clicks an element
    async fn click(&mut self, element: &Self::Element, mode: ClickMode) -> BrowserResult<()>;

    /// Scrolls an element to the vertical center of the viewport
    async fn scroll_into_view(&mut self, element: &Self::Element) -> BrowserResult<()>;

    /// Scrolls the window to a fraction of the document height
    async fn scroll_page(&mut self, fraction: f64) -> BrowserResult<()>;

    /// Saves a PNG screenshot of the viewport
    async fn screenshot(&mut self, path: &Path) -> BrowserResult<()>;

    /// Ends the session and releases the browser
    async fn quit(self) -> BrowserResult<()>;

    /// Waits until at least one element matches, up to `timeout`
    ///
    /// Always performs at least one lookup, so a zero timeout checks once.
    async fn wait_for(
        &mut self,
        locator: &Locator,
        timeout: Duration,
    ) -> BrowserResult<Self::Element> {
        let started = Instant::now();
        let deadline = started + timeout;

        loop {
            match self.find_all(locator).await {
                Ok(mut found) if !found.is_empty() => return Ok(found.swap_remove(0)),
                Ok(_) => {}
                Err(e) if e.is_session_lost() => return Err(e),
                Err(e) => tracing::trace!("Lookup for {} failed: {}", locator.as_str(), e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(BrowserError::Timeout {
                    what: locator.as_str().to_string(),
                    waited_ms: now.duration_since(started).as_millis() as u64,
                });
            }

            sleep(WAIT_POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}

/// Opens new browser sessions
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    type Session: BrowserSession;

    /// Starts a browser and returns a session ready to navigate
    async fn launch(&self, headless: bool) -> Result<Self::Session, StartError>;
}
