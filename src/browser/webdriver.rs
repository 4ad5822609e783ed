//! Chrome sessions over the WebDriver protocol
//!
//! `ChromeLauncher` acquires a driver in two steps: a local chromedriver
//! spawned on the configured port, then an already-running WebDriver server
//! at the remote URL. The first path that yields a session wins.

use crate::browser::driver::{wait_until_ready, DriverProcess, Platform};
use crate::browser::session::{
    BrowserError, BrowserResult, BrowserSession, ClickMode, Locator, SessionLauncher,
};
use crate::config::DriverConfig;
use crate::StartError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use thirtyfour::error::WebDriverError;
use thirtyfour::fantoccini::error::CmdError;
use thirtyfour::prelude::*;
use thirtyfour::ChromeCapabilities;

const CLICK_SCRIPT: &str = "arguments[0].click();";
const SCROLL_CENTER_SCRIPT: &str = "arguments[0].scrollIntoView({block: 'center', inline: 'center'});";
const SCROLL_PAGE_SCRIPT: &str =
    "window.scrollTo(0, Math.floor(document.body.scrollHeight * arguments[0]));";

const CHROME_ARGS: &[&str] = &[
    "--start-maximized",
    "--disable-extensions",
    "--disable-notifications",
    "--disable-popup-blocking",
];

impl From<WebDriverError> for BrowserError {
    fn from(e: WebDriverError) -> Self {
        let message = e.to_string();
        match e {
            WebDriverError::NoSuchWindow(_) => BrowserError::SessionLost(message),
            // thirtyfour also reports stale elements as missing
            WebDriverError::NoSuchElement(_) => BrowserError::NotFound(message),
            WebDriverError::Timeout(_) => BrowserError::Timeout {
                what: message,
                waited_ms: 0,
            },
            WebDriverError::CmdError(CmdError::Standard(status)) => {
                from_error_code(status.error(), message)
            }
            WebDriverError::CmdError(CmdError::Lost(_)) => BrowserError::SessionLost(message),
            WebDriverError::CmdError(CmdError::WaitTimeout) => BrowserError::Timeout {
                what: message,
                waited_ms: 0,
            },
            _ => BrowserError::classify(&message),
        }
    }
}

/// Maps a W3C WebDriver error code, falling back to the message table
fn from_error_code(code: &str, message: String) -> BrowserError {
    match code {
        "invalid session id" | "no such window" => BrowserError::SessionLost(message),
        "no such element" => BrowserError::NotFound(message),
        "stale element reference" => BrowserError::StaleElement(message),
        "javascript error" => BrowserError::Script(message),
        "timeout" | "script timeout" => BrowserError::Timeout {
            what: message,
            waited_ms: 0,
        },
        _ => BrowserError::classify(&message),
    }
}

/// Launches Chrome sessions according to the driver configuration
pub struct ChromeLauncher {
    config: DriverConfig,
    platform: Platform,
}

impl ChromeLauncher {
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            platform: Platform::current(),
        }
    }

    /// Builds Chrome capabilities for this platform
    fn capabilities(&self, headless: bool) -> Result<ChromeCapabilities, StartError> {
        let to_start_error = |e: WebDriverError| StartError::Session {
            url: "capabilities".to_string(),
            message: e.to_string(),
        };

        let mut caps = DesiredCapabilities::chrome();
        for arg in CHROME_ARGS {
            caps.add_chrome_arg(arg).map_err(to_start_error)?;
        }

        if headless {
            caps.set_headless().map_err(to_start_error)?;
        }

        let binary = self
            .config
            .chrome_binary
            .as_deref()
            .or_else(|| self.platform.default_chrome_binary());
        if let Some(binary) = binary {
            tracing::debug!("Using Chrome binary at {}", binary);
            caps.set_binary(binary).map_err(to_start_error)?;
        }

        Ok(caps)
    }

    /// Spawns a local chromedriver and opens a session through it
    async fn launch_local(
        &self,
        caps: ChromeCapabilities,
    ) -> Result<WebDriverSession, StartError> {
        let executable = self
            .config
            .chromedriver_path
            .as_deref()
            .unwrap_or_else(|| self.platform.driver_executable());

        let process = DriverProcess::spawn(executable, self.config.port)?;
        let url = process.url().to_string();
        let startup = Duration::from_secs(self.config.startup_timeout_secs);

        if let Err(e) = wait_until_ready(&url, startup).await {
            process.shutdown().await;
            return Err(e);
        }

        match WebDriver::new(&url, caps).await {
            Ok(driver) => Ok(WebDriverSession::new(driver, Some(process))),
            Err(e) => {
                process.shutdown().await;
                Err(StartError::Session {
                    url,
                    message: e.to_string(),
                })
            }
        }
    }

    /// Opens a session on an already-running WebDriver server
    async fn launch_remote(
        &self,
        caps: ChromeCapabilities,
    ) -> Result<WebDriverSession, StartError> {
        let url = self.config.remote_url.as_str();
        let driver = WebDriver::new(url, caps)
            .await
            .map_err(|e| StartError::Session {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(WebDriverSession::new(driver, None))
    }
}

#[async_trait]
impl SessionLauncher for ChromeLauncher {
    type Session = WebDriverSession;

    async fn launch(&self, headless: bool) -> Result<WebDriverSession, StartError> {
        let caps = self.capabilities(headless)?;
        let mut failures = Vec::new();

        let session = match self.launch_local(caps.clone()).await {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Local chromedriver unavailable: {}", e);
                failures.push(e.to_string());
                None
            }
        };

        let session = match session {
            Some(session) => session,
            None => match self.launch_remote(caps).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!("Remote WebDriver unavailable: {}", e);
                    failures.push(e.to_string());
                    return Err(StartError::Exhausted(failures.join("; ")));
                }
            },
        };

        let implicit_wait = Duration::from_secs(self.config.implicit_wait_secs);
        if let Err(e) = session.driver.set_implicit_wait_timeout(implicit_wait).await {
            tracing::warn!("Could not set implicit wait: {}", e);
        }

        tracing::info!(
            "Browser session started (headless: {}, local driver: {})",
            headless,
            session.process.is_some()
        );
        Ok(session)
    }
}

/// A Chrome session driven through thirtyfour
pub struct WebDriverSession {
    driver: WebDriver,
    process: Option<DriverProcess>,
}

impl WebDriverSession {
    fn new(driver: WebDriver, process: Option<DriverProcess>) -> Self {
        Self { driver, process }
    }

    fn by(locator: &Locator) -> By {
        match locator {
            Locator::Css(selector) => By::Css(selector.as_str()),
            Locator::XPath(expression) => By::XPath(expression.as_str()),
        }
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    type Element = WebElement;

    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn find_all(&mut self, locator: &Locator) -> BrowserResult<Vec<WebElement>> {
        Ok(self.driver.find_all(Self::by(locator)).await?)
    }

    async fn select_by_script(
        &mut self,
        script: &str,
        args: Vec<Value>,
    ) -> BrowserResult<Vec<WebElement>> {
        let ret = self.driver.execute(script, args).await?;

        match ret.json() {
            Value::Null => Ok(Vec::new()),
            Value::Array(_) => Ok(ret.elements()?),
            _ => Ok(vec![ret.element()?]),
        }
    }

    async fn run_script(&mut self, script: &str, args: Vec<Value>) -> BrowserResult<Value> {
        let ret = self.driver.execute(script, args).await?;
        Ok(ret.json().clone())
    }

    async fn text(&mut self, element: &WebElement) -> BrowserResult<String> {
        Ok(element.text().await?)
    }

    async fn outer_html(&mut self, element: &WebElement) -> BrowserResult<String> {
        Ok(element.outer_html().await?)
    }

    async fn fill(&mut self, element: &WebElement, value: &str) -> BrowserResult<()> {
        element.clear().await?;
        element.send_keys(value).await?;
        Ok(())
    }

    async fn click(&mut self, element: &WebElement, mode: ClickMode) -> BrowserResult<()> {
        match mode {
            ClickMode::Interactive => element.click().await?,
            ClickMode::Synthetic => {
                self.driver
                    .execute(CLICK_SCRIPT, vec![element.to_json()?])
                    .await?;
            }
        }
        Ok(())
    }

    async fn scroll_into_view(&mut self, element: &WebElement) -> BrowserResult<()> {
        self.driver
            .execute(SCROLL_CENTER_SCRIPT, vec![element.to_json()?])
            .await?;
        Ok(())
    }

    async fn scroll_page(&mut self, fraction: f64) -> BrowserResult<()> {
        self.driver
            .execute(SCROLL_PAGE_SCRIPT, vec![json!(fraction)])
            .await?;
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path) -> BrowserResult<()> {
        self.driver.screenshot(path).await?;
        Ok(())
    }

    async fn quit(self) -> BrowserResult<()> {
        let result = self.driver.quit().await;

        if let Some(process) = self.process {
            process.shutdown().await;
        }

        result.map_err(BrowserError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_errors_map_by_variant() {
        assert!(BrowserError::from(WebDriverError::NoSuchWindow("gone".into())).is_session_lost());
        assert!(matches!(
            BrowserError::from(WebDriverError::NoSuchElement("div.q-card".into())),
            BrowserError::NotFound(_)
        ));
        assert!(matches!(
            BrowserError::from(WebDriverError::Timeout("div.q-layout".into())),
            BrowserError::Timeout { .. }
        ));
        assert!(matches!(
            BrowserError::from(WebDriverError::CmdError(CmdError::WaitTimeout)),
            BrowserError::Timeout { .. }
        ));
    }

    #[test]
    fn test_lost_connection_is_session_loss() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        assert!(BrowserError::from(WebDriverError::CmdError(CmdError::Lost(io))).is_session_lost());
    }

    #[test]
    fn test_unstructured_errors_fall_back_to_message() {
        assert!(BrowserError::from(WebDriverError::CustomError(
            "unknown error: chrome not reachable".into()
        ))
        .is_session_lost());
        assert!(matches!(
            BrowserError::from(WebDriverError::CmdError(CmdError::NotJson(
                "bad gateway".into()
            ))),
            BrowserError::Other(_)
        ));
    }

    #[test]
    fn test_standard_error_codes() {
        let lost = from_error_code("invalid session id", "session deleted".into());
        assert!(lost.is_session_lost());
        assert!(matches!(
            from_error_code("stale element reference", "detached".into()),
            BrowserError::StaleElement(_)
        ));
        assert!(matches!(
            from_error_code("javascript error", "x is not defined".into()),
            BrowserError::Script(_)
        ));
        assert!(matches!(
            from_error_code("script timeout", "took too long".into()),
            BrowserError::Timeout { .. }
        ));
        assert!(matches!(
            from_error_code("element click intercepted", "covered".into()),
            BrowserError::Other(_)
        ));
    }
}
