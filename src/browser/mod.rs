//! Browser control for Leveros Harvest
//!
//! This module contains everything that touches the browser:
//! - The `BrowserSession` and `SessionLauncher` traits the crawl loop is written against
//! - Classification of driver failures into session loss and recoverable errors
//! - Local chromedriver management and the thirtyfour-backed Chrome session

mod driver;
mod session;
mod webdriver;

pub use driver::{build_probe_client, probe_status, wait_until_ready, DriverProcess, Platform};
pub use session::{
    BrowserError, BrowserResult, BrowserSession, ClickMode, Locator, SessionLauncher, Tolerate,
    WAIT_POLL_INTERVAL,
};
pub use webdriver::{ChromeLauncher, WebDriverSession};
