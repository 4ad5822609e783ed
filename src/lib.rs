//! Leveros Harvest: product listing extraction for the Leveros Integra portal
//!
//! This crate drives a WebDriver-controlled browser through the dealer
//! storefront: it logs in, walks a fixed list of product categories page by
//! page, turns product cards into records and exports them as a spreadsheet
//! and a PDF document. The crawl is best-effort; a failed category is logged
//! and skipped, and a lost browser session is restarted transparently.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod state;
pub mod url;

use thiserror::Error;

pub use browser::BrowserError;

/// Main error type for Leveros Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Browser startup failed: {0}")]
    Start(#[from] StartError),

    #[error("Login failed: {0}")]
    Login(#[from] LoginError),

    #[error("Navigation failed: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Returns true if the error means the browser session is unusable
    pub fn is_session_lost(&self) -> bool {
        match self {
            Self::Browser(e) => e.is_session_lost(),
            Self::Navigation(e) => e.is_session_lost(),
            Self::Login(e) => e.is_session_lost(),
            _ => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing credentials: environment variable {0} is not set")]
    MissingCredentials(String),
}

/// Errors raised while acquiring a driver and opening a browser session
#[derive(Debug, Error)]
pub enum StartError {
    #[error("Failed to spawn driver '{path}': {source}")]
    Spawn {
        path: String,
        source: std::io::Error,
    },

    #[error("Driver at {url} did not become ready within {waited_secs}s")]
    NotReady { url: String, waited_secs: u64 },

    #[error("WebDriver session could not be created at {url}: {message}")]
    Session { url: String, message: String },

    #[error("All driver acquisition paths failed: {0}")]
    Exhausted(String),
}

/// Errors raised by the login flow
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Login form element not found: {0}")]
    FieldMissing(String),

    #[error("Post-login layout did not appear within {0}s")]
    LayoutMissing(u64),

    #[error("Browser error during login: {0}")]
    Browser(#[from] BrowserError),
}

impl LoginError {
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::Browser(e) if e.is_session_lost())
    }
}

/// Category-scoped navigation errors
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("Category control not found: {0}")]
    NotFound(String),

    #[error("No product cards rendered for category {category}: {source}")]
    NoContent {
        category: String,
        source: BrowserError,
    },

    #[error("Browser error during navigation: {0}")]
    Browser(#[from] BrowserError),
}

impl NavigationError {
    pub fn is_session_lost(&self) -> bool {
        match self {
            Self::NotFound(_) => false,
            Self::NoContent { source, .. } => source.is_session_lost(),
            Self::Browser(e) => e.is_session_lost(),
        }
    }
}

/// Result type alias for Leveros Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_harvest, Coordinator};
pub use record::{ProductRecord, SENTINEL};
pub use state::{CrawlPhase, CrawlState, RunContext};
