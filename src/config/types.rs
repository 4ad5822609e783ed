use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Main configuration structure for Leveros Harvest
///
/// Every section has built-in defaults, so an override file only needs to
/// contain the keys it changes. Credentials are never read from the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub driver: DriverConfig,
    pub timing: TimingConfig,
    pub output: OutputConfig,

    /// Ordered category list; defines crawl order and export ordering
    pub categories: Vec<String>,

    #[serde(skip)]
    pub credentials: Credentials,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            driver: DriverConfig::default(),
            timing: TimingConfig::default(),
            output: OutputConfig::default(),
            categories: default_categories(),
            credentials: Credentials::default(),
        }
    }
}

/// The product categories offered by the storefront, in menu order
pub fn default_categories() -> Vec<String> {
    [
        "Inverter",
        "Convencional",
        "Multi-Split",
        "Ar Janela",
        "Cassete",
        "Piso Teto",
        "VRF",
        "Ar Portátil",
        "Climatizador",
        "Ventilador",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect()
}

/// Storefront addresses
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Login page of the dealer portal
    pub login_url: String,

    /// Public asset directory that product images are rewritten onto
    pub public_image_base: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            login_url: "https://leverosintegra.dev.br/login".to_string(),
            public_image_base: "https://www.vendas.leveros.com.br/upload/produto/imagem/"
                .to_string(),
        }
    }
}

/// WebDriver acquisition settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DriverConfig {
    /// Path or name of the local chromedriver executable
    pub chromedriver_path: Option<String>,

    /// Port the local chromedriver listens on
    pub port: u16,

    /// Already-running WebDriver server used when no local driver starts
    pub remote_url: String,

    /// Explicit Chrome binary location (platform default when absent)
    pub chrome_binary: Option<String>,

    /// How long to wait for a driver to report ready (seconds)
    pub startup_timeout_secs: u64,

    /// Baseline implicit element wait applied to every lookup (seconds)
    pub implicit_wait_secs: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            chromedriver_path: None,
            port: 9515,
            remote_url: "http://localhost:4444".to_string(),
            chrome_binary: None,
            startup_timeout_secs: 15,
            implicit_wait_secs: 10,
        }
    }
}

/// Settle delays and bounded waits used by the crawl loop
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TimingConfig {
    /// Pause after a navigation before the page is inspected (ms)
    pub page_settle_ms: u64,

    /// Pause before looking for the welcome overlay (ms)
    pub overlay_settle_ms: u64,

    /// Pause after scrolling an element into view (ms)
    pub click_settle_ms: u64,

    /// Pause after a pagination click for the next page to render (ms)
    pub page_load_settle_ms: u64,

    /// Pause after each incremental scroll during card discovery (ms)
    pub scroll_settle_ms: u64,

    /// Pause before reading each card (ms)
    pub card_settle_ms: u64,

    /// Pause between failed reads of the same card (ms)
    pub card_retry_delay_ms: u64,

    /// Pause between attempts to see product cards after a category click (ms)
    pub content_retry_delay_ms: u64,

    /// Maximum wait for the post-login layout (seconds)
    pub login_timeout_secs: u64,

    /// Maximum wait for product cards per attempt (seconds)
    pub card_wait_timeout_secs: u64,

    /// Upper bound on pages visited per category
    pub max_pages_per_category: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            page_settle_ms: 3000,
            overlay_settle_ms: 2000,
            click_settle_ms: 1000,
            page_load_settle_ms: 3000,
            scroll_settle_ms: 2000,
            card_settle_ms: 500,
            card_retry_delay_ms: 2000,
            content_retry_delay_ms: 2000,
            login_timeout_secs: 15,
            card_wait_timeout_secs: 5,
            max_pages_per_category: 200,
        }
    }
}

impl TimingConfig {
    /// A timing profile with every pause and wait set to zero
    ///
    /// Used to drive the crawl loop against in-memory sessions.
    pub fn zero() -> Self {
        Self {
            page_settle_ms: 0,
            overlay_settle_ms: 0,
            click_settle_ms: 0,
            page_load_settle_ms: 0,
            scroll_settle_ms: 0,
            card_settle_ms: 0,
            card_retry_delay_ms: 0,
            content_retry_delay_ms: 0,
            login_timeout_secs: 0,
            card_wait_timeout_secs: 0,
            ..Self::default()
        }
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn overlay_settle(&self) -> Duration {
        Duration::from_millis(self.overlay_settle_ms)
    }

    pub fn click_settle(&self) -> Duration {
        Duration::from_millis(self.click_settle_ms)
    }

    pub fn page_load_settle(&self) -> Duration {
        Duration::from_millis(self.page_load_settle_ms)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_ms)
    }

    pub fn card_settle(&self) -> Duration {
        Duration::from_millis(self.card_settle_ms)
    }

    pub fn card_retry_delay(&self) -> Duration {
        Duration::from_millis(self.card_retry_delay_ms)
    }

    pub fn content_retry_delay(&self) -> Duration {
        Duration::from_millis(self.content_retry_delay_ms)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn card_wait_timeout(&self) -> Duration {
        Duration::from_secs(self.card_wait_timeout_secs)
    }
}

/// Output locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory the spreadsheet and PDF are written to
    pub directory: String,

    /// Directory diagnostic screenshots are written to
    pub diagnostics_directory: String,

    /// Log file path (appended to)
    pub log_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            diagnostics_directory: ".".to_string(),
            log_file: "leveros_harvest.log".to_string(),
        }
    }
}

/// Portal login credentials, injected from the environment
#[derive(Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
