//! Local driver process management
//!
//! This module handles the chromedriver side of browser startup:
//! - Detecting the host platform and its executable naming
//! - Spawning a local chromedriver on a fixed port
//! - Probing the WebDriver `/status` endpoint until the driver is ready

use crate::StartError;
use reqwest::Client;
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Instant};

/// Interval between readiness probes
const PROBE_INTERVAL: Duration = Duration::from_millis(250);

/// Chrome location on Apple Silicon machines, where auto-discovery is unreliable
const MACOS_ARM_CHROME: &str = "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome";

/// Host operating system and architecture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    /// The platform this process runs on
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Default chromedriver executable name for this platform
    pub fn driver_executable(&self) -> &'static str {
        if self.os == "windows" {
            "chromedriver.exe"
        } else {
            "chromedriver"
        }
    }

    /// Chrome binary to pin for this platform, if any
    pub fn default_chrome_binary(&self) -> Option<&'static str> {
        if self.os == "macos" && self.arch == "aarch64" {
            Some(MACOS_ARM_CHROME)
        } else {
            None
        }
    }
}

/// A chromedriver child process owned by a browser session
///
/// The process is killed when this handle is dropped.
#[derive(Debug)]
pub struct DriverProcess {
    child: Child,
    url: String,
}

impl DriverProcess {
    /// Spawns chromedriver listening on `port`
    ///
    /// # Arguments
    ///
    /// * `executable` - Path or name of the chromedriver binary
    /// * `port` - Local port for the WebDriver endpoint
    pub fn spawn(executable: &str, port: u16) -> Result<Self, StartError> {
        let child = Command::new(executable)
            .arg(format!("--port={}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| StartError::Spawn {
                path: executable.to_string(),
                source,
            })?;

        Ok(Self {
            child,
            url: format!("http://localhost:{}", port),
        })
    }

    /// WebDriver endpoint served by this process
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Terminates the process and waits for it to exit
    pub async fn shutdown(mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::debug!("chromedriver already exited: {}", e);
        }
    }
}

/// Builds the HTTP client used for readiness probes
///
/// # Returns
///
/// * `Ok(Client)` - Client with short request timeouts
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_probe_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(Duration::from_secs(2))
        .connect_timeout(Duration::from_secs(1))
        .build()
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    value: StatusValue,
}

#[derive(Debug, Deserialize)]
struct StatusValue {
    #[serde(default)]
    ready: bool,
}

/// Asks a WebDriver server whether it accepts new sessions
pub async fn probe_status(client: &Client, base_url: &str) -> bool {
    let url = format!("{}/status", base_url.trim_end_matches('/'));

    match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => response
            .json::<StatusResponse>()
            .await
            .map(|status| status.value.ready)
            .unwrap_or(false),
        Ok(response) => {
            tracing::trace!("{} answered {}", url, response.status());
            false
        }
        Err(e) => {
            tracing::trace!("{} unreachable: {}", url, e);
            false
        }
    }
}

/// Polls `/status` until the server is ready or `timeout` elapses
pub async fn wait_until_ready(base_url: &str, timeout: Duration) -> Result<(), StartError> {
    let client = build_probe_client().map_err(|e| StartError::Session {
        url: base_url.to_string(),
        message: e.to_string(),
    })?;
    let deadline = Instant::now() + timeout;

    loop {
        if probe_status(&client, base_url).await {
            tracing::debug!("WebDriver at {} is ready", base_url);
            return Ok(());
        }

        if Instant::now() >= deadline {
            return Err(StartError::NotReady {
                url: base_url.to_string(),
                waited_secs: timeout.as_secs(),
            });
        }

        sleep(PROBE_INTERVAL).await;
    }
}
