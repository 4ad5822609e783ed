//! Crawler module for storefront navigation and extraction
//!
//! This module contains the core crawling logic, including:
//! - Logging in and dismissing the welcome dialog
//! - Opening categories through a cascade of tile lookups
//! - Discovering product cards and extracting their fields
//! - Following pagination
//! - Overall crawl coordination with session recovery

pub mod auth;
mod coordinator;
pub mod extractor;
pub mod fields;
pub mod navigator;
pub mod overlay;
pub mod pagination;
mod scripts;

#[cfg(test)]
mod fake;

pub use coordinator::{Coordinator, MAX_RESTARTS_PER_CATEGORY};

use crate::browser::SessionLauncher;
use crate::config::Config;
use crate::output::{self, HarvestReport};
use crate::state::RunContext;
use crate::HarvestError;

/// Runs a complete harvest
///
/// This is the main entry point. It will:
/// 1. Launch the browser and log in
/// 2. Crawl every configured category
/// 3. Quit the browser
/// 4. Write the spreadsheet and the PDF
///
/// Exports run even when categories failed. An export failure is logged and
/// does not prevent the other export.
///
/// # Arguments
///
/// * `config` - Validated harvest configuration
/// * `launcher` - Opens browser sessions
/// * `context` - Run timestamp and output locations
///
/// # Returns
///
/// * `Ok(HarvestReport)` - The crawl ran; see the report for per-category outcomes
/// * `Err(HarvestError)` - The browser could not be started or logged in
pub async fn run_harvest<L: SessionLauncher>(
    config: Config,
    launcher: L,
    context: RunContext,
) -> Result<HarvestReport, HarvestError> {
    let report = Coordinator::new(config, launcher, context).run().await?;

    let exporters = output::default_exporters();
    let written = output::export_all(&report, &exporters);
    tracing::info!("{} of {} exports written", written.len(), exporters.len());

    Ok(report)
}
