//! Output module for exporting harvest results
//!
//! This module handles:
//! - Writing the multi-sheet spreadsheet
//! - Writing the paginated PDF document
//! - Summarizing the run for the console

mod pdf;
pub mod stats;
mod traits;
mod xlsx;

pub use pdf::PdfExporter;
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
pub use traits::{CategoryOutcome, Exporter, HarvestReport, OutputError, OutputResult};
pub use xlsx::{sheet_name, unique_sheet_name, XlsxExporter};

use std::path::PathBuf;

/// The exporters every run writes, spreadsheet first
pub fn default_exporters() -> Vec<Box<dyn Exporter>> {
    vec![Box::new(XlsxExporter::new()), Box::new(PdfExporter::new())]
}

/// Runs each exporter in turn
///
/// A failing exporter is logged and skipped so the others still run.
///
/// # Returns
///
/// The paths that were written
pub fn export_all(report: &HarvestReport, exporters: &[Box<dyn Exporter>]) -> Vec<PathBuf> {
    if report.records.is_empty() {
        tracing::warn!("No products were collected; writing empty exports");
    }

    if let Err(e) = std::fs::create_dir_all(report.context.output_dir()) {
        tracing::error!(
            "Could not create output directory {}: {}",
            report.context.output_dir().display(),
            e
        );
    }

    let mut written = Vec::with_capacity(exporters.len());

    for exporter in exporters {
        match exporter.export(report) {
            Ok(path) => written.push(path),
            Err(e) => tracing::error!(
                "{} export to {} failed: {}",
                exporter.name(),
                exporter.target_path(&report.context).display(),
                e
            ),
        }
    }

    written
}
