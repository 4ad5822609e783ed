//! Exporter traits and types
//!
//! This module defines the trait interface for exporters and the report
//! they consume.

use crate::record::ProductRecord;
use crate::state::RunContext;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write spreadsheet: {0}")]
    Xlsx(String),

    #[error("Failed to write PDF: {0}")]
    Pdf(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// How a category ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryOutcome {
    /// Every page was visited
    Completed { pages: u32 },

    /// The category was given up; records collected before the failure are kept
    Abandoned { reason: String },

    /// The crawl stopped before reaching this category
    NotAttempted,
}

impl fmt::Display for CategoryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { pages } => write!(f, "completed ({} pages)", pages),
            Self::Abandoned { reason } => write!(f, "abandoned: {}", reason),
            Self::NotAttempted => write!(f, "not attempted"),
        }
    }
}

/// Everything a finished crawl produced
#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub context: RunContext,

    /// Configured categories, in crawl order
    pub categories: Vec<String>,

    /// Accepted records, grouped by category in crawl order
    pub records: Vec<ProductRecord>,

    /// One entry per configured category, in crawl order
    pub outcomes: Vec<(String, CategoryOutcome)>,

    pub session_restarts: u32,
}

impl HarvestReport {
    pub fn total_records(&self) -> usize {
        self.records.len()
    }

    /// Records belonging to one category
    pub fn records_for<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a ProductRecord> + 'a {
        self.records.iter().filter(move |r| r.category == category)
    }

    /// Record count for every configured category, zeros included
    pub fn category_counts(&self) -> Vec<(&str, usize)> {
        self.categories
            .iter()
            .map(|c| (c.as_str(), self.records_for(c).count()))
            .collect()
    }

    /// Categories that produced at least one record
    pub fn non_empty_categories(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .map(String::as_str)
            .filter(|c| self.records_for(c).next().is_some())
    }

    /// Outcome recorded for a category
    pub fn outcome(&self, category: &str) -> Option<&CategoryOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, outcome)| outcome)
    }
}

/// Trait for exporters
///
/// An exporter turns a finished report into one file.
pub trait Exporter {
    /// Short format name used in logs
    fn name(&self) -> &'static str;

    /// File the exporter writes for this run
    fn target_path(&self, context: &RunContext) -> PathBuf;

    /// Writes the report
    ///
    /// # Returns
    ///
    /// The path of the written file
    fn export(&self, report: &HarvestReport) -> OutputResult<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(category: &str, name: &str) -> ProductRecord {
        let mut record = ProductRecord::new(category);
        record.name = name.to_string();
        record
    }

    fn report() -> HarvestReport {
        HarvestReport {
            context: RunContext::new(true, ".", "."),
            categories: vec!["Inverter".into(), "VRF".into(), "Cassete".into()],
            records: vec![
                record("Inverter", "A"),
                record("Inverter", "B"),
                record("Cassete", "C"),
            ],
            outcomes: vec![
                ("Inverter".into(), CategoryOutcome::Completed { pages: 2 }),
                (
                    "VRF".into(),
                    CategoryOutcome::Abandoned {
                        reason: "not found".into(),
                    },
                ),
                ("Cassete".into(), CategoryOutcome::Completed { pages: 1 }),
            ],
            session_restarts: 0,
        }
    }

    #[test]
    fn test_category_counts_include_zeros() {
        assert_eq!(
            report().category_counts(),
            vec![("Inverter", 2), ("VRF", 0), ("Cassete", 1)]
        );
    }

    #[test]
    fn test_non_empty_categories_keep_order() {
        let report = report();
        let categories: Vec<_> = report.non_empty_categories().collect();
        assert_eq!(categories, vec!["Inverter", "Cassete"]);
    }

    #[test]
    fn test_outcome_lookup() {
        let report = report();
        assert_eq!(
            report.outcome("Inverter"),
            Some(&CategoryOutcome::Completed { pages: 2 })
        );
        assert_eq!(report.outcome("Piso Teto"), None);
        assert_eq!(report.total_records(), 3);
    }
}
