//! Statistics for a finished harvest
//!
//! This module condenses a `HarvestReport` into counts for the end-of-run
//! summary printed by the binary.

use crate::output::traits::{CategoryOutcome, HarvestReport};

/// Harvest statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestStatistics {
    /// Total number of accepted records
    pub total_records: usize,

    /// Records and outcome per category, in crawl order
    pub per_category: Vec<(String, usize, CategoryOutcome)>,

    /// Categories whose pages were all visited
    pub completed: usize,

    /// Categories given up after an error
    pub abandoned: usize,

    /// Categories the crawl never reached
    pub not_attempted: usize,

    /// Browser sessions started after the first one
    pub session_restarts: u32,
}

/// Computes statistics from a report
pub fn load_statistics(report: &HarvestReport) -> HarvestStatistics {
    let per_category: Vec<_> = report
        .category_counts()
        .into_iter()
        .map(|(category, count)| {
            let outcome = report
                .outcome(category)
                .cloned()
                .unwrap_or(CategoryOutcome::NotAttempted);
            (category.to_string(), count, outcome)
        })
        .collect();

    let count = |predicate: fn(&CategoryOutcome) -> bool| {
        per_category.iter().filter(|(_, _, o)| predicate(o)).count()
    };

    HarvestStatistics {
        total_records: report.total_records(),
        completed: count(|o| matches!(o, CategoryOutcome::Completed { .. })),
        abandoned: count(|o| matches!(o, CategoryOutcome::Abandoned { .. })),
        not_attempted: count(|o| matches!(o, CategoryOutcome::NotAttempted)),
        session_restarts: report.session_restarts,
        per_category,
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Total products: {}", stats.total_records);
    println!("  Categories completed: {}", stats.completed);
    println!("  Categories abandoned: {}", stats.abandoned);
    println!("  Categories not attempted: {}", stats.not_attempted);
    println!("  Session restarts: {}", stats.session_restarts);
    println!();

    println!("Products by Category:");
    for (category, count, outcome) in &stats.per_category {
        let percentage = if stats.total_records > 0 {
            (*count as f64 / stats.total_records as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%) - {}", category, count, percentage, outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ProductRecord;
    use crate::state::RunContext;

    #[test]
    fn test_statistics_from_report() {
        let report = HarvestReport {
            context: RunContext::new(false, ".", "."),
            categories: vec!["Inverter".into(), "VRF".into(), "Cassete".into()],
            records: vec![
                ProductRecord::new("Inverter"),
                ProductRecord::new("Inverter"),
                ProductRecord::new("VRF"),
            ],
            outcomes: vec![
                ("Inverter".into(), CategoryOutcome::Completed { pages: 3 }),
                (
                    "VRF".into(),
                    CategoryOutcome::Abandoned {
                        reason: "no cards".into(),
                    },
                ),
            ],
            session_restarts: 1,
        };

        let stats = load_statistics(&report);

        assert_eq!(stats.total_records, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.abandoned, 1);
        assert_eq!(stats.not_attempted, 1);
        assert_eq!(stats.session_restarts, 1);
        assert_eq!(
            stats.per_category[2],
            ("Cassete".to_string(), 0, CategoryOutcome::NotAttempted)
        );
    }
}
