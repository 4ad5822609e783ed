//! State module for tracking crawl progress
//!
//! This module provides the state carried through a single harvest run.
//!
//! # Components
//!
//! - `CrawlPhase`: The phase of the category/page loop, with its allowed transitions
//! - `CrawlState`: Category index, page number, accumulated records and restart count
//! - `RunContext`: Run timestamp, output locations and derived file names

mod crawl_state;
mod run_context;

// Re-export main types
pub use crawl_state::{CrawlPhase, CrawlState};
pub use run_context::{RunContext, TIMESTAMP_FORMAT};
