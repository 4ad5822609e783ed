/// Crawl progress tracking
///
/// This module defines the phases a crawl moves through and the mutable
/// state the orchestrator carries from category to category.
use crate::record::ProductRecord;
use crate::HarvestError;
use std::fmt;

/// Represents the current phase of the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Session is open and logged in; no category started yet
    Idle,

    /// Locating and opening a category
    Navigating,

    /// Looking for the given page of the current category
    Paginating { page: u32 },

    /// Reading product cards from the given page
    Extracting { page: u32 },

    /// Restarting a lost browser session
    Recovering,

    // ===== Settled Phases =====
    /// Current category finished (completed or abandoned)
    Done,

    /// Every category has been handled; ready to export
    Complete,
}

impl CrawlPhase {
    /// Returns true if the crawl has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Returns true if moving from this phase to `next` is allowed
    ///
    /// `Paginating` and `Extracting` must alternate with the page number
    /// advancing by one after each extracted page.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        match (*self, next) {
            (Idle | Done | Recovering, Navigating) => true,
            (Navigating, Paginating { page }) => page == 1,
            (Paginating { page: current }, Extracting { page }) => page == current,
            (Extracting { page: current }, Paginating { page }) => page == current + 1,
            (Navigating | Paginating { .. } | Extracting { .. }, Done) => true,
            (Idle | Navigating | Paginating { .. } | Extracting { .. } | Done, Recovering) => true,
            (Idle | Done | Recovering, Complete) => true,
            _ => false,
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Navigating => write!(f, "navigating"),
            Self::Paginating { page } => write!(f, "paginating (page {})", page),
            Self::Extracting { page } => write!(f, "extracting (page {})", page),
            Self::Recovering => write!(f, "recovering"),
            Self::Done => write!(f, "done"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Mutable crawl progress owned by the orchestrator
#[derive(Debug)]
pub struct CrawlState {
    /// Index into the configured category list
    pub category_index: usize,

    /// Page currently being processed (1-based, 0 before the first page)
    pub page: u32,

    /// Records accepted so far, in category order
    pub records: Vec<ProductRecord>,

    /// Most recent category that finished without being abandoned
    pub last_completed: Option<String>,

    /// Number of browser sessions started after the first one
    pub session_restarts: u32,

    phase: CrawlPhase,
}

impl CrawlState {
    pub fn new() -> Self {
        Self {
            category_index: 0,
            page: 0,
            records: Vec::new(),
            last_completed: None,
            session_restarts: 0,
            phase: CrawlPhase::Idle,
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Moves to `next`, rejecting transitions the state machine does not allow
    pub fn transition(&mut self, next: CrawlPhase) -> Result<(), HarvestError> {
        if !self.phase.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        tracing::trace!("Crawl phase {} -> {}", self.phase, next);

        if let CrawlPhase::Paginating { page } | CrawlPhase::Extracting { page } = next {
            self.page = page;
        }
        self.phase = next;
        Ok(())
    }

    /// Starts (or restarts) the category at `index` from page one
    pub fn begin_category(&mut self, index: usize) -> Result<(), HarvestError> {
        self.transition(CrawlPhase::Navigating)?;
        self.category_index = index;
        self.page = 0;
        Ok(())
    }

    /// Closes the current category and appends its records
    pub fn complete_category(
        &mut self,
        name: &str,
        records: Vec<ProductRecord>,
    ) -> Result<(), HarvestError> {
        self.transition(CrawlPhase::Done)?;
        self.records.extend(records);
        self.last_completed = Some(name.to_string());
        Ok(())
    }

    /// Closes the current category after a failure, keeping whatever was collected
    pub fn abandon_category(&mut self, partial: Vec<ProductRecord>) -> Result<(), HarvestError> {
        self.transition(CrawlPhase::Done)?;
        self.records.extend(partial);
        Ok(())
    }

    /// Enters recovery after the browser session was lost
    pub fn begin_recovery(&mut self) -> Result<(), HarvestError> {
        self.transition(CrawlPhase::Recovering)?;
        self.session_restarts += 1;
        Ok(())
    }

    /// Number of records collected for the given category
    pub fn count_for(&self, category: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.category == category)
            .count()
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}
