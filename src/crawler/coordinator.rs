//! Crawl coordinator - orchestrates the category and page loop
//!
//! This module contains the main crawl loop that:
//! - Opens a browser session and logs in
//! - Visits each configured category page by page
//! - Restarts the session when it is lost and retries the category
//! - Collects accepted records into a report for the exporters

use crate::browser::{BrowserSession, SessionLauncher};
use crate::config::Config;
use crate::crawler::auth::login;
use crate::crawler::extractor::{extract_page, ExtractSettings};
use crate::crawler::navigator::go_to_category;
use crate::crawler::pagination::has_next_page;
use crate::output::{CategoryOutcome, HarvestReport};
use crate::record::ProductRecord;
use crate::state::{CrawlPhase, CrawlState, RunContext};
use crate::HarvestError;

/// Session restarts allowed while working on a single category
pub const MAX_RESTARTS_PER_CATEGORY: u32 = 2;

/// Main crawl coordinator structure
pub struct Coordinator<L: SessionLauncher> {
    config: Config,
    launcher: L,
    context: RunContext,
    state: CrawlState,
    outcomes: Vec<(String, CategoryOutcome)>,
}

impl<L: SessionLauncher> Coordinator<L> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - Validated harvest configuration
    /// * `launcher` - Opens browser sessions, initially and after session loss
    /// * `context` - Run timestamp and output locations
    pub fn new(config: Config, launcher: L, context: RunContext) -> Self {
        Self {
            config,
            launcher,
            context,
            state: CrawlState::new(),
            outcomes: Vec::new(),
        }
    }

    /// Runs the crawl to completion
    ///
    /// Failing to start the browser or to log in the first time is fatal.
    /// Every later failure is contained to its category, or stops the crawl
    /// early with whatever was collected. The browser is quit on every path.
    ///
    /// # Returns
    ///
    /// * `Ok(HarvestReport)` - Records and per-category outcomes
    /// * `Err(HarvestError)` - The browser could not be started or logged in
    pub async fn run(mut self) -> Result<HarvestReport, HarvestError> {
        tracing::info!(
            "Starting harvest of {} categories",
            self.config.categories.len()
        );
        let start_time = std::time::Instant::now();

        let mut session = Some(self.open_session().await?);
        let result = self.crawl_categories(&mut session).await;

        if let Some(session) = session {
            shutdown(session).await;
        }
        result?;

        self.state.transition(CrawlPhase::Complete)?;

        tracing::info!(
            "Harvest completed: {} records in {:?} ({} session restarts)",
            self.state.records.len(),
            start_time.elapsed(),
            self.state.session_restarts
        );

        Ok(self.into_report())
    }

    /// Launches a browser and logs in
    async fn open_session(&self) -> Result<L::Session, HarvestError> {
        let mut session = self.launcher.launch(self.context.headless).await?;

        if let Err(e) = login(
            &mut session,
            &self.config.site,
            &self.config.credentials,
            &self.config.timing,
        )
        .await
        {
            shutdown(session).await;
            return Err(e.into());
        }

        Ok(session)
    }

    /// Replaces a lost session with a fresh, logged-in one
    async fn restart_session(
        &self,
        old: Option<L::Session>,
    ) -> Result<L::Session, HarvestError> {
        if let Some(old) = old {
            if let Err(e) = old.quit().await {
                tracing::debug!("Quitting the lost session failed: {}", e);
            }
        }

        tracing::info!("Restarting browser session");
        self.open_session().await
    }

    /// Visits every category in order
    ///
    /// Leaves `session` as `None` only if a restart failed.
    async fn crawl_categories(
        &mut self,
        session: &mut Option<L::Session>,
    ) -> Result<(), HarvestError> {
        let categories = self.config.categories.clone();

        for (index, category) in categories.iter().enumerate() {
            let mut restarts = 0;

            loop {
                let Some(current) = session.as_mut() else {
                    return Ok(());
                };

                self.state.begin_category(index)?;
                let mut buffer = Vec::new();

                let error = match self.process_category(current, category, &mut buffer).await {
                    Ok(pages) => {
                        tracing::info!(
                            "Category {} done: {} records from {} pages",
                            category,
                            buffer.len(),
                            pages
                        );
                        self.state.complete_category(category, buffer)?;
                        self.record_outcome(category, CategoryOutcome::Completed { pages });
                        break;
                    }
                    Err(e) => e,
                };

                if !error.is_session_lost() {
                    tracing::error!("Abandoning category {}: {}", category, error);
                    self.state.abandon_category(buffer)?;
                    self.record_outcome(
                        category,
                        CategoryOutcome::Abandoned {
                            reason: error.to_string(),
                        },
                    );
                    break;
                }

                tracing::warn!(
                    "Browser session lost in category {} ({} records discarded): {}",
                    category,
                    buffer.len(),
                    error
                );

                let exhausted = restarts >= MAX_RESTARTS_PER_CATEGORY;
                if exhausted {
                    tracing::error!(
                        "Giving up on category {} after {} session restarts",
                        category,
                        restarts
                    );
                    self.state.abandon_category(Vec::new())?;
                    self.record_outcome(
                        category,
                        CategoryOutcome::Abandoned {
                            reason: format!("session lost after {} restarts", restarts),
                        },
                    );

                    if index + 1 == categories.len() {
                        break;
                    }
                }

                self.state.begin_recovery()?;
                match self.restart_session(session.take()).await {
                    Ok(fresh) => *session = Some(fresh),
                    Err(e) => {
                        tracing::error!("Could not restart the browser session: {}", e);
                        if !exhausted {
                            self.record_outcome(
                                category,
                                CategoryOutcome::Abandoned {
                                    reason: format!("session restart failed: {}", e),
                                },
                            );
                        }
                        return Ok(());
                    }
                }

                if exhausted {
                    break;
                }
                restarts += 1;
            }
        }

        Ok(())
    }

    /// Crawls one category from its first page
    ///
    /// Records are pushed into `buffer` page by page, so a caller that sees
    /// an error still holds what was collected before it.
    ///
    /// # Returns
    ///
    /// The number of pages visited
    async fn process_category(
        &mut self,
        session: &mut L::Session,
        category: &str,
        buffer: &mut Vec<ProductRecord>,
    ) -> Result<u32, HarvestError> {
        let timing = &self.config.timing;
        go_to_category(session, category, timing).await?;

        let settings = ExtractSettings {
            timing,
            public_image_base: &self.config.site.public_image_base,
            screenshot_path: self.context.screenshot_path(category),
        };

        let mut page = 1;
        loop {
            self.state.transition(CrawlPhase::Paginating { page })?;
            self.state.transition(CrawlPhase::Extracting { page })?;

            let records = extract_page(session, category, &settings).await?;
            tracing::info!(
                "{} page {}: {} records",
                category,
                page,
                records.len()
            );
            buffer.extend(records);

            if page >= timing.max_pages_per_category {
                tracing::warn!(
                    "Stopping {} at the page limit ({})",
                    category,
                    timing.max_pages_per_category
                );
                break;
            }

            if !has_next_page(session, timing).await? {
                break;
            }
            page += 1;
        }

        Ok(page)
    }

    fn record_outcome(&mut self, category: &str, outcome: CategoryOutcome) {
        self.outcomes.push((category.to_string(), outcome));
    }

    fn into_report(self) -> HarvestReport {
        let mut recorded = self.outcomes;
        let outcomes = self
            .config
            .categories
            .iter()
            .map(|category| {
                let outcome = recorded
                    .iter()
                    .position(|(name, _)| name == category)
                    .map(|i| recorded.swap_remove(i).1)
                    .unwrap_or(CategoryOutcome::NotAttempted);
                (category.clone(), outcome)
            })
            .collect();

        HarvestReport {
            context: self.context,
            categories: self.config.categories,
            records: self.state.records,
            outcomes,
            session_restarts: self.state.session_restarts,
        }
    }
}

/// Quits a session, logging rather than returning failures
async fn shutdown<S: BrowserSession>(session: S) {
    match session.quit().await {
        Ok(()) => tracing::info!("Browser closed"),
        Err(e) => tracing::warn!("Closing the browser failed: {}", e),
    }
}
