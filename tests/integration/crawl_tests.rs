//! Integration tests for the crawler
//!
//! These tests drive the full harvest against an in-memory storefront that
//! answers the same selectors and scripts as the live portal, and against a
//! wiremock WebDriver endpoint for startup failures.

use async_trait::async_trait;
use leveros_harvest::browser::{
    BrowserError, BrowserResult, BrowserSession, ChromeLauncher, ClickMode, Locator,
    SessionLauncher,
};
use leveros_harvest::config::{Config, Credentials, DriverConfig, TimingConfig};
use leveros_harvest::crawler::auth::{APP_LAYOUT, PASSWORD_INPUT, SUBMIT_BUTTON, USERNAME_INPUT};
use leveros_harvest::crawler::extractor::CARD_SELECTORS;
use leveros_harvest::crawler::navigator::{exact_text_xpath, CATEGORY_TILE, PRODUCT_CARD};
use leveros_harvest::output::CategoryOutcome;
use leveros_harvest::{run_harvest, Coordinator, HarvestError, RunContext, StartError};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A category as rendered by the storefront: product names per page
struct Shelf {
    name: String,
    pages: Vec<Vec<String>>,
}

/// Shared storefront state seen by every session
#[derive(Default)]
struct Storefront {
    shelves: Vec<Shelf>,
    /// Session ids whose browser has died
    dead: HashSet<usize>,
    launches: usize,
    logins: usize,
    logged_in: bool,
    /// Open category index and page
    current: Option<(usize, usize)>,
    /// Kill the session on the first card read of this category page
    lose_session_at: Option<(String, usize)>,
    /// Kill the session on every card read of this category
    always_lose: Option<String>,
    /// Launch attempts beyond this count fail
    max_launches: Option<usize>,
    screenshots: Vec<PathBuf>,
}

impl Storefront {
    fn new(shelves: Vec<(&str, Vec<Vec<&str>>)>) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self {
            shelves: shelves
                .into_iter()
                .map(|(name, pages)| Shelf {
                    name: name.to_string(),
                    pages: pages
                        .into_iter()
                        .map(|page| page.into_iter().map(str::to_string).collect())
                        .collect(),
                })
                .collect(),
            ..Default::default()
        }))
    }

    fn visible_cards(&self) -> Vec<Element> {
        let Some((shelf, page)) = self.current else {
            return Vec::new();
        };
        self.shelves[shelf].pages[page]
            .iter()
            .map(|name| Element::Card(card_html(name)))
            .collect()
    }
}

fn card_html(name: &str) -> String {
    format!(
        r#"<div class="q-card my-card q-hoverable">
             <div class="q-img"><img src="https://leverosintegra.dev.br/img/produto/{slug}.png"></div>
             <div class="q-chip q-chip--outline">220V</div>
             <div class="menuItems text-caption q-pt-sm ellipsis-2-lines">{name}</div>
             <div class="text-h6 text-weight-bold text-teal-9">R$ 1.999,00</div>
             <div class="text-caption">R$ 1.899,05 à vista</div>
             <div class="text-caption text-weight-bold">10x de R$ 199,90</div>
           </div>"#,
        slug = name.replace(' ', "-"),
        name = name
    )
}

#[derive(Debug, Clone)]
enum Element {
    Input,
    Submit,
    Layout,
    Tile(usize),
    Card(String),
    NextPage,
}

struct StorefrontSession {
    id: usize,
    site: Arc<Mutex<Storefront>>,
}

impl StorefrontSession {
    fn site(&self) -> BrowserResult<std::sync::MutexGuard<'_, Storefront>> {
        let site = self.site.lock().unwrap();
        if site.dead.contains(&self.id) {
            return Err(BrowserError::SessionLost(
                "no such window: target window already closed".to_string(),
            ));
        }
        Ok(site)
    }
}

#[async_trait]
impl BrowserSession for StorefrontSession {
    type Element = Element;

    async fn navigate(&mut self, _url: &str) -> BrowserResult<()> {
        self.site()?.current = None;
        Ok(())
    }

    async fn find_all(&mut self, locator: &Locator) -> BrowserResult<Vec<Element>> {
        let site = self.site()?;

        let found = match locator {
            Locator::Css(s) if s == USERNAME_INPUT || s == PASSWORD_INPUT => vec![Element::Input],
            Locator::XPath(x) if x == SUBMIT_BUTTON => vec![Element::Submit],
            Locator::Css(s) if s == APP_LAYOUT && site.logged_in => vec![Element::Layout],
            Locator::Css(s) if s == CATEGORY_TILE => {
                (0..site.shelves.len()).map(Element::Tile).collect()
            }
            Locator::Css(s) if s == PRODUCT_CARD || s == CARD_SELECTORS[0] => {
                site.visible_cards()
            }
            Locator::XPath(x) => site
                .shelves
                .iter()
                .position(|shelf| *x == exact_text_xpath(&shelf.name))
                .map(Element::Tile)
                .into_iter()
                .collect(),
            _ => Vec::new(),
        };

        Ok(found)
    }

    async fn select_by_script(
        &mut self,
        script: &str,
        _args: Vec<Value>,
    ) -> BrowserResult<Vec<Element>> {
        let site = self.site()?;

        if script.contains("fast_forward") {
            if let Some((shelf, page)) = site.current {
                if page + 1 < site.shelves[shelf].pages.len() {
                    return Ok(vec![Element::NextPage]);
                }
            }
        }

        Ok(Vec::new())
    }

    async fn run_script(&mut self, _script: &str, _args: Vec<Value>) -> BrowserResult<Value> {
        self.site()?;
        Ok(Value::Null)
    }

    async fn text(&mut self, element: &Element) -> BrowserResult<String> {
        let site = self.site()?;
        Ok(match element {
            Element::Tile(index) => site.shelves[*index].name.clone(),
            _ => String::new(),
        })
    }

    async fn outer_html(&mut self, element: &Element) -> BrowserResult<String> {
        let id = self.id;
        let mut site = self.site()?;

        if let (Some((target, target_page)), Some((shelf, page))) =
            (site.lose_session_at.clone(), site.current)
        {
            if site.shelves[shelf].name == target && page == target_page {
                site.lose_session_at = None;
                site.dead.insert(id);
                return Err(BrowserError::SessionLost("invalid session id".to_string()));
            }
        }

        if let (Some(target), Some((shelf, _))) = (site.always_lose.as_ref(), site.current) {
            if site.shelves[shelf].name == *target {
                site.dead.insert(id);
                return Err(BrowserError::SessionLost("invalid session id".to_string()));
            }
        }

        Ok(match element {
            Element::Card(html) => html.clone(),
            _ => "<div></div>".to_string(),
        })
    }

    async fn fill(&mut self, _element: &Element, _value: &str) -> BrowserResult<()> {
        self.site()?;
        Ok(())
    }

    async fn click(&mut self, element: &Element, _mode: ClickMode) -> BrowserResult<()> {
        let mut site = self.site()?;
        match element {
            Element::Submit => {
                site.logged_in = true;
                site.logins += 1;
            }
            Element::Tile(index) => site.current = Some((*index, 0)),
            Element::NextPage => {
                if let Some((_, page)) = site.current.as_mut() {
                    *page += 1;
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn scroll_into_view(&mut self, _element: &Element) -> BrowserResult<()> {
        self.site()?;
        Ok(())
    }

    async fn scroll_page(&mut self, _fraction: f64) -> BrowserResult<()> {
        self.site()?;
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path) -> BrowserResult<()> {
        self.site()?.screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn quit(self) -> BrowserResult<()> {
        Ok(())
    }
}

struct StorefrontLauncher {
    site: Arc<Mutex<Storefront>>,
}

#[async_trait]
impl SessionLauncher for StorefrontLauncher {
    type Session = StorefrontSession;

    async fn launch(&self, _headless: bool) -> Result<StorefrontSession, StartError> {
        let mut site = self.site.lock().unwrap();
        site.launches += 1;
        if site.max_launches.is_some_and(|max| site.launches > max) {
            return Err(StartError::Exhausted("chrome not reachable".to_string()));
        }
        site.logged_in = false;
        site.current = None;

        Ok(StorefrontSession {
            id: site.launches,
            site: Arc::clone(&self.site),
        })
    }
}

/// Creates a test configuration crawling the given categories
fn create_test_config(categories: &[&str]) -> Config {
    let mut config = Config::default();
    config.categories = categories.iter().map(|c| c.to_string()).collect();
    config.timing = TimingConfig::zero();
    config.credentials = Credentials {
        username: "revenda".to_string(),
        password: "segredo".to_string(),
    };
    config
}

fn names(records: &[leveros_harvest::ProductRecord]) -> Vec<&str> {
    records.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test]
async fn test_full_harvest_across_categories() {
    // Three categories of two pages, each page holding one unit and one installation add-on
    let site = Storefront::new(vec![
        (
            "Inverter",
            vec![
                vec!["Split 9000", "Produto X - instalação"],
                vec!["Split 12000", "Instalacao Split"],
            ],
        ),
        (
            "Cassete",
            vec![
                vec!["Cassete 24000", "Kit instalação Cassete"],
                vec!["Cassete 36000", "Produto X - instalação"],
            ],
        ),
        (
            "VRF",
            vec![
                vec!["VRF 8HP", "Instalação VRF"],
                vec!["VRF 10HP", "Produto X - instalação"],
            ],
        ),
    ]);
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&["Inverter", "Cassete", "VRF"]);
    let context = RunContext::new(true, dir.path(), dir.path());
    let launcher = StorefrontLauncher {
        site: Arc::clone(&site),
    };

    let report = Coordinator::new(config, launcher, context).run().await.unwrap();

    assert_eq!(
        names(&report.records),
        vec![
            "Split 9000",
            "Split 12000",
            "Cassete 24000",
            "Cassete 36000",
            "VRF 8HP",
            "VRF 10HP",
        ]
    );
    assert!(report.records.iter().all(|r| !r.is_installation_service()));
    assert_eq!(report.records_for("Cassete").count(), 2);
    assert_eq!(
        report.outcome("Inverter"),
        Some(&CategoryOutcome::Completed { pages: 2 })
    );
    assert_eq!(report.session_restarts, 0);

    let first = &report.records[0];
    assert_eq!(first.category, "Inverter");
    assert_eq!(first.voltage, "220V");
    assert_eq!(first.cash_price, "R$ 1.899,05 à vista");
    assert_eq!(first.installment_count, "10x");
    assert_eq!(first.installment_value, "R$ 199,90");
    assert_eq!(
        first.public_image_url,
        "https://www.vendas.leveros.com.br/upload/produto/imagem/Split-9000.png"
    );

    let site = site.lock().unwrap();
    assert_eq!(site.launches, 1);
    assert_eq!(site.logins, 1);
}

#[tokio::test]
async fn test_session_loss_restarts_and_retries_category() {
    let site = Storefront::new(vec![
        ("Inverter", vec![vec!["Split 9000"]]),
        ("VRF", vec![vec!["VRF 8HP", "VRF 10HP"], vec!["VRF 12HP"]]),
        ("Cassete", vec![vec!["Cassete 24000"]]),
    ]);
    site.lock().unwrap().lose_session_at = Some(("VRF".to_string(), 1));

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&["Inverter", "VRF", "Cassete"]);
    let launcher = StorefrontLauncher {
        site: Arc::clone(&site),
    };

    let report = Coordinator::new(config, launcher, RunContext::new(true, dir.path(), dir.path()))
        .run()
        .await
        .unwrap();

    // The interrupted attempt's first page is discarded, not counted twice
    assert_eq!(
        names(&report.records),
        vec!["Split 9000", "VRF 8HP", "VRF 10HP", "VRF 12HP", "Cassete 24000"]
    );
    assert_eq!(report.session_restarts, 1);
    assert_eq!(
        report.outcome("VRF"),
        Some(&CategoryOutcome::Completed { pages: 2 })
    );

    let site = site.lock().unwrap();
    assert_eq!(site.launches, 2);
    assert_eq!(site.logins, 2);
}

#[tokio::test]
async fn test_category_abandoned_after_repeated_session_loss() {
    let site = Storefront::new(vec![
        ("Inverter", vec![vec!["Split 9000"]]),
        ("VRF", vec![vec!["VRF 8HP"]]),
        ("Cassete", vec![vec!["Cassete 24000"]]),
    ]);
    site.lock().unwrap().always_lose = Some("VRF".to_string());

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&["Inverter", "VRF", "Cassete"]);
    let launcher = StorefrontLauncher {
        site: Arc::clone(&site),
    };

    let report = Coordinator::new(config, launcher, RunContext::new(true, dir.path(), dir.path()))
        .run()
        .await
        .unwrap();

    // Two retries of VRF, then one more restart so Cassete gets a live session
    assert_eq!(names(&report.records), vec!["Split 9000", "Cassete 24000"]);
    assert_eq!(report.session_restarts, 3);
    match report.outcome("VRF") {
        Some(CategoryOutcome::Abandoned { reason }) => assert!(reason.contains("2 restarts")),
        other => panic!("Expected VRF to be abandoned, got {:?}", other),
    }
    assert_eq!(
        report.outcome("Cassete"),
        Some(&CategoryOutcome::Completed { pages: 1 })
    );

    let site = site.lock().unwrap();
    assert_eq!(site.launches, 4);
    assert_eq!(site.logins, 4);
}

#[tokio::test]
async fn test_failed_relaunch_stops_crawl_and_still_exports() {
    let site = Storefront::new(vec![
        ("Inverter", vec![vec!["Split 9000", "Split 12000"]]),
        ("VRF", vec![vec!["VRF 8HP"]]),
        ("Cassete", vec![vec!["Cassete 24000"]]),
        ("Ar Janela", vec![vec!["Janela 7500"]]),
    ]);
    {
        let mut site = site.lock().unwrap();
        site.lose_session_at = Some(("VRF".to_string(), 0));
        site.max_launches = Some(1);
    }

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&["Inverter", "VRF", "Cassete", "Ar Janela"]);
    let context = RunContext::new(true, dir.path(), dir.path());
    let spreadsheet = context.spreadsheet_path();
    let document = context.document_path();
    let launcher = StorefrontLauncher {
        site: Arc::clone(&site),
    };

    let report = run_harvest(config, launcher, context).await.unwrap();

    assert_eq!(names(&report.records), vec!["Split 9000", "Split 12000"]);
    assert_eq!(
        report.outcome("Inverter"),
        Some(&CategoryOutcome::Completed { pages: 1 })
    );
    match report.outcome("VRF") {
        Some(CategoryOutcome::Abandoned { reason }) => {
            assert!(reason.contains("restart failed"))
        }
        other => panic!("Expected VRF to be abandoned, got {:?}", other),
    }
    assert_eq!(report.outcome("Cassete"), Some(&CategoryOutcome::NotAttempted));
    assert_eq!(report.outcome("Ar Janela"), Some(&CategoryOutcome::NotAttempted));
    assert!(spreadsheet.exists());
    assert!(std::fs::read(&document).unwrap().starts_with(b"%PDF"));
    assert_eq!(site.lock().unwrap().launches, 2);
}

#[tokio::test]
async fn test_missing_category_is_skipped() {
    let site = Storefront::new(vec![
        ("Inverter", vec![vec!["Split 9000"]]),
        ("VRF", vec![vec!["VRF 8HP"]]),
    ]);
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&["Inverter", "Climatizador", "VRF"]);
    let launcher = StorefrontLauncher {
        site: Arc::clone(&site),
    };

    let report = Coordinator::new(config, launcher, RunContext::new(true, dir.path(), dir.path()))
        .run()
        .await
        .unwrap();

    assert_eq!(names(&report.records), vec!["Split 9000", "VRF 8HP"]);
    assert!(matches!(
        report.outcome("Climatizador"),
        Some(CategoryOutcome::Abandoned { .. })
    ));
    assert_eq!(report.category_counts()[1], ("Climatizador", 0));
    assert_eq!(site.lock().unwrap().launches, 1);
}

#[tokio::test]
async fn test_empty_page_saves_screenshot_and_ends_category() {
    let site = Storefront::new(vec![("Ar Janela", vec![vec!["Janela 7500"], vec![]])]);
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&["Ar Janela"]);
    let context = RunContext::new(true, dir.path(), dir.path());
    let expected_screenshot = context.screenshot_path("Ar Janela");
    let launcher = StorefrontLauncher {
        site: Arc::clone(&site),
    };

    let report = Coordinator::new(config, launcher, context).run().await.unwrap();

    assert_eq!(names(&report.records), vec!["Janela 7500"]);
    assert_eq!(
        report.outcome("Ar Janela"),
        Some(&CategoryOutcome::Completed { pages: 2 })
    );
    assert_eq!(site.lock().unwrap().screenshots, vec![expected_screenshot]);
}

#[tokio::test]
async fn test_page_limit_stops_pagination() {
    let site = Storefront::new(vec![(
        "Convencional",
        vec![vec!["Conv 9000"], vec!["Conv 12000"], vec!["Conv 18000"]],
    )]);
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&["Convencional"]);
    config.timing.max_pages_per_category = 2;
    let launcher = StorefrontLauncher {
        site: Arc::clone(&site),
    };

    let report = Coordinator::new(config, launcher, RunContext::new(true, dir.path(), dir.path()))
        .run()
        .await
        .unwrap();

    assert_eq!(names(&report.records), vec!["Conv 9000", "Conv 12000"]);
}

#[tokio::test]
async fn test_run_harvest_writes_both_exports() {
    let site = Storefront::new(vec![
        ("Inverter", vec![vec!["Split 9000", "Split 12000"]]),
        ("VRF", vec![vec!["VRF 8HP"]]),
    ]);
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("saida");
    let config = create_test_config(&["Inverter", "VRF"]);
    let context = RunContext::new(true, &out, dir.path());
    let spreadsheet = context.spreadsheet_path();
    let document = context.document_path();

    let report = run_harvest(config, StorefrontLauncher { site }, context)
        .await
        .unwrap();

    assert_eq!(report.total_records(), 3);
    assert!(spreadsheet.exists());
    assert!(std::fs::read(&document).unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_startup_failure_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "value": {
                "error": "session not created",
                "message": "Chrome failed to start",
                "stacktrace": ""
            }
        })))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&["Inverter"]);
    config.driver = DriverConfig {
        chromedriver_path: Some("/nonexistent/chromedriver".to_string()),
        remote_url: mock_server.uri(),
        startup_timeout_secs: 1,
        ..DriverConfig::default()
    };
    let context = RunContext::new(true, dir.path(), dir.path());
    let spreadsheet = context.spreadsheet_path();
    let launcher = ChromeLauncher::new(config.driver.clone());

    let result = run_harvest(config, launcher, context).await;

    assert!(matches!(
        result,
        Err(HarvestError::Start(StartError::Exhausted(_)))
    ));
    assert!(!spreadsheet.exists());
}
