//! Scripted in-memory browser session for unit tests

use crate::browser::{BrowserError, BrowserResult, BrowserSession, ClickMode, Locator};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct FakeElement {
    pub id: usize,
    pub text: String,
    pub html: String,
}

impl FakeElement {
    pub fn new(id: usize, text: &str) -> Self {
        Self {
            id,
            text: text.to_string(),
            html: format!("<div>{}</div>", text),
        }
    }

    pub fn with_html(id: usize, html: &str) -> Self {
        Self {
            id,
            text: String::new(),
            html: html.to_string(),
        }
    }
}

#[derive(Default)]
pub struct FakeSession {
    elements: HashMap<String, Vec<FakeElement>>,
    scripts: HashMap<String, Vec<FakeElement>>,
    html_failures: HashMap<usize, u32>,
    lost: bool,
    pub navigations: Vec<String>,
    pub fills: Vec<(usize, String)>,
    pub clicks: Vec<(usize, ClickMode)>,
    pub scrolls: Vec<f64>,
    pub screenshots: Vec<PathBuf>,
    pub script_args: Vec<Vec<Value>>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets what a CSS selector or XPath expression matches
    pub fn put(&mut self, locator: &str, elements: Vec<FakeElement>) {
        self.elements.insert(locator.to_string(), elements);
    }

    /// Sets what an element-returning script yields
    pub fn put_script(&mut self, script: &str, elements: Vec<FakeElement>) {
        self.scripts.insert(script.to_string(), elements);
    }

    /// Makes the next `times` markup reads of element `id` fail
    pub fn fail_html(&mut self, id: usize, times: u32) {
        self.html_failures.insert(id, times);
    }

    /// Makes every later call fail with session loss
    pub fn lose_session(&mut self) {
        self.lost = true;
    }

    fn check(&self) -> BrowserResult<()> {
        if self.lost {
            Err(BrowserError::SessionLost("invalid session id".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    type Element = FakeElement;

    async fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.check()?;
        self.navigations.push(url.to_string());
        Ok(())
    }

    async fn find_all(&mut self, locator: &Locator) -> BrowserResult<Vec<FakeElement>> {
        self.check()?;
        Ok(self
            .elements
            .get(locator.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn select_by_script(
        &mut self,
        script: &str,
        args: Vec<Value>,
    ) -> BrowserResult<Vec<FakeElement>> {
        self.check()?;
        self.script_args.push(args);
        Ok(self.scripts.get(script).cloned().unwrap_or_default())
    }

    async fn run_script(&mut self, _script: &str, args: Vec<Value>) -> BrowserResult<Value> {
        self.check()?;
        self.script_args.push(args);
        Ok(Value::Null)
    }

    async fn text(&mut self, element: &FakeElement) -> BrowserResult<String> {
        self.check()?;
        Ok(element.text.clone())
    }

    async fn outer_html(&mut self, element: &FakeElement) -> BrowserResult<String> {
        self.check()?;
        if let Some(remaining) = self.html_failures.get_mut(&element.id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(BrowserError::StaleElement(format!("element {}", element.id)));
            }
        }
        Ok(element.html.clone())
    }

    async fn fill(&mut self, element: &FakeElement, value: &str) -> BrowserResult<()> {
        self.check()?;
        self.fills.push((element.id, value.to_string()));
        Ok(())
    }

    async fn click(&mut self, element: &FakeElement, mode: ClickMode) -> BrowserResult<()> {
        self.check()?;
        self.clicks.push((element.id, mode));
        Ok(())
    }

    async fn scroll_into_view(&mut self, _element: &FakeElement) -> BrowserResult<()> {
        self.check()
    }

    async fn scroll_page(&mut self, fraction: f64) -> BrowserResult<()> {
        self.check()?;
        self.scrolls.push(fraction);
        Ok(())
    }

    async fn screenshot(&mut self, path: &Path) -> BrowserResult<()> {
        self.check()?;
        self.screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn quit(self) -> BrowserResult<()> {
        Ok(())
    }
}
