//! In-memory browser used by driver tests. Pages are canned HTML keyed by
//! URL; selectors are evaluated with `scraper` against the current page.

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BrowserSession, SessionFactory};
use crate::utils::error::{AppError, Result};

const BLANK: &str = "<html><body></body></html>";

/// Canned site behaviour. URL templates may contain `{query}`, replaced by
/// the last text filled into any input.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub pages: HashMap<String, String>,
    /// Frame selector -> URL of the embedded document.
    pub frames: HashMap<String, String>,
    /// Clicked selector -> URL template navigated to.
    pub clicks: HashMap<String, String>,
    /// Filled selector -> URL template navigated to, for live-search inputs.
    pub fills: HashMap<String, String>,
    /// Selectors whose interaction fails with a browser error.
    pub broken: HashSet<String>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn frame(mut self, selector: &str, url: &str) -> Self {
        self.frames.insert(selector.to_string(), url.to_string());
        self
    }

    pub fn on_click(mut self, selector: &str, url: &str) -> Self {
        self.clicks.insert(selector.to_string(), url.to_string());
        self
    }

    pub fn on_fill(mut self, selector: &str, url: &str) -> Self {
        self.fills.insert(selector.to_string(), url.to_string());
        self
    }

    pub fn broken(mut self, selector: &str) -> Self {
        self.broken.insert(selector.to_string());
        self
    }
}

#[derive(Debug, Default)]
struct State {
    url: String,
    html: String,
    query: String,
    filled: Vec<(String, String)>,
    clicked: Vec<String>,
}

pub struct ScriptedSession {
    script: Arc<Script>,
    state: Mutex<State>,
    closed: Arc<AtomicUsize>,
}

impl ScriptedSession {
    pub fn new(script: Arc<Script>) -> Self {
        Self::with_counter(script, Arc::new(AtomicUsize::new(0)))
    }

    fn with_counter(script: Arc<Script>, closed: Arc<AtomicUsize>) -> Self {
        Self {
            script,
            state: Mutex::new(State::default()),
            closed,
        }
    }

    pub fn filled(&self) -> Vec<(String, String)> {
        self.lock().filled.clone()
    }

    pub fn clicked(&self) -> Vec<String> {
        self.lock().clicked.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load(&self, state: &mut State, template: &str) {
        let url = template.replace("{query}", &state.query);
        state.html = self
            .script
            .pages
            .get(&url)
            .cloned()
            .unwrap_or_else(|| BLANK.to_string());
        state.url = url;
    }

    fn check_broken(&self, selector: &str) -> Result<()> {
        if self.script.broken.contains(selector) {
            return Err(AppError::browser(format!("element '{}' is detached", selector)));
        }
        Ok(())
    }

    fn matches(&self, selector: &str) -> usize {
        count_matches(&self.lock().html, selector)
    }
}

fn count_matches(html: &str, selector: &str) -> usize {
    let Ok(selector) = Selector::parse(selector) else {
        return 0;
    };
    Html::parse_document(html).select(&selector).count()
}

fn first_text(html: &str, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let document = Html::parse_document(html);
    let element = document.select(&selector).next()?;
    Some(element.text().collect::<String>().trim().to_string())
}

#[async_trait]
impl BrowserSession for ScriptedSession {
    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.lock();
        self.load(&mut state, url);
        Ok(())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<bool> {
        Ok(self.matches(selector) > 0)
    }

    async fn enter_frame(&self, selector: &str, _timeout: Duration) -> Result<bool> {
        if self.matches(selector) == 0 {
            return Ok(false);
        }
        let Some(url) = self.script.frames.get(selector) else {
            return Ok(false);
        };
        let mut state = self.lock();
        self.load(&mut state, url);
        Ok(true)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.check_broken(selector)?;
        if self.matches(selector) == 0 {
            return Err(AppError::browser(format!("input '{}' not found", selector)));
        }
        let mut state = self.lock();
        state.query = text.to_string();
        state.filled.push((selector.to_string(), text.to_string()));
        if let Some(target) = self.script.fills.get(selector) {
            self.load(&mut state, target);
        }
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.check_broken(selector)?;
        if self.matches(selector) == 0 {
            return Err(AppError::browser(format!("element '{}' not found", selector)));
        }
        let mut state = self.lock();
        state.clicked.push(selector.to_string());
        if let Some(target) = self.script.clicks.get(selector) {
            self.load(&mut state, target);
        }
        Ok(())
    }

    async fn text_of(&self, selector: &str) -> Result<Option<String>> {
        Ok(first_text(&self.lock().html, selector))
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        Ok(self.matches(selector))
    }

    async fn wait_for_navigation(&self, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn content(&self) -> Result<String> {
        Ok(self.lock().html.clone())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.lock().url.clone())
    }

    async fn close(&self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Hands out [`ScriptedSession`]s and counts how many were opened and closed.
#[derive(Clone)]
pub struct ScriptedFactory {
    script: Arc<Script>,
    pub opened: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    fail_open: bool,
}

impl ScriptedFactory {
    pub fn new(script: Script) -> Self {
        Self {
            script: Arc::new(script),
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
            fail_open: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new(Script::new())
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for ScriptedFactory {
    async fn open(&self) -> Result<Box<dyn BrowserSession>> {
        if self.fail_open {
            return Err(AppError::browser("Failed to launch browser: no chrome"));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedSession::with_counter(
            Arc::clone(&self.script),
            Arc::clone(&self.closed),
        )))
    }
}
