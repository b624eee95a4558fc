use anyhow::anyhow;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use url::Url;

use super::{BrowserSession, SessionFactory};
use crate::config::BrowserConfig;
use crate::utils::error::{AppError, Result};

/// Launches one headless Chrome per session so that nothing is shared
/// between attempts.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    config: BrowserConfig,
}

/// A Chrome process with a single tab. Dropping it kills the process.
pub struct ChromeSession {
    // Field order matters: the tab goes before the browser that owns it.
    tab: Arc<Tab>,
    _browser: Browser,
    navigation_timeout: Duration,
}

impl ChromeLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    async fn launch(&self) -> Result<ChromeSession> {
        let config = self.config.clone();

        tokio::task::spawn_blocking(move || -> anyhow::Result<ChromeSession> {
            let mut launch_options = LaunchOptions::default_builder()
                .headless(config.headless)
                .sandbox(false) // Often needed in containerized environments
                .idle_browser_timeout(config.navigation_timeout() * 2)
                .args(vec![
                    OsStr::new("--no-sandbox"),
                    OsStr::new("--disable-dev-shm-usage"),
                    OsStr::new("--disable-gpu"),
                    OsStr::new("--disable-extensions"),
                    OsStr::new("--disable-background-timer-throttling"),
                    OsStr::new("--disable-backgrounding-occluded-windows"),
                    OsStr::new("--disable-renderer-backgrounding"),
                ])
                .build()
                .map_err(|e| anyhow!("Failed to create launch options: {}", e))?;

            if let Some(chrome_path) = &config.chrome_path {
                launch_options.path = Some(PathBuf::from(chrome_path));
            }

            let browser = Browser::new(launch_options)
                .map_err(|e| anyhow!("Failed to launch browser: {}", e))?;
            let tab = browser
                .new_tab()
                .map_err(|e| anyhow!("Failed to create tab: {}", e))?;
            tab.set_default_timeout(config.navigation_timeout());

            Ok(ChromeSession {
                tab,
                _browser: browser,
                navigation_timeout: config.navigation_timeout(),
            })
        })
        .await?
        .map_err(AppError::browser)
    }
}

#[async_trait]
impl SessionFactory for ChromeLauncher {
    async fn open(&self) -> Result<Box<dyn BrowserSession>> {
        let attempts = self.config.launch_retry_attempts.max(1);
        let strategy = FixedInterval::from_millis(self.config.launch_retry_delay_ms).take(attempts - 1);

        let session = Retry::spawn(strategy, || async {
            self.launch().await.inspect_err(|e| {
                tracing::warn!("Browser launch failed: {}", e);
            })
        })
        .await?;

        Ok(Box::new(session))
    }
}

impl ChromeSession {
    /// Runs a blocking DevTools call off the async runtime.
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || op(&tab))
            .await?
            .map_err(AppError::browser)
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn goto(&self, url: &str) -> Result<()> {
        let url = url.to_string();
        tracing::debug!("Navigating to {}", url);
        self.blocking(move |tab| {
            tab.navigate_to(&url)
                .map_err(|e| anyhow!("Navigation to {} failed: {}", url, e))?;
            tab.wait_until_navigated()
                .map_err(|e| anyhow!("Page load of {} failed: {}", url, e))?;
            Ok(())
        })
        .await
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let selector = selector.to_string();
        self.blocking(move |tab| {
            Ok(tab
                .wait_for_element_with_custom_timeout(&selector, timeout)
                .is_ok())
        })
        .await
    }

    async fn enter_frame(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let selector = selector.to_string();
        let frame_src = self
            .blocking(move |tab| {
                let frame = match tab.wait_for_element_with_custom_timeout(&selector, timeout) {
                    Ok(frame) => frame,
                    Err(_) => return Ok(None),
                };
                let src = frame
                    .get_attribute_value("src")
                    .map_err(|e| anyhow!("Failed to read frame source: {}", e))?;
                Ok(src.map(|src| (src, tab.get_url())))
            })
            .await?;

        let Some((src, page_url)) = frame_src else {
            return Ok(false);
        };

        // The embedded search documents are loaded directly so that their DOM
        // is reachable without cross-origin frame access.
        let frame_url = Url::parse(&page_url)
            .and_then(|base| base.join(&src))
            .map_err(|e| AppError::browser(format!("Invalid frame source '{}': {}", src, e)))?;
        self.goto(frame_url.as_str()).await?;
        Ok(true)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        let selector = selector.to_string();
        let text = text.to_string();
        self.blocking(move |tab| {
            let input = tab
                .find_element(&selector)
                .map_err(|e| anyhow!("Input '{}' not found: {}", selector, e))?;
            input.click()?;
            input.type_into(&text)?;
            Ok(())
        })
        .await
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let selector = selector.to_string();
        self.blocking(move |tab| {
            tab.find_element(&selector)
                .map_err(|e| anyhow!("Element '{}' not found: {}", selector, e))?
                .click()?;
            Ok(())
        })
        .await
    }

    async fn text_of(&self, selector: &str) -> Result<Option<String>> {
        let selector = selector.to_string();
        self.blocking(move |tab| match tab.find_element(&selector) {
            Ok(element) => Ok(Some(element.get_inner_text()?.trim().to_string())),
            Err(_) => Ok(None),
        })
        .await
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let selector = selector.to_string();
        self.blocking(move |tab| {
            Ok(tab
                .find_elements(&selector)
                .map(|elements| elements.len())
                .unwrap_or(0))
        })
        .await
    }

    async fn wait_for_navigation(&self, timeout: Duration) -> Result<()> {
        let wait = self.blocking(|tab| {
            tab.wait_until_navigated()?;
            Ok(())
        });

        tokio::time::timeout(timeout.min(self.navigation_timeout), wait)
            .await
            .map_err(|_| AppError::timeout("navigation"))?
    }

    async fn content(&self) -> Result<String> {
        self.blocking(|tab| tab.get_content()).await
    }

    async fn current_url(&self) -> Result<String> {
        self.blocking(|tab| Ok(tab.get_url())).await
    }

    async fn close(&self) -> Result<()> {
        self.blocking(|tab| {
            tab.close(true)?;
            Ok(())
        })
        .await
    }
}
