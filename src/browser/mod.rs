//! Browser automation seam.
//!
//! Vendor drivers only talk to a [`BrowserSession`]; the Chrome-backed
//! implementation lives in [`chrome`]. Every lookup is probing: waits report
//! `false` on timeout instead of failing, and reads return `None` when the
//! element is absent.

pub mod chrome;
#[cfg(test)]
pub mod scripted;

use async_trait::async_trait;
use std::time::Duration;

use crate::utils::error::Result;

pub use chrome::{ChromeLauncher, ChromeSession};

/// One live browsing context, owned by a single vendor query.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate and wait for the document to load.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Wait up to `timeout` for `selector` to appear. `Ok(false)` on timeout.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool>;

    /// Switch the session into the document of the embedded frame matched by
    /// `selector`. `Ok(false)` if the frame never appeared.
    async fn enter_frame(&self, selector: &str, timeout: Duration) -> Result<bool>;

    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Text of the first element matching `selector`, if any.
    async fn text_of(&self, selector: &str) -> Result<Option<String>>;

    async fn count(&self, selector: &str) -> Result<usize>;

    /// Wait for a navigation triggered by the previous interaction to settle.
    async fn wait_for_navigation(&self, timeout: Duration) -> Result<()>;

    /// Serialized HTML of the current document.
    async fn content(&self) -> Result<String>;

    async fn current_url(&self) -> Result<String>;

    async fn close(&self) -> Result<()>;
}

/// Opens fresh browsing sessions.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn BrowserSession>>;
}
