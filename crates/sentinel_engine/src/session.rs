use std::time::Duration;

use serde_json::Value;

use crate::{HttpReply, LoadState, Locator, SessionError};

/// The driven browser session. Everything the watcher knows about the remote
/// page goes through this capability.
#[async_trait::async_trait]
pub trait Session: Send + Sync {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), SessionError>;

    async fn current_url(&self) -> Result<String, SessionError>;

    /// Resolves once the page reaches `state`, or fails with a timeout error.
    async fn wait_for_load(&self, state: LoadState, timeout: Duration)
        -> Result<(), SessionError>;

    /// Number of elements matching `locator`. Zero when absent.
    async fn count(&self, locator: &Locator) -> Result<usize, SessionError>;

    /// Whether the first element matching `locator` is rendered and visible.
    async fn is_visible(&self, locator: &Locator) -> Result<bool, SessionError>;

    async fn fill(&self, locator: &Locator, value: &str) -> Result<(), SessionError>;

    async fn click(&self, locator: &Locator) -> Result<(), SessionError>;

    /// Rendered text of the first element matching `locator`.
    async fn inner_text(&self, locator: &Locator) -> Result<String, SessionError>;

    /// Serialized HTML of the whole document.
    async fn content(&self) -> Result<String, SessionError>;

    /// Full-page PNG capture.
    async fn screenshot(&self) -> Result<Vec<u8>, SessionError>;

    /// POST `body` as JSON from inside the page, carrying the page's credentials.
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, SessionError>;

    /// Cookies of the current page formatted as a `Cookie` header value.
    async fn cookie_header(&self) -> Result<Option<String>, SessionError>;
}
