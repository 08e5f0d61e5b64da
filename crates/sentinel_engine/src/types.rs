use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::PersistError;

/// An element address on the driven page: a CSS selector, optionally narrowed to
/// elements whose visible text contains `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub css: String,
    pub text: Option<String>,
}

impl Locator {
    pub fn css(css: impl Into<String>) -> Self {
        Self {
            css: css.into(),
            text: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{} (text {:?})", self.css, text),
            None => f.write_str(&self.css),
        }
    }
}

/// Raw reply of a request issued by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    DomContentLoaded,
    NetworkIdle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    Navigation,
    ElementNotFound,
    Script,
    Timeout,
    Transport,
}

impl fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionErrorKind::Navigation => write!(f, "navigation"),
            SessionErrorKind::ElementNotFound => write!(f, "element not found"),
            SessionErrorKind::Script => write!(f, "script"),
            SessionErrorKind::Timeout => write!(f, "timeout"),
            SessionErrorKind::Transport => write!(f, "transport"),
        }
    }
}

/// Failure reported by the driven session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct SessionError {
    pub kind: SessionErrorKind,
    pub message: String,
}

impl SessionError {
    pub fn new(kind: SessionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Failure of a single save attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error("HTTP {0}")]
    HttpStatus(u16),
    #[error("timeout")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// Failure of one poll cycle. Caught and logged at the cycle boundary.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    Authentication(String),
    #[error("surface did not stabilize within {timeout:?}")]
    StabilityTimeout { timeout: Duration },
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl WatchError {
    /// Short label for the `[ERR]` line.
    pub fn kind(&self) -> &'static str {
        match self {
            WatchError::Config(_) => "ConfigError",
            WatchError::Authentication(_) => "AuthenticationError",
            WatchError::StabilityTimeout { .. } => "StabilityTimeout",
            WatchError::Session(err) if err.kind == SessionErrorKind::Timeout => "TimeoutError",
            WatchError::Session(_) => "SessionError",
            WatchError::Persist(_) => "PersistError",
        }
    }
}
