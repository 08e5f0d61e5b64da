#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sentinel_engine::{
    Artifact, ArtifactSink, HttpReply, LoadState, Locator, PersistError, SaveClient, SaveError,
    SaveRequest, Session, SessionError, SessionErrorKind, StoredArtifact,
};
use serde_json::Value;

pub fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(sentinel_logging::initialize_for_tests);
}

#[derive(Default)]
pub struct FakeState {
    /// Surface readings served in order; the last one repeats once exhausted.
    pub texts: VecDeque<String>,
    pub last_text: String,
    pub text_reads: usize,
    /// Selectors currently present and visible.
    pub present: HashSet<String>,
    /// Selectors visible for this many more checks, then hidden.
    pub busy: HashMap<String, usize>,
    /// Selectors removed from the page when `submit_css` is clicked.
    pub cleared_on_submit: Vec<String>,
    pub submit_css: Option<String>,
    pub url: String,
    pub url_after_submit: Option<String>,
    pub failing_gotos: usize,
    pub actions: Vec<String>,
    pub post_replies: VecDeque<Result<HttpReply, SessionError>>,
    pub posts: Vec<(String, Value)>,
    pub cookies: Option<String>,
}

/// Scriptable stand-in for the driven browser session.
#[derive(Default)]
pub struct FakeSession {
    pub state: Mutex<FakeState>,
}

impl FakeSession {
    pub fn with_texts(texts: &[&str]) -> Self {
        let session = Self::default();
        session.push_texts(texts);
        session
    }

    pub fn push_texts(&self, texts: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.texts.extend(texts.iter().map(|t| t.to_string()));
    }

    /// Serve `text` from now on, dropping anything queued.
    pub fn set_text(&self, text: &str) {
        let mut state = self.state.lock().unwrap();
        state.texts.clear();
        state.last_text = text.to_string();
    }

    pub fn show(&self, css: &str) {
        self.state.lock().unwrap().present.insert(css.to_string());
    }

    pub fn actions(&self) -> Vec<String> {
        self.state.lock().unwrap().actions.clone()
    }

    pub fn text_reads(&self) -> usize {
        self.state.lock().unwrap().text_reads
    }

    pub fn posts(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().posts.clone()
    }
}

#[async_trait::async_trait]
impl Session for FakeSession {
    async fn goto(&self, url: &str, _timeout: Duration) -> Result<(), SessionError> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(format!("goto:{url}"));
        if state.failing_gotos > 0 {
            state.failing_gotos -= 1;
            return Err(SessionError::new(
                SessionErrorKind::Navigation,
                format!("{url}: net::ERR_CONNECTION_RESET"),
            ));
        }
        state.url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.state.lock().unwrap().url.clone())
    }

    async fn wait_for_load(
        &self,
        _state: LoadState,
        _timeout: Duration,
    ) -> Result<(), SessionError> {
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> Result<usize, SessionError> {
        let state = self.state.lock().unwrap();
        Ok(usize::from(state.present.contains(&locator.css)))
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool, SessionError> {
        let mut state = self.state.lock().unwrap();
        if let Some(remaining) = state.busy.get_mut(&locator.css) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(true);
            }
            return Ok(false);
        }
        Ok(state.present.contains(&locator.css))
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<(), SessionError> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(format!("fill:{}={}", locator.css, value));
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> Result<(), SessionError> {
        let mut state = self.state.lock().unwrap();
        state.actions.push(format!("click:{}", locator.css));
        if state.submit_css.as_deref() == Some(locator.css.as_str()) {
            let cleared = state.cleared_on_submit.clone();
            for css in cleared {
                state.present.remove(&css);
            }
            if let Some(url) = state.url_after_submit.clone() {
                state.url = url;
            }
        }
        Ok(())
    }

    async fn inner_text(&self, _locator: &Locator) -> Result<String, SessionError> {
        let mut state = self.state.lock().unwrap();
        state.text_reads += 1;
        if let Some(text) = state.texts.pop_front() {
            state.last_text = text;
        }
        Ok(state.last_text.clone())
    }

    async fn content(&self) -> Result<String, SessionError> {
        let state = self.state.lock().unwrap();
        Ok(format!("<html><body>{}</body></html>", state.last_text))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SessionError> {
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, SessionError> {
        let mut state = self.state.lock().unwrap();
        state.posts.push((url.to_string(), body.clone()));
        state.post_replies.pop_front().unwrap_or_else(|| {
            Ok(HttpReply {
                status: 200,
                body: r#"{"ok":true}"#.to_string(),
            })
        })
    }

    async fn cookie_header(&self) -> Result<Option<String>, SessionError> {
        Ok(self.state.lock().unwrap().cookies.clone())
    }
}

/// Save client answering from a per-schedule script of outcomes.
#[derive(Default, Clone)]
pub struct ScriptedSaveClient {
    scripts: Arc<Mutex<HashMap<String, VecDeque<Result<Value, SaveError>>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSaveClient {
    pub fn script(&self, schedule_id: &str, outcomes: Vec<Result<Value, SaveError>>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(schedule_id.to_string(), outcomes.into());
    }

    /// Schedule ids in call order, one entry per attempt.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SaveClient for ScriptedSaveClient {
    async fn save(&self, _session: &dyn Session, request: &SaveRequest) -> Result<Value, SaveError> {
        self.calls.lock().unwrap().push(request.schedule_id.clone());
        self.scripts
            .lock()
            .unwrap()
            .get_mut(&request.schedule_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Err(SaveError::HttpStatus(503)))
    }
}

/// Artifact sink keeping everything in memory.
#[derive(Default, Clone)]
pub struct MemorySink {
    pub stored: Arc<Mutex<Vec<Artifact>>>,
    failures_left: Arc<Mutex<usize>>,
}

impl MemorySink {
    pub fn count(&self) -> usize {
        self.stored.lock().unwrap().len()
    }

    /// Make the next `times` stores fail as an unwritable output directory would.
    pub fn fail_next(&self, times: usize) {
        *self.failures_left.lock().unwrap() = times;
    }
}

impl ArtifactSink for MemorySink {
    fn store(&self, artifact: &Artifact) -> Result<StoredArtifact, PersistError> {
        {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(PersistError::OutputDir(
                    "artifacts/screenshots: permission denied".to_string(),
                ));
            }
        }
        self.stored.lock().unwrap().push(artifact.clone());
        let stem = sentinel_engine::artifact_stem(&artifact.cause, &artifact.timestamp);
        Ok(StoredArtifact {
            screenshot: format!("mem/{stem}.png").into(),
            html: format!("mem/{stem}.html").into(),
        })
    }
}
