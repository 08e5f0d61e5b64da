use std::sync::Arc;
use std::time::Duration;

use sentinel_core::{
    fingerprint, update, ArtifactCause, BatchResult, Classification, Effect, Fingerprint, Msg,
    PollCycleRecord, SaveJob, SaveOutcome, WatchState,
};
use sentinel_logging::{current_cycle, sentinel_error, sentinel_info, sentinel_warn};

use crate::stability::{wait_until_stable, StabilityOptions};
use crate::wait::try_wait;
use crate::{
    Artifact, ArtifactSink, BatchSaveExecutor, LoadState, PollTask, Session, SessionGuardian,
    WatchError,
};

pub struct WatchSettings {
    /// Resource the session is pointed at every cycle.
    pub target_url: String,
    pub navigation_timeout: Duration,
    pub stability: StabilityOptions,
    pub jobs: Vec<SaveJob>,
    /// RFC3339 timestamp source for cycle records and artifact names.
    pub now_utc: Arc<dyn Fn() -> String + Send + Sync>,
}

impl WatchSettings {
    pub fn new(target_url: impl Into<String>, jobs: Vec<SaveJob>) -> Self {
        Self {
            target_url: target_url.into(),
            navigation_timeout: Duration::from_secs(60),
            stability: StabilityOptions::default(),
            jobs,
            now_utc: Arc::new(|| String::from("unknown-time")),
        }
    }
}

/// The per-process watch context: one `tick` per poll cycle.
///
/// Holds everything that must survive between cycles (baseline fingerprint,
/// trigger latch, authentication state) so nothing lives in globals.
pub struct Watcher {
    session: Arc<dyn Session>,
    settings: WatchSettings,
    guardian: SessionGuardian,
    executor: BatchSaveExecutor,
    artifacts: Box<dyn ArtifactSink>,
    state: WatchState,
    last_batch: Option<BatchResult>,
}

impl Watcher {
    pub fn new(
        session: Arc<dyn Session>,
        settings: WatchSettings,
        guardian: SessionGuardian,
        executor: BatchSaveExecutor,
        artifacts: Box<dyn ArtifactSink>,
    ) -> Self {
        Self {
            session,
            settings,
            guardian,
            executor,
            artifacts,
            state: WatchState::new(),
            last_batch: None,
        }
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub fn guardian(&self) -> &SessionGuardian {
        &self.guardian
    }

    /// Result of the save batch, once it has run.
    pub fn last_batch(&self) -> Option<&BatchResult> {
        self.last_batch.as_ref()
    }

    /// Runs one cycle. Never fails: errors are logged and recorded as `Error`.
    pub async fn tick(&mut self) -> PollCycleRecord {
        let timestamp = (self.settings.now_utc)();
        let cycle = current_cycle();

        let msg = match self.sample().await {
            Ok(fingerprint) => Msg::Sampled {
                timestamp: timestamp.clone(),
                fingerprint,
            },
            Err(err) => {
                sentinel_error!("[ERR] {} cycle={} {}: {}", timestamp, cycle, err.kind(), err);
                Msg::TickFailed {
                    timestamp: timestamp.clone(),
                }
            }
        };

        let effects = self.dispatch(msg);
        if let Some(record) = self.state.last_cycle() {
            log_cycle(record, cycle);
        }

        for effect in effects {
            self.apply(effect, &timestamp).await;
        }

        match self.state.last_cycle() {
            Some(record) => record.clone(),
            None => PollCycleRecord {
                timestamp,
                fingerprint: None,
                classification: Classification::Error,
            },
        }
    }

    fn dispatch(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        effects
    }

    async fn sample(&mut self) -> Result<Fingerprint, WatchError> {
        let session = Arc::clone(&self.session);
        let target = self.settings.target_url.as_str();
        let nav_timeout = self.settings.navigation_timeout;

        session.goto(target, nav_timeout).await?;

        let logged_in = self.guardian.ensure_authenticated(session.as_ref()).await?;
        if logged_in && session.current_url().await? != target {
            session.goto(target, nav_timeout).await?;
            try_wait(
                "networkidle after login",
                nav_timeout,
                session.wait_for_load(LoadState::NetworkIdle, nav_timeout),
            )
            .await;
        }

        let text = wait_until_stable(session.as_ref(), &self.settings.stability).await?;
        Ok(fingerprint(&text))
    }

    async fn apply(&mut self, effect: Effect, timestamp: &str) {
        match effect {
            Effect::RunSaveBatch => {
                sentinel_info!(
                    "[ACTIONS] {} running save batch ({} jobs)",
                    timestamp,
                    self.settings.jobs.len()
                );
                let session = Arc::clone(&self.session);
                let batch = self
                    .executor
                    .run_batch(session.as_ref(), &self.settings.jobs)
                    .await;
                log_batch(&batch);
                self.last_batch = Some(batch);
            }
            Effect::ActionsSkipped => {
                sentinel_info!("[ACTIONS] {} already performed earlier, skipping", timestamp);
            }
            Effect::CaptureArtifacts { cause } => {
                let msg = match self.capture(cause, timestamp).await {
                    Ok(()) => Msg::ArtifactsStored,
                    Err(err) => {
                        sentinel_error!(
                            "[ERR] {} cycle={} {}: {}",
                            timestamp,
                            current_cycle(),
                            err.kind(),
                            err
                        );
                        Msg::ArtifactsFailed {
                            timestamp: timestamp.to_string(),
                        }
                    }
                };
                self.dispatch(msg);
            }
        }
    }

    async fn capture(&self, cause: ArtifactCause, timestamp: &str) -> Result<(), WatchError> {
        let html = self.session.content().await?;
        let screenshot = self.session.screenshot().await?;
        let stored = self.artifacts.store(&Artifact {
            cause: cause.label().to_string(),
            timestamp: timestamp.to_string(),
            html,
            screenshot,
        })?;
        sentinel_info!(
            "[ARTIFACTS] screenshot={} html={}",
            stored.screenshot.display(),
            stored.html.display()
        );
        Ok(())
    }
}

#[async_trait::async_trait]
impl PollTask for Watcher {
    async fn run_once(&mut self) {
        self.tick().await;
    }
}

fn log_cycle(record: &PollCycleRecord, cycle: u64) {
    let tag = record.classification.tag();
    match (record.classification, record.fingerprint.as_ref()) {
        (Classification::Init, Some(hash)) => {
            sentinel_info!("[{}] {} cycle={} hash={}", tag, record.timestamp, cycle, hash);
        }
        (Classification::Unchanged, _) => {
            sentinel_info!("[{}] {} cycle={} no changes", tag, record.timestamp, cycle);
        }
        (Classification::Changed, Some(hash)) => {
            sentinel_info!(
                "[{}] {} cycle={} content changed hash={}",
                tag,
                record.timestamp,
                cycle,
                hash
            );
        }
        // Failures were already reported with their cause.
        _ => {}
    }
}

fn log_batch(batch: &BatchResult) {
    sentinel_info!(
        "[ACTIONS] save results: {} ok, {} failed",
        batch.succeeded_count(),
        batch.failed().count()
    );
    for result in &batch.results {
        match &result.outcome {
            SaveOutcome::Saved(payload) => sentinel_info!(
                "[ACTIONS] schedule={} ok attempts={} result={}",
                result.schedule_id,
                result.attempts,
                payload
            ),
            SaveOutcome::Failed(error) => sentinel_warn!(
                "[ACTIONS] schedule={} failed attempts={} error={}",
                result.schedule_id,
                result.attempts,
                error
            ),
        }
    }
}
