use crate::Fingerprint;

/// Authentication state of the driven session, as tracked by the session guardian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unknown,
    LoginPromptVisible,
    Authenticating,
    Authenticated,
    LoginFailed,
}

impl AuthState {
    pub fn is_authenticated(self) -> bool {
        self == AuthState::Authenticated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Init,
    Unchanged,
    Changed,
    Error,
}

impl Classification {
    /// Log tag for the cycle line.
    pub fn tag(self) -> &'static str {
        match self {
            Classification::Init => "INIT",
            Classification::Unchanged => "OK",
            Classification::Changed => "CHANGE",
            Classification::Error => "ERR",
        }
    }
}

/// Outcome of one poll cycle. Logged, never stored beyond the latest one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollCycleRecord {
    pub timestamp: String,
    pub fingerprint: Option<Fingerprint>,
    pub classification: Classification,
}

/// One-shot guard: once set it stays set for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerLatch {
    fired: bool,
}

impl TriggerLatch {
    pub fn is_set(&self) -> bool {
        self.fired
    }

    /// Sets the latch. Returns `true` only for the call that actually set it.
    pub fn try_fire(&mut self) -> bool {
        if self.fired {
            return false;
        }
        self.fired = true;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchState {
    baseline: Option<Fingerprint>,
    /// Changed fingerprint waiting for its artifacts before it becomes the baseline.
    pending: Option<Fingerprint>,
    latch: TriggerLatch,
    last_cycle: Option<PollCycleRecord>,
    cycles: u64,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn baseline(&self) -> Option<&Fingerprint> {
        self.baseline.as_ref()
    }

    pub fn pending(&self) -> Option<&Fingerprint> {
        self.pending.as_ref()
    }

    pub fn latch(&self) -> TriggerLatch {
        self.latch
    }

    pub fn last_cycle(&self) -> Option<&PollCycleRecord> {
        self.last_cycle.as_ref()
    }

    /// Number of cycles recorded so far, failed ones included.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub(crate) fn classify(&self, current: &Fingerprint) -> Classification {
        match self.baseline.as_ref() {
            None => Classification::Init,
            Some(previous) if previous == current => Classification::Unchanged,
            Some(_) => Classification::Changed,
        }
    }

    pub(crate) fn set_baseline(&mut self, fingerprint: Fingerprint) {
        self.baseline = Some(fingerprint);
    }

    pub(crate) fn set_pending(&mut self, fingerprint: Option<Fingerprint>) {
        self.pending = fingerprint;
    }

    pub(crate) fn commit_pending(&mut self) {
        if let Some(fingerprint) = self.pending.take() {
            self.baseline = Some(fingerprint);
        }
    }

    /// Turns the latest record into a failure without counting another cycle.
    pub(crate) fn fail_last(&mut self, timestamp: String) {
        self.pending = None;
        self.last_cycle = Some(PollCycleRecord {
            timestamp,
            fingerprint: None,
            classification: Classification::Error,
        });
    }

    pub(crate) fn latch_mut(&mut self) -> &mut TriggerLatch {
        &mut self.latch
    }

    pub(crate) fn record(&mut self, record: PollCycleRecord) {
        self.cycles += 1;
        self.last_cycle = Some(record);
    }
}
