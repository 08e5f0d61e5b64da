#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// The surface settled and its text was fingerprinted.
    Sampled {
        timestamp: String,
        fingerprint: crate::Fingerprint,
    },
    /// The cycle failed before a fingerprint was obtained.
    TickFailed { timestamp: String },
    /// Artifacts of the current change were handed off; the change becomes the baseline.
    ArtifactsStored,
    /// Artifacts of the current change could not be stored. The cycle counts as
    /// failed and the change is seen again next cycle.
    ArtifactsFailed { timestamp: String },
}
