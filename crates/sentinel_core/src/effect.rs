#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run the save batch. Emitted at most once per process.
    RunSaveBatch,
    /// A change was detected but the save batch already ran.
    ActionsSkipped,
    CaptureArtifacts { cause: ArtifactCause },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactCause {
    Change,
}

impl ArtifactCause {
    /// Label used as the artifact filename prefix.
    pub fn label(self) -> &'static str {
        match self {
            ArtifactCause::Change => "change",
        }
    }
}
