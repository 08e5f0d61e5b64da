//! Sentinel engine: driven-session IO, waits, login recovery, save batches and the poll loop.
mod artifact;
mod batch;
mod chromium;
mod guardian;
mod persist;
mod save;
mod scheduler;
mod session;
mod stability;
mod types;
mod wait;
mod watcher;

pub use artifact::{artifact_stem, Artifact, ArtifactSink, DirectoryArtifactSink, StoredArtifact};
pub use batch::{BatchSaveExecutor, RetryPolicy};
pub use chromium::{BrowserSettings, ChromiumSession};
pub use guardian::{Credentials, GuardianSettings, LoginForm, SessionGuardian};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use save::{
    EndpointTemplate, HttpSaveClient, PageSaveClient, SaveClient, SaveRequest, SaveSettings,
    DEFAULT_SAVE_ENDPOINT,
};
pub use scheduler::{PollScheduler, PollTask};
pub use session::Session;
pub use stability::{wait_until_stable, StabilityOptions, DEFAULT_BUSY_INDICATORS};
pub use types::{
    HttpReply, LoadState, Locator, SaveError, SessionError, SessionErrorKind, Visibility,
    WatchError,
};
pub use wait::{try_wait, wait_for_visibility};
pub use watcher::{WatchSettings, Watcher};
