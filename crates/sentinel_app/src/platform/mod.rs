pub mod config;
pub mod logging;

use std::sync::Arc;

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use sentinel_engine::{
    ensure_output_dir, BatchSaveExecutor, BrowserSettings, ChromiumSession,
    DirectoryArtifactSink, EndpointTemplate, GuardianSettings, HttpSaveClient, Locator,
    PageSaveClient, PollScheduler, RetryPolicy, SaveClient, SaveSettings, Session,
    SessionGuardian, StabilityOptions, WatchSettings, Watcher,
};
use sentinel_logging::{sentinel_info, sentinel_warn};

use config::{SaveTransport, SentinelConfig};

/// Launches the browser and polls until the process is stopped.
pub async fn run(config: SentinelConfig) -> anyhow::Result<()> {
    for warning in &config.warnings {
        sentinel_warn!("{}", warning);
    }
    sentinel_info!("Target: {}", config.target_url);
    sentinel_info!(
        "{} save jobs, transport {:?}, credentials {}",
        config.jobs.len(),
        config.save_transport,
        if config.credentials.is_some() { "set" } else { "not set" }
    );

    ensure_output_dir(&config.artifacts_dir)
        .with_context(|| format!("artifacts dir {:?}", config.artifacts_dir))?;

    let browser = BrowserSettings {
        headless: config.headless,
        ..BrowserSettings::default()
    };
    let session: Arc<dyn Session> = Arc::new(
        ChromiumSession::launch(&browser)
            .await
            .context("failed to start browser session")?,
    );

    let save_settings = SaveSettings {
        endpoint: EndpointTemplate::new(config.save_endpoint),
        student_id: config.api_student_id,
        ..SaveSettings::default()
    };
    let client: Box<dyn SaveClient> = match config.save_transport {
        SaveTransport::Page => Box::new(PageSaveClient),
        SaveTransport::Http => Box::new(
            HttpSaveClient::new(&save_settings).context("failed to build HTTP save client")?,
        ),
    };
    let executor = BatchSaveExecutor::new(client, save_settings, RetryPolicy::default());
    sentinel_info!(
        "Save attempts per job: {}",
        executor.policy().max_attempts
    );

    let mut settings = WatchSettings::new(config.target_url, config.jobs);
    settings.stability = StabilityOptions {
        surface: Locator::css(config.watch_selector),
        ..StabilityOptions::default()
    };
    settings.now_utc = Arc::new(now_utc);

    let mut watcher = Watcher::new(
        session,
        settings,
        SessionGuardian::new(config.credentials, GuardianSettings::default()),
        executor,
        Box::new(DirectoryArtifactSink::new(config.artifacts_dir)),
    );

    let mut scheduler = PollScheduler::new(config.poll_interval);
    sentinel_info!("Polling every {:?}", scheduler.period());
    match scheduler.run_forever(&mut watcher).await {}
}

fn now_utc() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
