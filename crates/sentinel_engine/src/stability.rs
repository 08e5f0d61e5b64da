use std::time::Duration;

use sentinel_core::normalize_text;
use sentinel_logging::{sentinel_debug, sentinel_trace};
use tokio::time::Instant;

use crate::wait::{try_wait, wait_for_visibility};
use crate::{LoadState, Locator, Session, Visibility, WatchError};

/// Regions that signal an in-flight render. Waited out before sampling.
pub const DEFAULT_BUSY_INDICATORS: &[&str] = &[
    ".el-loading-mask",
    ".el-loading-spinner",
    ".el-icon-loading",
    "[class*='loading']",
];

#[derive(Debug, Clone)]
pub struct StabilityOptions {
    /// Surface whose text is sampled.
    pub surface: Locator,
    /// Consecutive identical samples needed to call the surface stable.
    pub stable_samples: u32,
    pub sample_delay: Duration,
    pub timeout: Duration,
    pub busy_indicators: Vec<Locator>,
}

impl Default for StabilityOptions {
    fn default() -> Self {
        Self {
            surface: Locator::css("body"),
            stable_samples: 3,
            sample_delay: Duration::from_millis(800),
            timeout: Duration::from_secs(120),
            busy_indicators: DEFAULT_BUSY_INDICATORS
                .iter()
                .map(|css| Locator::css(*css))
                .collect(),
        }
    }
}

/// Wait until the surface text stops changing and return it normalized.
///
/// Readiness signals and busy indicators are best-effort: their absence never
/// fails the wait. Only the overall deadline does, with `StabilityTimeout`.
pub async fn wait_until_stable(
    session: &dyn Session,
    options: &StabilityOptions,
) -> Result<String, WatchError> {
    let started = Instant::now();
    let deadline = started + options.timeout;

    try_wait(
        "domcontentloaded",
        options.timeout,
        session.wait_for_load(LoadState::DomContentLoaded, options.timeout),
    )
    .await;
    try_wait(
        "networkidle",
        options.timeout,
        session.wait_for_load(LoadState::NetworkIdle, options.timeout),
    )
    .await;

    for indicator in &options.busy_indicators {
        if session.is_visible(indicator).await.unwrap_or(false) {
            sentinel_debug!("busy indicator {} visible, waiting for it to clear", indicator);
            try_wait(
                "busy indicator hidden",
                options.timeout,
                wait_for_visibility(session, indicator, Visibility::Hidden, options.timeout),
            )
            .await;
        }
    }

    let required = options.stable_samples.max(1);
    let mut previous: Option<String> = None;
    let mut streak = 0u32;

    while Instant::now() < deadline {
        let text = session
            .inner_text(&options.surface)
            .await
            .unwrap_or_default();
        let normalized = normalize_text(&text);

        if previous.as_deref() == Some(normalized.as_str()) {
            streak += 1;
        } else {
            streak = 1;
        }
        sentinel_trace!("stability sample streak={}/{}", streak, required);

        if streak >= required {
            sentinel_debug!(
                "surface stable after {:.2}s",
                started.elapsed().as_secs_f64()
            );
            return Ok(normalized);
        }

        previous = Some(normalized);
        tokio::time::sleep(options.sample_delay).await;
    }

    Err(WatchError::StabilityTimeout {
        timeout: options.timeout,
    })
}
