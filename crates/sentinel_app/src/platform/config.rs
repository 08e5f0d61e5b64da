//! Process configuration read from environment variables.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use sentinel_core::SaveJob;
use sentinel_engine::{Credentials, DEFAULT_SAVE_ENDPOINT};
use thiserror::Error;
use url::Url;

use super::logging::LogDestination;

const DEFAULT_API_STUDENT_ID: &str = "36646";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_WATCH_SELECTOR: &str = "body";
const DEFAULT_ARTIFACTS_DIR: &str = "./artifacts";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("invalid {key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("failed to read jobs file {path:?}: {source}")]
    JobsFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse jobs file {path:?}: {message}")]
    JobsParse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveTransport {
    /// `fetch` from inside the page.
    #[default]
    Page,
    /// Direct HTTP request carrying the browser's cookies.
    Http,
}

#[derive(Debug, Clone)]
pub struct SentinelConfig {
    /// `URL` with `STUDENT_ID` appended.
    pub target_url: String,
    pub credentials: Option<Credentials>,
    pub api_student_id: String,
    pub save_endpoint: String,
    pub save_transport: SaveTransport,
    pub poll_interval: Duration,
    pub watch_selector: String,
    pub artifacts_dir: PathBuf,
    pub jobs: Vec<SaveJob>,
    pub headless: bool,
    pub log_destination: LogDestination,
    /// Problems that did not stop startup, logged once the logger is up.
    pub warnings: Vec<String>,
}

impl SentinelConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base = get("URL").ok_or(ConfigError::Missing("URL"))?;
        let student = get("STUDENT_ID").ok_or(ConfigError::Missing("STUDENT_ID"))?;
        let target_url = format!("{base}{student}");
        Url::parse(&target_url).map_err(|err| ConfigError::Invalid {
            key: "URL",
            value: target_url.clone(),
            reason: err.to_string(),
        })?;

        let mut warnings = Vec::new();
        let credentials = match (get("LOGIN"), get("PASSWORD")) {
            (Some(login), Some(password)) => Some(Credentials { login, password }),
            (None, None) => None,
            _ => {
                warnings.push("only one of LOGIN/PASSWORD is set; ignoring both".to_string());
                None
            }
        };

        let save_endpoint =
            get("SAVE_ENDPOINT").unwrap_or_else(|| DEFAULT_SAVE_ENDPOINT.to_string());
        if !save_endpoint.contains("{schedule}") {
            return Err(ConfigError::Invalid {
                key: "SAVE_ENDPOINT",
                value: save_endpoint,
                reason: "missing {schedule} placeholder".to_string(),
            });
        }

        let save_transport = match get("SAVE_TRANSPORT") {
            None => SaveTransport::default(),
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "page" => SaveTransport::Page,
                "http" => SaveTransport::Http,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "SAVE_TRANSPORT",
                        value,
                        reason: "expected `page` or `http`".to_string(),
                    })
                }
            },
        };

        let poll_secs = match get("POLL_INTERVAL_SECS") {
            None => DEFAULT_POLL_INTERVAL_SECS,
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "POLL_INTERVAL_SECS",
                        value,
                        reason: "expected a positive number of seconds".to_string(),
                    })
                }
            },
        };

        let headless = match get("HEADLESS") {
            None => false,
            Some(value) => parse_flag(&value).ok_or_else(|| ConfigError::Invalid {
                key: "HEADLESS",
                value: value.clone(),
                reason: "expected true/false".to_string(),
            })?,
        };

        let log_destination = match get("LOG_DESTINATION") {
            None => LogDestination::default(),
            Some(value) => LogDestination::parse(&value).ok_or_else(|| ConfigError::Invalid {
                key: "LOG_DESTINATION",
                value: value.clone(),
                reason: "expected `file`, `terminal` or `both`".to_string(),
            })?,
        };

        let jobs = match get("JOBS_FILE") {
            Some(path) => load_jobs(PathBuf::from(path))?,
            None => default_jobs(),
        };

        Ok(Self {
            target_url,
            credentials,
            api_student_id: get("API_STUDENT_ID")
                .unwrap_or_else(|| DEFAULT_API_STUDENT_ID.to_string()),
            save_endpoint,
            save_transport,
            poll_interval: Duration::from_secs(poll_secs),
            watch_selector: get("WATCH_SELECTOR")
                .unwrap_or_else(|| DEFAULT_WATCH_SELECTOR.to_string()),
            artifacts_dir: PathBuf::from(
                get("ARTIFACTS_DIR").unwrap_or_else(|| DEFAULT_ARTIFACTS_DIR.to_string()),
            ),
            jobs,
            headless,
            log_destination,
            warnings,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Reads a RON list of `(schedule_id: "...", items: [...])` entries.
pub fn load_jobs(path: PathBuf) -> Result<Vec<SaveJob>, ConfigError> {
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(source) => return Err(ConfigError::JobsFile { path, source }),
    };
    match ron::from_str::<Vec<SaveJob>>(&content) {
        Ok(jobs) => Ok(jobs),
        Err(err) => Err(ConfigError::JobsParse {
            path,
            message: err.to_string(),
        }),
    }
}

pub fn default_jobs() -> Vec<SaveJob> {
    vec![
        SaveJob::new("94601", vec![232314, 232315, 232329]),
        SaveJob::new("94600", vec![232526, 232527, 232545, 232546]),
        SaveJob::new("96803", vec![234428, 234430, 234436]),
        SaveJob::new("95160", vec![233009, 233012, 233011]),
        SaveJob::new("94602", vec![234816]),
        SaveJob::new("95165", vec![233407, 233410, 233409]),
    ]
}
