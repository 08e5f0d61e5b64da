mod platform;

use platform::config::SentinelConfig;
use platform::logging::{self, LogDestination};
use sentinel_logging::{sentinel_error, sentinel_info, sentinel_warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Variables already set in the environment take precedence over `.env`.
    let dotenv = dotenvy::dotenv();

    let config = SentinelConfig::from_env();
    let destination = match &config {
        Ok(config) => config.log_destination,
        Err(_) => LogDestination::Terminal,
    };
    logging::initialize(destination);

    match dotenv {
        Ok(path) => sentinel_info!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => {}
        Err(err) => sentinel_warn!("Ignoring .env: {}", err),
    }

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            sentinel_error!("[FATAL] {}", err);
            return Err(err.into());
        }
    };

    if let Err(err) = platform::run(config).await {
        sentinel_error!("[FATAL] {:#}", err);
        return Err(err);
    }
    Ok(())
}
