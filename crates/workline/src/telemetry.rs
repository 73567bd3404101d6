use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

/// Failures while installing the tracing subscriber.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("log filter '{directive}' does not parse")]
    Filter {
        directive: String,
        source: ParseError,
    },
    #[error("tracing subscriber install failed: {0}")]
    Install(Box<dyn std::error::Error + Send + Sync>),
}

/// Install the process-wide subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the configured level becomes the
/// default directive. Installing twice fails, so only entry points call this.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.log_level)?)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .try_init()
        .map_err(TelemetryError::Install)
}

fn env_filter(configured: &str) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(configured).map_err(|source| TelemetryError::Filter {
        directive: configured.to_string(),
        source,
    })
}
