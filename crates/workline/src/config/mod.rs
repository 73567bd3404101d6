use std::env;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::bookings::{DEFAULT_CANCELLATION_LEAD_HOURS, DEFAULT_COMMISSION_RATE};

/// Stage the process runs in, read from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn detect(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Process configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub marketplace: MarketplaceConfig,
}

impl AppConfig {
    /// Read configuration from the process environment, honoring a `.env`
    /// file when one is present. Unset variables fall back to development
    /// defaults; set but malformed ones are hard errors.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            environment: AppEnvironment::detect(&var_or("APP_ENV", "development")),
            server: ServerConfig {
                host: var_or("APP_HOST", "127.0.0.1"),
                port: var_or("APP_PORT", "3000")
                    .parse()
                    .map_err(|_| ConfigError::InvalidPort)?,
            },
            telemetry: TelemetryConfig {
                log_level: var_or("APP_LOG_LEVEL", "info"),
            },
            marketplace: MarketplaceConfig::from_env()?,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// HTTP bind settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Resolve the bind address. `localhost` is accepted as an alias for the
    /// v4 loopback; anything else must be a literal IP.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::from([127, 0, 0, 1])
        } else {
            self.host
                .parse()
                .map_err(|source| ConfigError::InvalidHost { source })?
        };

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Logging controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Marketplace policy dials. These seed the engine's pricing and
/// cancellation policies; the domain defaults apply when unset.
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    pub commission_rate: f64,
    pub cancellation_lead_hours: i64,
}

impl MarketplaceConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let commission_rate = match env::var("APP_COMMISSION_RATE") {
            Ok(raw) => parse_commission_rate(&raw)?,
            Err(_) => DEFAULT_COMMISSION_RATE,
        };

        let cancellation_lead_hours = match env::var("APP_CANCELLATION_LEAD_HOURS") {
            Ok(raw) => parse_lead_hours(&raw)?,
            Err(_) => DEFAULT_CANCELLATION_LEAD_HOURS,
        };

        Ok(Self {
            commission_rate,
            cancellation_lead_hours,
        })
    }
}

fn parse_commission_rate(raw: &str) -> Result<f64, ConfigError> {
    let rate: f64 = raw.trim().parse().map_err(|_| invalid_rate(raw))?;
    if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        return Err(invalid_rate(raw));
    }
    Ok(rate)
}

fn invalid_rate(raw: &str) -> ConfigError {
    ConfigError::InvalidCommissionRate {
        raw: raw.to_string(),
    }
}

fn parse_lead_hours(raw: &str) -> Result<i64, ConfigError> {
    let hours: i64 = raw.trim().parse().map_err(|_| invalid_lead(raw))?;
    if hours < 0 {
        return Err(invalid_lead(raw));
    }
    Ok(hours)
}

fn invalid_lead(raw: &str) -> ConfigError {
    ConfigError::InvalidCancellationLead {
        raw: raw.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must be `localhost` or a literal IP address")]
    InvalidHost { source: std::net::AddrParseError },
    #[error("APP_COMMISSION_RATE must be a number between 0 and 1, got '{raw}'")]
    InvalidCommissionRate { raw: String },
    #[error("APP_CANCELLATION_LEAD_HOURS must be a non-negative integer, got '{raw}'")]
    InvalidCancellationLead { raw: String },
}
