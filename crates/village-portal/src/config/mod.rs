use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub certificate: CertificateSettings,
    pub office: OfficeDetails,
    pub chat: ChatSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = CertificateSettings::default();
        let certificate = CertificateSettings {
            cooldown_days: numeric_var("CERTIFICATE_COOLDOWN_DAYS", defaults.cooldown_days)?,
            freshness_hours: numeric_var("CERTIFICATE_FRESHNESS_HOURS", defaults.freshness_hours)?,
        };

        let office_defaults = OfficeDetails::default();
        let office = OfficeDetails {
            village_name: env::var("VILLAGE_NAME").unwrap_or(office_defaults.village_name),
            division: env::var("VILLAGE_DIVISION").unwrap_or(office_defaults.division),
            officer_title: env::var("OFFICER_TITLE").unwrap_or(office_defaults.officer_title),
        };

        let chat = ChatSettings {
            history_limit: numeric_var("CHAT_HISTORY_LIMIT", ChatSettings::default().history_limit)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            certificate,
            office,
            chat,
        })
    }
}

fn numeric_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Timing rules for the certificate workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CertificateSettings {
    pub cooldown_days: u32,
    pub freshness_hours: u32,
}

impl CertificateSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::days(i64::from(self.cooldown_days))
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::hours(i64::from(self.freshness_hours))
    }
}

impl Default for CertificateSettings {
    fn default() -> Self {
        Self {
            cooldown_days: 7,
            freshness_hours: 24,
        }
    }
}

/// Issuing office printed on rendered certificates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficeDetails {
    pub village_name: String,
    pub division: String,
    pub officer_title: String,
}

impl Default for OfficeDetails {
    fn default() -> Self {
        Self {
            village_name: "Grama Niladhari Division".to_string(),
            division: "Divisional Secretariat".to_string(),
            officer_title: "Grama Niladhari".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatSettings {
    pub history_limit: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self { history_limit: 50 }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
