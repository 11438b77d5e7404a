mod catalog;

use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::workflows::offboarding::delivery::DeliverySettings;
use crate::workflows::offboarding::roster::RosterSource;

pub use catalog::{CatalogError, SystemCatalog};

const DEFAULT_SYSTEMS_FILE: &str = "config/systems.toml";
const DEFAULT_LAST_MODIFIED: &str = "01-03-2025 11:00:00";

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
    /// `None` until `ROSTER_URL` is set; batches refuse to start without it.
    pub roster: Option<RosterSource>,
    pub batch: BatchConfig,
    pub report: ReportConfig,
    pub systems: SystemCatalog,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            roster: load_roster(),
            batch: load_batch()?,
            report: load_report()?,
            systems: load_systems()?,
        })
    }

    pub fn roster_source(&self) -> Result<&RosterSource, ConfigError> {
        self.roster.as_ref().ok_or(ConfigError::MissingRosterUrl)
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

/// Fan-out limits applied to every batch and lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub max_concurrency: usize,
    pub upstream_timeout: Duration,
}

/// Where the artifact goes and who receives it.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub output_dir: PathBuf,
    pub delivery: DeliverySettings,
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn load_roster() -> Option<RosterSource> {
    let url = non_empty_var("ROSTER_URL")?;
    Some(RosterSource {
        url,
        api_key: env::var("ROSTER_API_KEY").unwrap_or_default(),
        dataset_key: env::var("ROSTER_DATASET_KEY").unwrap_or_default(),
        auth_header: non_empty_var("ROSTER_AUTH_HEADER"),
        last_modified: non_empty_var("ROSTER_LAST_MODIFIED")
            .unwrap_or_else(|| DEFAULT_LAST_MODIFIED.to_string()),
    })
}

fn load_batch() -> Result<BatchConfig, ConfigError> {
    let max_concurrency = non_empty_var("EXIT_MAX_CONCURRENCY")
        .map(|value| value.parse::<usize>())
        .transpose()
        .map_err(|_| ConfigError::InvalidConcurrency)?
        .unwrap_or(4);
    if max_concurrency == 0 {
        return Err(ConfigError::InvalidConcurrency);
    }

    let timeout_secs = non_empty_var("EXIT_UPSTREAM_TIMEOUT_SECS")
        .map(|value| value.parse::<u64>())
        .transpose()
        .map_err(|_| ConfigError::InvalidTimeout)?
        .unwrap_or(30);
    if timeout_secs == 0 {
        return Err(ConfigError::InvalidTimeout);
    }

    Ok(BatchConfig {
        max_concurrency,
        upstream_timeout: Duration::from_secs(timeout_secs),
    })
}

fn load_report() -> Result<ReportConfig, ConfigError> {
    let defaults = DeliverySettings::default();

    let recipients: BTreeSet<String> = env::var("REPORT_RECIPIENTS")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|address| !address.is_empty())
        .map(str::to_string)
        .collect();

    let keep_artifact = match non_empty_var("REPORT_KEEP_ARTIFACT") {
        None => false,
        Some(value) => parse_flag(&value).ok_or(ConfigError::InvalidFlag {
            name: "REPORT_KEEP_ARTIFACT",
        })?,
    };

    Ok(ReportConfig {
        output_dir: non_empty_var("REPORT_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
        delivery: DeliverySettings {
            recipients,
            subject: non_empty_var("REPORT_SUBJECT").unwrap_or(defaults.subject),
            body: non_empty_var("REPORT_BODY").unwrap_or(defaults.body),
            keep_artifact,
        },
    })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn load_systems() -> Result<SystemCatalog, ConfigError> {
    match non_empty_var("EXIT_SYSTEMS_FILE") {
        Some(path) => Ok(SystemCatalog::load(Path::new(&path))?),
        None => {
            let path = Path::new(DEFAULT_SYSTEMS_FILE);
            if path.exists() {
                Ok(SystemCatalog::load(path)?)
            } else {
                Ok(SystemCatalog::default())
            }
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidConcurrency,
    InvalidTimeout,
    InvalidFlag { name: &'static str },
    MissingRosterUrl,
    Catalog(CatalogError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidConcurrency => {
                write!(f, "EXIT_MAX_CONCURRENCY must be a positive integer")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "EXIT_UPSTREAM_TIMEOUT_SECS must be a positive number of seconds")
            }
            ConfigError::InvalidFlag { name } => write!(f, "{name} must be true or false"),
            ConfigError::MissingRosterUrl => {
                write!(f, "ROSTER_URL must be set to run an employee exit batch")
            }
            ConfigError::Catalog(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Catalog(err) => Some(err),
            ConfigError::InvalidPort
            | ConfigError::InvalidConcurrency
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidFlag { .. }
            | ConfigError::MissingRosterUrl => None,
        }
    }
}

impl From<CatalogError> for ConfigError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}
