use std::{path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
}

/// Deadlines applied per request (handler) and per store call (service).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    pub create_request: Duration,
    pub request: Duration,
    pub service_call: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            create_request: Duration::from_secs(10),
            request: Duration::from_secs(5),
            service_call: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub filter: String,
    pub json: bool,
    /// Append log lines here instead of stdout.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db: DbConfig,
    pub timeouts: TimeoutConfig,
    pub log: LogConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let parsed = |key: &str| var(key).and_then(|v| v.trim().parse::<u64>().ok());
        let secs = |key: &str, default: u64| Duration::from_secs(parsed(key).unwrap_or(default));

        let db = DbConfig {
            url: var("DATABASE_URL").context("DATABASE_URL must be set")?,
            max_connections: parse_or(var("DB_MAX_CONNECTIONS"), 10),
            idle_timeout: secs("DB_IDLE_TIMEOUT_SECS", 600),
            max_lifetime: secs("DB_MAX_LIFETIME_SECS", 1800),
            acquire_timeout: secs("DB_ACQUIRE_TIMEOUT_SECS", 5),
        };

        let defaults = TimeoutConfig::default();
        let timeouts = TimeoutConfig {
            create_request: parsed("CREATE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.create_request),
            request: parsed("REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request),
            service_call: parsed("SERVICE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.service_call),
        };

        let log = LogConfig {
            filter: var("RUST_LOG").unwrap_or_else(|| {
                "user_management=debug,axum=info,tower_http=info".to_string()
            }),
            json: var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false),
            file: var("LOG_FILE").filter(|v| !v.is_empty()).map(PathBuf::from),
        };

        Ok(Self {
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(var("APP_PORT"), 8080),
            db,
            timeouts,
            log,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
