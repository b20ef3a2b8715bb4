use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be a number, got '{value}'")]
    NotANumber { name: &'static str, value: String },
    #[error("{name} out of range: {reason}")]
    OutOfRange { name: &'static str, reason: &'static str },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub store_timeout: Duration,
    pub slot_granularity_min: u32,
    pub max_date_range_days: u32,
    pub cors_origins: Vec<String>,
    pub log_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://reservaya.db?mode=rwc".to_string(),
            port: 3000,
            store_timeout: Duration::from_secs(10),
            slot_granularity_min: 30,
            max_date_range_days: 62,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
            log_dir: "./logs".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let store_timeout_secs: u64 = parse_var("STORE_TIMEOUT_SECS", defaults.store_timeout.as_secs())?;
        if !(1..=60).contains(&store_timeout_secs) {
            return Err(ConfigError::OutOfRange { name: "STORE_TIMEOUT_SECS", reason: "must be between 1 and 60" });
        }

        let slot_granularity_min: u32 = parse_var("SLOT_GRANULARITY_MIN", defaults.slot_granularity_min)?;
        if slot_granularity_min == 0 || slot_granularity_min > 24 * 60 {
            return Err(ConfigError::OutOfRange { name: "SLOT_GRANULARITY_MIN", reason: "must be between 1 and 1440" });
        }

        let max_date_range_days: u32 = parse_var("MAX_DATE_RANGE_DAYS", defaults.max_date_range_days)?;
        if max_date_range_days == 0 {
            return Err(ConfigError::OutOfRange { name: "MAX_DATE_RANGE_DAYS", reason: "must be positive" });
        }

        let cors_origins = match env::var("CORS_ORIGINS") {
            Ok(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => defaults.cors_origins,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            port: parse_var("PORT", defaults.port)?,
            store_timeout: Duration::from_secs(store_timeout_secs),
            slot_granularity_min,
            max_date_range_days,
            cors_origins,
            log_dir: env::var("LOG_DIR").unwrap_or(defaults.log_dir),
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber { name, value }),
        Err(_) => Ok(default),
    }
}
