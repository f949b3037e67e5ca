// src/config.rs

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::sheets::google::SheetLocation;

pub const DEFAULT_POOL: &str = "Aptitude";
pub const DEFAULT_EXAM_DURATION_MIN: u64 = 90;
pub const DEFAULT_MAX_VIOLATIONS: u32 = 5;
/// Extra session lifetime on top of the exam duration.
pub const SESSION_GRACE_MIN: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub rust_log: String,
    pub log_dir: String,

    pub sheets_api_base: String,
    /// Service-account JSON key used to mint access tokens.
    pub service_account_file: Option<PathBuf>,
    /// Pre-issued access token, used when no key file is configured.
    pub sheets_access_token: Option<String>,
    pub students_sheet: SheetLocation,
    pub questions_sheet: SheetLocation,
    pub responses_sheet: SheetLocation,

    pub exam_duration_min: u64,
    /// Auto-submit fires once the violation count exceeds this.
    pub max_violations: u32,
    pub session_ttl: Duration,
    pub default_pool: String,
    pub secure_cookies: bool,
    pub static_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let service_account_file = var("GOOGLE_SERVICE_ACCOUNT_FILE").map(PathBuf::from);
        let sheets_access_token = var("SHEETS_ACCESS_TOKEN");
        if service_account_file.is_none() && sheets_access_token.is_none() {
            return Err(ConfigError::Missing("GOOGLE_SERVICE_ACCOUNT_FILE"));
        }

        let bind_addr = parse_or(var("BIND_ADDR"), "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?;
        let exam_duration_min = parse_or(
            var("EXAM_DURATION_MIN"),
            "EXAM_DURATION_MIN",
            DEFAULT_EXAM_DURATION_MIN,
        )?;
        let max_violations =
            parse_or(var("MAX_VIOLATIONS"), "MAX_VIOLATIONS", DEFAULT_MAX_VIOLATIONS)?;
        let session_ttl_min = parse_or(
            var("SESSION_TTL_MIN"),
            "SESSION_TTL_MIN",
            exam_duration_min + SESSION_GRACE_MIN,
        )?;
        let secure_cookies = parse_or(var("SECURE_COOKIES"), "SECURE_COOKIES", false)?;

        Ok(Self {
            bind_addr,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            log_dir: var("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            sheets_api_base: var("SHEETS_API_BASE")
                .unwrap_or_else(|| "https://sheets.googleapis.com".to_string()),
            service_account_file,
            sheets_access_token,
            students_sheet: SheetLocation::new(
                required("STUDENTS_SPREADSHEET_ID")?,
                var("STUDENTS_WORKSHEET").unwrap_or_else(|| "Sheet1".to_string()),
            ),
            questions_sheet: SheetLocation::new(
                required("QUESTIONS_SPREADSHEET_ID")?,
                var("QUESTIONS_WORKSHEET").unwrap_or_else(|| "Sheet1".to_string()),
            ),
            responses_sheet: SheetLocation::new(
                required("RESPONSES_SPREADSHEET_ID")?,
                var("RESPONSES_WORKSHEET").unwrap_or_else(|| "Responses".to_string()),
            ),
            exam_duration_min,
            max_violations,
            session_ttl: Duration::from_secs(session_ttl_min * 60),
            default_pool: var("DEFAULT_POOL").unwrap_or_else(|| DEFAULT_POOL.to_string()),
            secure_cookies,
            static_dir: PathBuf::from(var("STATIC_DIR").unwrap_or_else(|| "static".to_string())),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
