// src/config.rs
//
// Runtime settings, read from the environment only.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{PipelineError, Result};
use crate::fetch::RetryPolicy;
use crate::schema::{Region, Variant};

pub const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_level: String,
    pub variant: Variant,
    pub landing_timeout: Duration,
    pub dataset_timeout: Duration,
    pub output_dir: PathBuf,
    /// `None` runs once and exits.
    pub refresh_every: Option<Duration>,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            variant: Variant::MultiRegion,
            landing_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            dataset_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            refresh_every: None,
            retry: RetryPolicy {
                max_retries: DEFAULT_MAX_RETRIES,
                ..RetryPolicy::default()
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unset or blank keys take their defaults;
    /// malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = Config::default();

        if let Some(level) = get("LOG_LEVEL") {
            cfg.log_level = level;
        }
        if let Some(code) = get("RVDSS_REGION") {
            let region = Region::from_code(&code).ok_or_else(|| invalid("RVDSS_REGION", &code))?;
            cfg.variant = Variant::SingleRegion(region);
        }
        if let Some(v) = get("RVDSS_LANDING_TIMEOUT_SECS") {
            cfg.landing_timeout = Duration::from_secs(positive("RVDSS_LANDING_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = get("RVDSS_DATASET_TIMEOUT_SECS") {
            cfg.dataset_timeout = Duration::from_secs(positive("RVDSS_DATASET_TIMEOUT_SECS", &v)?);
        }
        if let Some(dir) = get("RVDSS_OUTPUT_DIR") {
            cfg.output_dir = PathBuf::from(dir);
        }
        if let Some(v) = get("RVDSS_REFRESH_SECS") {
            cfg.refresh_every = Some(Duration::from_secs(positive("RVDSS_REFRESH_SECS", &v)?));
        }
        if let Some(v) = get("RVDSS_MAX_RETRIES") {
            cfg.retry.max_retries = parse("RVDSS_MAX_RETRIES", &v)?;
        }
        Ok(cfg)
    }
}

fn invalid(key: &str, value: &str) -> PipelineError {
    PipelineError::Config {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| invalid(key, value))
}

fn positive(key: &str, value: &str) -> Result<u64> {
    match parse::<u64>(key, value)? {
        0 => Err(invalid(key, value)),
        n => Ok(n),
    }
}
