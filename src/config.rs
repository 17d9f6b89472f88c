use crate::sample_buffer::DEFAULT_CAPACITY;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_LOG_FILE: &str = "weather_log.csv";
pub const DEFAULT_SAMPLE_PERIOD: Duration = Duration::from_secs(1);
pub const DEFAULT_LOG_PERIOD: Duration = Duration::from_secs(5);
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("buffer capacity must be at least 1")]
    ZeroCapacity,
    #[error("{0} period must be greater than zero")]
    ZeroPeriod(&'static str),
}

/// Runtime settings for one station process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationConfig {
    pub log_path: PathBuf,
    pub capacity: usize,
    pub sample_period: Duration,
    pub log_period: Duration,
    pub refresh_period: Duration,
    /// Stop on our own after this long; `None` runs until interrupted.
    pub run_for: Option<Duration>,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
            capacity: DEFAULT_CAPACITY,
            sample_period: DEFAULT_SAMPLE_PERIOD,
            log_period: DEFAULT_LOG_PERIOD,
            refresh_period: DEFAULT_REFRESH_PERIOD,
            run_for: None,
        }
    }
}

impl StationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        for (name, period) in [
            ("sample", self.sample_period),
            ("log", self.log_period),
            ("refresh", self.refresh_period),
        ] {
            if period.is_zero() {
                return Err(ConfigError::ZeroPeriod(name));
            }
        }
        Ok(())
    }
}
