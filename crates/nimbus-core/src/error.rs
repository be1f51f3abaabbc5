//! Error types for the station core
//!
//! Per-tick failures (a bad sensor read) never leave the control loop; they
//! are logged and counted by the station. The types here are returned only
//! from start-up paths: building a station, registering tasks, or bringing
//! the sensor up.

use thiserror_no_std::Error;

use crate::sensors::SensorError;

/// Rejected station configuration
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("task period for {task} must be non-zero")]
    ZeroPeriod { task: &'static str },
    #[error("clean gas resistance threshold must be above the bad threshold")]
    AirQualityThresholds,
    #[error("history capacity must be at least one")]
    ZeroHistoryCapacity,
    #[error("EMA smoothing factor must be in (0, 1]")]
    Smoothing,
    #[error("trend threshold must be a non-negative number")]
    TrendThreshold,
    #[error("indicator segment count {0} is out of range")]
    IndicatorSegments(u8),
    #[error("alarm threshold {0}% is above 100%")]
    AlarmThreshold(u8),
    #[error("blink period must be at least two ticks")]
    BlinkPeriod,
    #[error("stale threshold must be at least one failed read")]
    StaleAfterFailures,
}

/// Scheduler table errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("scheduler task table is full ({capacity} tasks)")]
    Full { capacity: usize },
}

/// Failures that stop a station from starting
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum StationError {
    #[error("invalid configuration: {0}")]
    Config(ConfigError),
    #[error("scheduler setup failed: {0}")]
    Scheduler(SchedulerError),
    #[error("sensor initialization failed: {0}")]
    SensorInit(SensorError),
}

impl From<ConfigError> for StationError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<SchedulerError> for StationError {
    fn from(value: SchedulerError) -> Self {
        Self::Scheduler(value)
    }
}

impl From<SensorError> for StationError {
    fn from(value: SensorError) -> Self {
        Self::SensorInit(value)
    }
}
