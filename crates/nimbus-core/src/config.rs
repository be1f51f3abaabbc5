//! Station configuration
//!
//! Every tunable of the station lives here. The defaults are the reference
//! constants of the deployed station; tests and the simulator override them.

use serde::{Deserialize, Serialize};

use crate::clock::Ticks;
use crate::error::ConfigError;

/// Largest indicator that fits the segment bit mask
pub const MAX_INDICATOR_SEGMENTS: u8 = 16;

/// Full station configuration
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(default)]
pub struct StationConfig {
    pub periods: TaskPeriods,
    pub air_quality: AirQualityThresholds,
    pub history: HistoryConfig,
    pub forecast: ForecastConfig,
    pub indicator: IndicatorConfig,
    pub health: HealthConfig,
}

/// Periods of the three scheduled tasks, in ticks
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct TaskPeriods {
    /// Clock / time display refresh
    pub clock: Ticks,
    /// Sensor sample, derivation and forecast update
    pub sample: Ticks,
    /// History push and chart refresh
    pub chart: Ticks,
}

impl Default for TaskPeriods {
    fn default() -> Self {
        Self {
            clock: 1_000,
            sample: 3_000,
            chart: 300_000,
        }
    }
}

/// Gas resistance bounds for the air-quality percentage, in kΩ
///
/// At or below `bad_kohm` the air is reported as 100 % bad, at or above
/// `clean_kohm` as 0 %.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AirQualityThresholds {
    pub bad_kohm: f32,
    pub clean_kohm: f32,
}

impl Default for AirQualityThresholds {
    fn default() -> Self {
        Self {
            bad_kohm: 5.0,
            clean_kohm: 150.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Number of chart points retained per channel
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 40 }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct ForecastConfig {
    /// EMA smoothing factor α applied to the pressure baseline
    pub smoothing: f32,
    /// Pressure delta (hPa) beyond which the trend is rising or falling
    pub threshold_hpa: f32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            smoothing: 0.05,
            threshold_hpa: 0.2,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Number of segments K on the indicator bar
    pub segments: u8,
    /// Air-quality percentage above which the bar blinks
    pub alarm_percent: u8,
    /// Full off/on blink cycle in ticks
    pub blink_period: Ticks,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            segments: 8,
            alarm_percent: 90,
            blink_period: 400,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct HealthConfig {
    /// Consecutive failed reads after which the cached metrics are flagged stale
    pub stale_after_failures: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            stale_after_failures: 5,
        }
    }
}

impl StationConfig {
    /// Check every invariant the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("clock", self.periods.clock),
            ("sample", self.periods.sample),
            ("chart", self.periods.chart),
        ];
        for (task, period) in periods {
            if period == 0 {
                return Err(ConfigError::ZeroPeriod { task });
            }
        }

        let aq = &self.air_quality;
        if !(aq.bad_kohm.is_finite() && aq.clean_kohm.is_finite()) || aq.clean_kohm <= aq.bad_kohm
        {
            return Err(ConfigError::AirQualityThresholds);
        }

        if self.history.capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }

        let fc = &self.forecast;
        if !(fc.smoothing > 0.0 && fc.smoothing <= 1.0) {
            return Err(ConfigError::Smoothing);
        }
        if !(fc.threshold_hpa.is_finite() && fc.threshold_hpa >= 0.0) {
            return Err(ConfigError::TrendThreshold);
        }

        let ind = &self.indicator;
        if ind.segments == 0 || ind.segments > MAX_INDICATOR_SEGMENTS {
            return Err(ConfigError::IndicatorSegments(ind.segments));
        }
        if ind.alarm_percent > 100 {
            return Err(ConfigError::AlarmThreshold(ind.alarm_percent));
        }
        if ind.blink_period < 2 {
            return Err(ConfigError::BlinkPeriod);
        }

        if self.health.stale_after_failures == 0 {
            return Err(ConfigError::StaleAfterFailures);
        }

        Ok(())
    }
}

/// Network association settings handed to the connectivity collaborator
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default, bound(deserialize = "'de: 'a"))]
pub struct NetworkConfig<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
    /// Association attempts before falling back to offline mode
    pub association_attempts: u8,
}

impl Default for NetworkConfig<'_> {
    fn default() -> Self {
        Self {
            ssid: "",
            password: "",
            association_attempts: 10,
        }
    }
}
