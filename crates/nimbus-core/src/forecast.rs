//! Short-term weather trend from barometric pressure
//!
//! The engine keeps an exponential moving average of pressure as a trailing
//! baseline. Each sample is classified against the baseline *before* the
//! sample is folded into it, so the trend reads "pressure relative to its
//! recent average" rather than relative to itself.

use serde::Serialize;

use crate::config::ForecastConfig;

/// Three-way trend classification, plus the state before any sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Trend {
    /// No pressure sample analysed yet
    #[default]
    Pending,
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Analysing",
            Self::Rising => "Rising",
            Self::Falling => "Falling",
            Self::Stable => "Stable",
        }
    }

    /// Short form for narrow displays and the status line
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Pending => "..",
            Self::Rising => "/\\",
            Self::Falling => "\\/",
            Self::Stable => "--",
        }
    }
}

/// Classify a pressure delta. Deltas exactly at ±`threshold` are stable.
pub fn classify(diff_hpa: f32, threshold_hpa: f32) -> Trend {
    if diff_hpa > threshold_hpa {
        Trend::Rising
    } else if diff_hpa < -threshold_hpa {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastState {
    /// Smoothed pressure, unset until the first sample
    pub baseline_hpa: Option<f32>,
    pub trend: Trend,
}

#[derive(Debug, Clone)]
pub struct ForecastEngine {
    state: ForecastState,
    smoothing: f32,
    threshold_hpa: f32,
}

impl ForecastEngine {
    pub fn new(config: &ForecastConfig) -> Self {
        Self {
            state: ForecastState {
                baseline_hpa: None,
                trend: Trend::Pending,
            },
            smoothing: config.smoothing,
            threshold_hpa: config.threshold_hpa,
        }
    }

    /// Feed one pressure sample and return the new classification.
    ///
    /// The first sample seeds the baseline and is always stable.
    pub fn update(&mut self, pressure_hpa: f32) -> Trend {
        let baseline = *self.state.baseline_hpa.get_or_insert(pressure_hpa);
        let trend = classify(pressure_hpa - baseline, self.threshold_hpa);

        self.state.baseline_hpa =
            Some((1.0 - self.smoothing) * baseline + self.smoothing * pressure_hpa);
        self.state.trend = trend;

        trend
    }

    pub fn trend(&self) -> Trend {
        self.state.trend
    }

    pub fn baseline(&self) -> Option<f32> {
        self.state.baseline_hpa
    }

    pub fn state(&self) -> ForecastState {
        self.state
    }
}
