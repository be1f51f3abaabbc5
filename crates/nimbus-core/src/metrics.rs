//! Metric derivation
//!
//! Turns a raw [`SensorSample`] into the values every sink displays: readings
//! in display units plus an air-quality percentage where higher means worse
//! air. Everything here is pure; the station decides when to call it.

use embedded_graphics::pixelcolor::Rgb565;
use serde::Serialize;

use crate::clock::Ticks;
use crate::config::AirQualityThresholds;
use crate::sensors::SensorSample;
use crate::ui::colors::{
    COLOR_BAD_FOREGROUND, COLOR_EXCELLENT_FOREGROUND, COLOR_GOOD_FOREGROUND, COLOR_POOR_FOREGROUND,
};

/// Readings in display units, computed fresh on each successful sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub pressure_hpa: f32,
    pub gas_resistance_kohm: f32,
    /// 0 = clean air, 100 = worst air
    pub air_quality_percent: u8,
    /// Tick of the sample these metrics were derived from
    pub sampled_at: Ticks,
}

impl DerivedMetrics {
    pub fn air_quality_level(&self) -> AirQualityLevel {
        AirQualityLevel::assess(self.air_quality_percent)
    }
}

/// Derive display metrics from a raw sample.
pub fn derive(sample: &SensorSample, thresholds: &AirQualityThresholds) -> DerivedMetrics {
    let gas_resistance_kohm = sample.gas_resistance.kilo_ohms();

    DerivedMetrics {
        temperature_c: sample.temperature_c,
        humidity_pct: sample.humidity_pct,
        pressure_hpa: sample.pressure.hectopascals(),
        gas_resistance_kohm,
        air_quality_percent: air_quality_percent(gas_resistance_kohm, thresholds),
        sampled_at: sample.timestamp,
    }
}

/// Map gas resistance onto a 0–100 "badness" scale.
///
/// Resistance at or below `bad_kohm` saturates to 100, at or above
/// `clean_kohm` to 0. Non-finite input is treated as clean air; callers
/// validate samples before getting here.
///
/// Thresholds that do not leave `clean_kohm` strictly above `bad_kohm`
/// collapse to a step at `bad_kohm` instead of interpolating.
pub fn air_quality_percent(gas_kohm: f32, thresholds: &AirQualityThresholds) -> u8 {
    let AirQualityThresholds {
        bad_kohm: bad,
        clean_kohm: clean,
    } = *thresholds;

    if !gas_kohm.is_finite() {
        return 0;
    }
    if clean.is_nan() || bad.is_nan() || clean <= bad {
        return if gas_kohm <= bad { 100 } else { 0 };
    }

    let clamped = gas_kohm.clamp(bad, clean);
    let percent = libm::roundf((clean - clamped) * 100.0 / (clean - bad));
    percent.clamp(0.0, 100.0) as u8
}

/// Air quality band for display and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AirQualityLevel {
    /// 0–25 %
    Excellent,
    /// 26–50 %
    Good,
    /// 51–75 %
    Poor,
    /// 76–100 %
    Bad,
}

impl AirQualityLevel {
    pub const fn assess(percent: u8) -> Self {
        match percent {
            0..=25 => Self::Excellent,
            26..=50 => Self::Good,
            51..=75 => Self::Poor,
            _ => Self::Bad,
        }
    }

    /// Get the display color for this level
    pub const fn color(self) -> Rgb565 {
        match self {
            Self::Excellent => COLOR_EXCELLENT_FOREGROUND,
            Self::Good => COLOR_GOOD_FOREGROUND,
            Self::Poor => COLOR_POOR_FOREGROUND,
            Self::Bad => COLOR_BAD_FOREGROUND,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Poor => "Poor",
            Self::Bad => "Bad",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{GasResistance, Pressure};
    use proptest::prelude::*;

    fn defaults() -> AirQualityThresholds {
        AirQualityThresholds::default()
    }

    #[test]
    fn test_saturation_at_bounds() {
        assert_eq!(air_quality_percent(5.0, &defaults()), 100);
        assert_eq!(air_quality_percent(0.0, &defaults()), 100);
        assert_eq!(air_quality_percent(150.0, &defaults()), 0);
        assert_eq!(air_quality_percent(900.0, &defaults()), 0);
    }

    #[test]
    fn test_midpoint_rounds() {
        // (150 - 77.5) * 100 / 145 = 50
        assert_eq!(air_quality_percent(77.5, &defaults()), 50);
        // (150 - 100) * 100 / 145 = 34.48
        assert_eq!(air_quality_percent(100.0, &defaults()), 34);
    }

    #[test]
    fn test_derive_converts_units() {
        let sample = SensorSample::new(
            22.0,
            51.0,
            Pressure::Pascals(100_210.0),
            GasResistance::Ohms(150_000.0),
            42,
        );
        let m = derive(&sample, &defaults());
        assert!(libm::fabsf(m.pressure_hpa - 1002.1) < 1e-3);
        assert!(libm::fabsf(m.gas_resistance_kohm - 150.0) < 1e-3);
        assert_eq!(m.air_quality_percent, 0);
        assert_eq!(m.sampled_at, 42);
        assert_eq!(m.air_quality_level(), AirQualityLevel::Excellent);
    }

    #[test]
    fn test_inverted_thresholds_do_not_panic() {
        let inverted = AirQualityThresholds {
            bad_kohm: 150.0,
            clean_kohm: 5.0,
        };
        assert_eq!(air_quality_percent(50.0, &inverted), 100);
        assert_eq!(air_quality_percent(200.0, &inverted), 0);

        let nan = AirQualityThresholds {
            bad_kohm: f32::NAN,
            clean_kohm: 150.0,
        };
        assert_eq!(air_quality_percent(50.0, &nan), 0);
    }

    #[test]
    fn test_level_bands() {
        assert_eq!(AirQualityLevel::assess(0), AirQualityLevel::Excellent);
        assert_eq!(AirQualityLevel::assess(25), AirQualityLevel::Excellent);
        assert_eq!(AirQualityLevel::assess(26), AirQualityLevel::Good);
        assert_eq!(AirQualityLevel::assess(75), AirQualityLevel::Poor);
        assert_eq!(AirQualityLevel::assess(76), AirQualityLevel::Bad);
        assert_eq!(AirQualityLevel::assess(100).label(), "Bad");
    }

    proptest! {
        #[test]
        fn prop_dirty_air_saturates(gas in 0.0f32..=5.0) {
            prop_assert_eq!(air_quality_percent(gas, &defaults()), 100);
        }

        #[test]
        fn prop_clean_air_saturates(gas in 150.0f32..1.0e6) {
            prop_assert_eq!(air_quality_percent(gas, &defaults()), 0);
        }

        #[test]
        fn prop_monotonically_non_increasing(a in 5.0f32..=150.0, b in 5.0f32..=150.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(air_quality_percent(lo, &defaults()) >= air_quality_percent(hi, &defaults()));
        }
    }
}
