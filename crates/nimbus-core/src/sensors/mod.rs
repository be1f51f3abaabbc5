//! Sensor adapter boundary
//!
//! The station never talks to a bus. A collaborator wraps the physical
//! gas/pressure/humidity sensor and implements [`EnvironmentSensor`]; the
//! station calls it at most once per sampling tick.

mod replay;

pub use replay::ReplaySensor;

use serde::Serialize;
use thiserror_no_std::Error;

use crate::clock::Ticks;

/// Errors reported by a sensor adapter
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    #[error("bus transfer failed: {details}")]
    Bus { details: &'static str },
    #[error("measurement not ready")]
    NotReady,
    #[error("{quantity} reading out of range")]
    OutOfRange { quantity: &'static str },
    #[error("{sensor} initialization failed: {details}")]
    InitializationFailed {
        sensor: &'static str,
        details: &'static str,
    },
}

/// Barometric pressure in whatever unit the adapter produced
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Pressure {
    Pascals(f32),
    Hectopascals(f32),
}

impl Pressure {
    pub fn hectopascals(self) -> f32 {
        match self {
            Self::Pascals(pa) => pa / 100.0,
            Self::Hectopascals(hpa) => hpa,
        }
    }
}

/// Gas sensor resistance in whatever unit the adapter produced
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum GasResistance {
    Ohms(f32),
    KiloOhms(f32),
}

impl GasResistance {
    pub fn kilo_ohms(self) -> f32 {
        match self {
            Self::Ohms(ohms) => ohms / 1000.0,
            Self::KiloOhms(kohm) => kohm,
        }
    }
}

/// One raw reading of the environmental sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorSample {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub pressure: Pressure,
    pub gas_resistance: GasResistance,
    /// Monotonic time the reading was taken
    pub timestamp: Ticks,
}

impl SensorSample {
    pub const fn new(
        temperature_c: f32,
        humidity_pct: f32,
        pressure: Pressure,
        gas_resistance: GasResistance,
        timestamp: Ticks,
    ) -> Self {
        Self {
            temperature_c,
            humidity_pct,
            pressure,
            gas_resistance,
            timestamp,
        }
    }

    /// Reject readings that cannot be physical.
    ///
    /// A sample that fails here is handled exactly like a failed read.
    pub fn validate(&self) -> Result<(), SensorError> {
        if !self.temperature_c.is_finite() {
            return Err(SensorError::OutOfRange {
                quantity: "temperature",
            });
        }
        if !(0.0..=100.0).contains(&self.humidity_pct) {
            return Err(SensorError::OutOfRange {
                quantity: "humidity",
            });
        }
        let hpa = self.pressure.hectopascals();
        if !hpa.is_finite() || hpa <= 0.0 {
            return Err(SensorError::OutOfRange {
                quantity: "pressure",
            });
        }
        let kohm = self.gas_resistance.kilo_ohms();
        if !kohm.is_finite() || kohm < 0.0 {
            return Err(SensorError::OutOfRange {
                quantity: "gas resistance",
            });
        }
        Ok(())
    }
}

/// Trait implemented by sensor adapters.
pub trait EnvironmentSensor {
    /// Bring the sensor up. Called once when the station starts.
    fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    /// Take one reading. Must return promptly; a sensor that is not ready
    /// reports [`SensorError::NotReady`] instead of waiting.
    fn read_sample(&mut self, now: Ticks) -> Result<SensorSample, SensorError>;
}

impl<S: EnvironmentSensor + ?Sized> EnvironmentSensor for &mut S {
    fn init(&mut self) -> Result<(), SensorError> {
        (**self).init()
    }

    fn read_sample(&mut self, now: Ticks) -> Result<SensorSample, SensorError> {
        (**self).read_sample(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SensorSample {
        SensorSample::new(
            21.5,
            45.0,
            Pressure::Pascals(101_325.0),
            GasResistance::Ohms(80_000.0),
            0,
        )
    }

    #[test]
    fn test_unit_conversion() {
        let s = sample();
        assert!((s.pressure.hectopascals() - 1013.25).abs() < 1e-3);
        assert!((s.gas_resistance.kilo_ohms() - 80.0).abs() < 1e-4);
        assert_eq!(Pressure::Hectopascals(990.0).hectopascals(), 990.0);
        assert_eq!(GasResistance::KiloOhms(12.0).kilo_ohms(), 12.0);
    }

    #[test]
    fn test_validate_accepts_normal_reading() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_nan_temperature() {
        let mut s = sample();
        s.temperature_c = f32::NAN;
        assert_eq!(
            s.validate(),
            Err(SensorError::OutOfRange {
                quantity: "temperature"
            })
        );
    }

    #[test]
    fn test_validate_rejects_impossible_humidity_and_pressure() {
        let mut s = sample();
        s.humidity_pct = 104.0;
        assert!(s.validate().is_err());

        let mut s = sample();
        s.pressure = Pressure::Hectopascals(0.0);
        assert_eq!(
            s.validate(),
            Err(SensorError::OutOfRange {
                quantity: "pressure"
            })
        );
    }
}
