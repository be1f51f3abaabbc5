//! Synthetic environmental sensor
//!
//! Produces slowly varying readings from the simulated clock so every part of
//! the dashboard moves: temperature and humidity drift, pressure swings enough
//! to change the trend, and gas resistance dips into the alarm band now and
//! then. Read failures can be injected on a fixed cadence or toggled by hand.

use nimbus_core::Ticks;
use nimbus_core::sensors::{
    EnvironmentSensor, GasResistance, Pressure, SensorError, SensorSample,
};

pub struct SyntheticSensor {
    /// Fail every n-th read, `None` to never fail on cadence
    fail_every: Option<u32>,
    /// Fail every read until cleared
    faulted: bool,
    reads: u32,
}

impl SyntheticSensor {
    pub fn new(fail_every: Option<u32>) -> Self {
        Self {
            fail_every: fail_every.filter(|n| *n > 0),
            faulted: false,
            reads: 0,
        }
    }

    pub fn toggle_fault(&mut self) -> bool {
        self.faulted = !self.faulted;
        self.faulted
    }

    fn should_fail(&self) -> bool {
        self.faulted || self.fail_every.is_some_and(|n| self.reads % n == 0)
    }
}

impl EnvironmentSensor for SyntheticSensor {
    fn read_sample(&mut self, now: Ticks) -> Result<SensorSample, SensorError> {
        self.reads = self.reads.wrapping_add(1);
        if self.should_fail() {
            return Err(SensorError::Bus {
                details: "simulated CRC mismatch",
            });
        }

        let t = now as f64 / 1000.0;

        // 20–26 °C
        let temperature = 23.0 + 3.0 * (t / 1200.0).sin() + 0.5 * (t / 370.0).cos();

        // 40–62 %
        let humidity = 50.0 + 10.0 * (t / 1800.0).sin() + 2.0 * (t / 230.0).cos();

        // Adapters often report Pa; roughly 1010–1016 hPa
        let pressure_pa = 101_325.0 + 250.0 * (t / 900.0).sin() + 40.0 * (t / 130.0).cos();

        // 3–117 kΩ, the low end saturates the air quality alarm
        let gas_ohms = 60_000.0 + 57_000.0 * (t / 600.0).sin();

        Ok(SensorSample::new(
            temperature as f32,
            humidity as f32,
            Pressure::Pascals(pressure_pa as f32),
            GasResistance::Ohms(gas_ohms as f32),
            now,
        ))
    }
}
