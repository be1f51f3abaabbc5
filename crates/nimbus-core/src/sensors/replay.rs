//! Scripted sensor adapter
//!
//! Replays a queue of prepared results. Used by tests and by the simulator to
//! inject read failures at known ticks.

use alloc::collections::VecDeque;

use super::{EnvironmentSensor, SensorError, SensorSample};
use crate::clock::Ticks;

pub struct ReplaySensor {
    script: VecDeque<Result<SensorSample, SensorError>>,
    init_result: Result<(), SensorError>,
    reads: usize,
}

impl Default for ReplaySensor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplaySensor {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            init_result: Ok(()),
            reads: 0,
        }
    }

    /// Queue a successful reading. Its timestamp is replaced by the read time.
    pub fn then_ok(mut self, sample: SensorSample) -> Self {
        self.script.push_back(Ok(sample));
        self
    }

    /// Queue a failed reading.
    pub fn then_err(mut self, error: SensorError) -> Self {
        self.script.push_back(Err(error));
        self
    }

    /// Make [`EnvironmentSensor::init`] fail.
    pub fn with_init_error(mut self, error: SensorError) -> Self {
        self.init_result = Err(error);
        self
    }

    pub fn push(&mut self, result: Result<SensorSample, SensorError>) {
        self.script.push_back(result);
    }

    /// Number of reads performed so far
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Number of scripted results not yet consumed
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl EnvironmentSensor for ReplaySensor {
    fn init(&mut self) -> Result<(), SensorError> {
        self.init_result
    }

    fn read_sample(&mut self, now: Ticks) -> Result<SensorSample, SensorError> {
        self.reads += 1;
        match self.script.pop_front() {
            Some(Ok(mut sample)) => {
                sample.timestamp = now;
                Ok(sample)
            }
            Some(Err(e)) => Err(e),
            None => Err(SensorError::NotReady),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{GasResistance, Pressure};

    #[test]
    fn test_replay_in_order_then_not_ready() {
        let sample = SensorSample::new(
            20.0,
            40.0,
            Pressure::Hectopascals(1000.0),
            GasResistance::KiloOhms(50.0),
            0,
        );
        let mut sensor = ReplaySensor::new()
            .then_ok(sample)
            .then_err(SensorError::Bus { details: "nack" });

        let first = sensor.read_sample(3_000).unwrap();
        assert_eq!(first.timestamp, 3_000);
        assert_eq!(
            sensor.read_sample(6_000),
            Err(SensorError::Bus { details: "nack" })
        );
        assert_eq!(sensor.read_sample(9_000), Err(SensorError::NotReady));
        assert_eq!(sensor.reads(), 3);
        assert_eq!(sensor.remaining(), 0);
    }

    #[test]
    fn test_init_error() {
        let mut sensor = ReplaySensor::new().with_init_error(SensorError::InitializationFailed {
            sensor: "replay",
            details: "scripted",
        });
        assert!(sensor.init().is_err());
    }
}
