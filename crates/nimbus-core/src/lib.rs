//! Hardware-independent core library for nimbus
//!
//! This crate contains the platform-agnostic logic of the nimbus environmental
//! telemetry station: cooperative task scheduling, metric derivation, rolling
//! chart history, the pressure trend forecast, indicator mapping, and the
//! dashboard rendering that display sinks draw with.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).
//!
//! Sensor buses, network association and LED signal timing live outside this
//! crate. They plug in through [`sensors::EnvironmentSensor`],
//! [`connectivity::associate`] and [`station::StationSink`].

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod clock;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod forecast;
pub mod history;
pub mod indicator;
pub mod metrics;
pub mod scheduler;
pub mod sensors;
pub mod snapshot;
pub mod station;
pub mod ui;

pub use clock::Ticks;
pub use config::StationConfig;
pub use error::StationError;
pub use station::{Station, StationSink};
