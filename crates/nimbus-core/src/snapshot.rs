//! Copy-out view of the station for renderers and the network page
//!
//! The station owns its state and is the only writer. Readers get a
//! [`StationSnapshot`] by value and never hold references into live state.
//! [`SharedSnapshot`] carries the latest copy across to a worker that serves
//! the textual page on its own schedule.

use core::cell::Cell;
use core::fmt;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::Serialize;

use crate::clock::{Ticks, TimeOfDay};
use crate::connectivity::Connectivity;
use crate::forecast::Trend;
use crate::indicator::IndicatorFrame;
use crate::metrics::{AirQualityLevel, DerivedMetrics};
use crate::station::SensorHealth;

/// Everything a sink needs to render one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StationSnapshot {
    /// Tick the snapshot was taken
    pub taken_at: Ticks,
    /// Last known good metrics, `None` until the first successful sample
    pub metrics: Option<DerivedMetrics>,
    pub air_quality: Option<AirQualityLevel>,
    pub trend: Trend,
    pub pressure_baseline_hpa: Option<f32>,
    pub indicator: IndicatorFrame,
    pub time: TimeOfDay,
    pub connectivity: Connectivity,
    pub health: SensorHealth,
    /// Metrics are still shown but the sensor has stopped answering
    pub stale: bool,
}

impl StationSnapshot {
    pub fn has_data(&self) -> bool {
        self.metrics.is_some()
    }

    /// Ticks since the shown metrics were sampled
    pub fn age(&self) -> Option<Ticks> {
        self.metrics.map(|m| self.taken_at.wrapping_sub(m.sampled_at))
    }
}

/// One-line status, used as the network page body
impl fmt::Display for StationSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | ", self.time)?;

        match (self.metrics, self.air_quality) {
            (Some(m), Some(level)) => {
                write!(
                    f,
                    "{:.1}C {:.1}% {:.1}hPa {} {} | AQ {}% {}",
                    m.temperature_c,
                    m.humidity_pct,
                    m.pressure_hpa,
                    self.trend.symbol(),
                    self.trend.label(),
                    m.air_quality_percent,
                    level.label(),
                )?;
            }
            _ => f.write_str("no data yet")?,
        }

        if self.stale {
            f.write_str(" [stale]")?;
        }

        write!(f, " | {}", self.connectivity.label())
    }
}

/// Latest snapshot shared with another execution context
///
/// Can live in a `static`. Publishing and reading both copy under a
/// critical section, so neither side ever observes a torn value.
pub struct SharedSnapshot {
    inner: Mutex<CriticalSectionRawMutex, Cell<Option<StationSnapshot>>>,
}

impl Default for SharedSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedSnapshot {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(None)),
        }
    }

    pub fn publish(&self, snapshot: StationSnapshot) {
        self.inner.lock(|cell| cell.set(Some(snapshot)));
    }

    /// Copy of the most recently published snapshot
    pub fn latest(&self) -> Option<StationSnapshot> {
        self.inner.lock(|cell| cell.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    fn snapshot(metrics: Option<DerivedMetrics>) -> StationSnapshot {
        StationSnapshot {
            taken_at: 9_000,
            metrics,
            air_quality: metrics.map(|m| m.air_quality_level()),
            trend: Trend::Rising,
            pressure_baseline_hpa: metrics.map(|m| m.pressure_hpa),
            indicator: IndicatorFrame::dark(8),
            time: TimeOfDay::from_ticks(9_000, None),
            connectivity: Connectivity::Offline,
            health: SensorHealth::default(),
            stale: false,
        }
    }

    fn metrics() -> DerivedMetrics {
        DerivedMetrics {
            temperature_c: 21.54,
            humidity_pct: 40.0,
            pressure_hpa: 1013.3,
            gas_resistance_kohm: 80.0,
            air_quality_percent: 48,
            sampled_at: 6_000,
        }
    }

    #[test]
    fn test_status_line() {
        let line = snapshot(Some(metrics())).to_string();
        assert_eq!(
            line,
            "00:00:09 | 21.5C 40.0% 1013.3hPa /\\ Rising | AQ 48% Good | offline"
        );
    }

    #[test]
    fn test_status_line_without_data_and_stale() {
        assert_eq!(
            snapshot(None).to_string(),
            "00:00:09 | no data yet | offline"
        );

        let mut stale = snapshot(Some(metrics()));
        stale.stale = true;
        stale.connectivity = Connectivity::Online;
        assert!(stale.to_string().ends_with("Good [stale] | online"));
    }

    #[test]
    fn test_age() {
        assert_eq!(snapshot(Some(metrics())).age(), Some(3_000));
        assert_eq!(snapshot(None).age(), None);
    }

    #[test]
    fn test_shared_snapshot_copies_out() {
        static SHARED: SharedSnapshot = SharedSnapshot::new();
        assert_eq!(SHARED.latest(), None);

        let mut snap = snapshot(Some(metrics()));
        SHARED.publish(snap);
        snap.stale = true;

        let latest = SHARED.latest().unwrap();
        assert!(!latest.stale);
        assert_eq!(latest.metrics, Some(metrics()));
    }
}
