//! Station control loop
//!
//! [`Station`] owns the configuration, the scheduler, the sensor adapter and
//! all runtime state. The caller drives it by calling [`Station::poll`] with
//! the current tick as often as it likes; the station fires whatever tasks are
//! due and reports through a [`StationSink`].
//!
//! Tasks, in fire order when due together:
//! - **Clock**: recompute the time of day
//! - **Sample**: read the sensor, derive metrics, update the forecast
//! - **Chart**: push the latest metrics into every chart history
//!
//! A failed sample never stops the other tasks. The last good metrics stay on
//! display and are flagged stale after enough consecutive failures.

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::clock::{Ticks, TimeOfDay};
use crate::config::StationConfig;
use crate::connectivity::Connectivity;
use crate::error::StationError;
use crate::forecast::ForecastEngine;
use crate::history::{ChartChannel, ChartSet, ChartSnapshot};
use crate::indicator::{Indicator, IndicatorFrame};
use crate::metrics::{self, DerivedMetrics};
use crate::scheduler::{FirstFire, Scheduler};
use crate::sensors::{EnvironmentSensor, SensorError};
use crate::snapshot::{SharedSnapshot, StationSnapshot};

const TASK_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StationTask {
    Clock,
    Sample,
    Chart,
}

/// Read statistics for the sensor adapter
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorHealth {
    pub consecutive_failures: u32,
    pub total_failures: u32,
    pub total_samples: u32,
    /// Tick of the last successful sample
    pub last_success: Option<Ticks>,
}

impl SensorHealth {
    fn record_success(&mut self, now: Ticks) {
        self.consecutive_failures = 0;
        self.total_samples = self.total_samples.saturating_add(1);
        self.last_success = Some(now);
    }

    fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.total_failures = self.total_failures.saturating_add(1);
    }

    /// A threshold of zero never marks the metrics stale.
    pub fn is_stale(&self, stale_after_failures: u32) -> bool {
        stale_after_failures > 0 && self.consecutive_failures >= stale_after_failures
    }
}

/// Runtime state, owned by the station and passed around explicitly
#[derive(Debug, Clone)]
pub struct StationState {
    /// Last known good metrics
    pub metrics: Option<DerivedMetrics>,
    pub charts: ChartSet,
    pub forecast: ForecastEngine,
    /// Frame currently shown on the indicator
    pub indicator: IndicatorFrame,
    pub time: TimeOfDay,
    pub connectivity: Connectivity,
    pub wall_clock_offset: Option<u64>,
    pub health: SensorHealth,
    /// Tick passed to the most recent poll
    pub last_poll: Ticks,
}

/// What happened during one [`Station::poll`]
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PollSummary {
    pub fired: heapless::Vec<StationTask, TASK_COUNT>,
    /// Set when the sample task fired and the read failed
    pub sensor_error: Option<SensorError>,
    pub indicator_changed: bool,
}

impl PollSummary {
    pub fn fired(&self, task: StationTask) -> bool {
        self.fired.contains(&task)
    }
}

/// Receiver of station updates
///
/// The display, the indicator driver and the network page each implement
/// this. Every method has an empty default so a sink only handles what it
/// renders. Sinks receive copies and must not block.
pub trait StationSink {
    fn clock_tick(&mut self, _time: TimeOfDay) {}

    /// Called after a successful sample, and when the stale flag changes
    fn metrics_updated(&mut self, _snapshot: &StationSnapshot) {}

    /// Called once per channel after each history push
    fn chart_updated(&mut self, _chart: &ChartSnapshot) {}

    fn indicator_changed(&mut self, _frame: IndicatorFrame) {}
}

impl StationSink for () {}

impl<T: StationSink + ?Sized> StationSink for &mut T {
    fn clock_tick(&mut self, time: TimeOfDay) {
        (**self).clock_tick(time)
    }

    fn metrics_updated(&mut self, snapshot: &StationSnapshot) {
        (**self).metrics_updated(snapshot)
    }

    fn chart_updated(&mut self, chart: &ChartSnapshot) {
        (**self).chart_updated(chart)
    }

    fn indicator_changed(&mut self, frame: IndicatorFrame) {
        (**self).indicator_changed(frame)
    }
}

impl<A: StationSink, B: StationSink> StationSink for (A, B) {
    fn clock_tick(&mut self, time: TimeOfDay) {
        self.0.clock_tick(time);
        self.1.clock_tick(time);
    }

    fn metrics_updated(&mut self, snapshot: &StationSnapshot) {
        self.0.metrics_updated(snapshot);
        self.1.metrics_updated(snapshot);
    }

    fn chart_updated(&mut self, chart: &ChartSnapshot) {
        self.0.chart_updated(chart);
        self.1.chart_updated(chart);
    }

    fn indicator_changed(&mut self, frame: IndicatorFrame) {
        self.0.indicator_changed(frame);
        self.1.indicator_changed(frame);
    }
}

impl<A: StationSink, B: StationSink, C: StationSink> StationSink for (A, B, C) {
    fn clock_tick(&mut self, time: TimeOfDay) {
        self.0.clock_tick(time);
        self.1.clock_tick(time);
        self.2.clock_tick(time);
    }

    fn metrics_updated(&mut self, snapshot: &StationSnapshot) {
        self.0.metrics_updated(snapshot);
        self.1.metrics_updated(snapshot);
        self.2.metrics_updated(snapshot);
    }

    fn chart_updated(&mut self, chart: &ChartSnapshot) {
        self.0.chart_updated(chart);
        self.1.chart_updated(chart);
        self.2.chart_updated(chart);
    }

    fn indicator_changed(&mut self, frame: IndicatorFrame) {
        self.0.indicator_changed(frame);
        self.1.indicator_changed(frame);
        self.2.indicator_changed(frame);
    }
}

/// Network page sink: publishes each metrics snapshot for another context
impl StationSink for &SharedSnapshot {
    fn metrics_updated(&mut self, snapshot: &StationSnapshot) {
        self.publish(*snapshot);
    }
}

pub struct Station<S> {
    config: StationConfig,
    scheduler: Scheduler<StationTask, TASK_COUNT>,
    sensor: S,
    indicator: Indicator,
    state: StationState,
}

impl<S: EnvironmentSensor> Station<S> {
    /// Validate `config`, bring the sensor up and register the three tasks.
    ///
    /// Every task fires on the first poll.
    pub fn new(config: StationConfig, mut sensor: S) -> Result<Self, StationError> {
        config.validate().inspect_err(|e| {
            error!("Rejected station configuration: {}", e);
        })?;

        sensor.init().inspect_err(|e| {
            error!("Sensor failed to initialize: {}", e);
        })?;

        let mut scheduler = Scheduler::new();
        scheduler.register(StationTask::Clock, config.periods.clock, FirstFire::Immediate)?;
        scheduler.register(StationTask::Sample, config.periods.sample, FirstFire::Immediate)?;
        scheduler.register(StationTask::Chart, config.periods.chart, FirstFire::Immediate)?;

        let indicator = Indicator::new(&config.indicator);
        let state = StationState {
            metrics: None,
            charts: ChartSet::new(config.history.capacity),
            forecast: ForecastEngine::new(&config.forecast),
            indicator: IndicatorFrame::dark(indicator.segments()),
            time: TimeOfDay::default(),
            connectivity: Connectivity::Offline,
            wall_clock_offset: None,
            health: SensorHealth::default(),
            last_poll: 0,
        };

        info!(
            "Station started: clock {}ms, sample {}ms, chart {}ms, {} chart points",
            config.periods.clock,
            config.periods.sample,
            config.periods.chart,
            config.history.capacity
        );

        Ok(Self {
            config,
            scheduler,
            sensor,
            indicator,
            state,
        })
    }

    /// Run every task due at `now`, then refresh the indicator.
    pub fn poll<K: StationSink>(&mut self, now: Ticks, mut sink: K) -> PollSummary {
        self.state.last_poll = now;
        let mut summary = PollSummary {
            fired: self.scheduler.poll(now),
            ..PollSummary::default()
        };

        for task in summary.fired.clone() {
            match task {
                StationTask::Clock => self.run_clock(now, &mut sink),
                StationTask::Sample => {
                    if let Err(e) = self.run_sample(now, &mut sink) {
                        summary.sensor_error = Some(e);
                    }
                }
                StationTask::Chart => self.run_chart(&mut sink),
            }
        }

        summary.indicator_changed = self.refresh_indicator(now, &mut sink);
        summary
    }

    fn run_clock<K: StationSink>(&mut self, now: Ticks, sink: &mut K) {
        self.state.time = TimeOfDay::from_ticks(now, self.state.wall_clock_offset);
        sink.clock_tick(self.state.time);
    }

    fn run_sample<K: StationSink>(&mut self, now: Ticks, sink: &mut K) -> Result<(), SensorError> {
        let was_stale = self.is_stale();

        let sample = self
            .sensor
            .read_sample(now)
            .and_then(|sample| sample.validate().map(|()| sample));

        let sample = match sample {
            Ok(sample) => sample,
            Err(e) => {
                self.state.health.record_failure();
                warn!(
                    "Sensor read failed ({} in a row): {}",
                    self.state.health.consecutive_failures, e
                );

                if !was_stale && self.is_stale() {
                    warn!("Metrics are stale, showing last known good values");
                    sink.metrics_updated(&self.snapshot());
                }
                return Err(e);
            }
        };

        let derived = metrics::derive(&sample, &self.config.air_quality);
        let trend = self.state.forecast.update(derived.pressure_hpa);
        self.state.metrics = Some(derived);
        self.state.health.record_success(now);

        debug!(
            "Sampled {:.1}C {:.1}% {:.1}hPa {:.1}kOhm -> AQ {}%, trend {}",
            derived.temperature_c,
            derived.humidity_pct,
            derived.pressure_hpa,
            derived.gas_resistance_kohm,
            derived.air_quality_percent,
            trend.label()
        );

        if was_stale {
            info!("Sensor recovered");
        }

        sink.metrics_updated(&self.snapshot());
        Ok(())
    }

    fn run_chart<K: StationSink>(&mut self, sink: &mut K) {
        if self.state.metrics.is_none() {
            debug!("No metrics yet, pushing chart gap");
        }
        self.state.charts.push_metrics(self.state.metrics.as_ref());

        for channel in ChartChannel::ALL {
            sink.chart_updated(&self.state.charts.snapshot(channel));
        }
    }

    fn refresh_indicator<K: StationSink>(&mut self, now: Ticks, sink: &mut K) -> bool {
        let percent = self.state.metrics.map(|m| m.air_quality_percent);
        let frame = self.indicator.evaluate(percent, now);
        if frame == self.state.indicator {
            return false;
        }

        self.state.indicator = frame;
        sink.indicator_changed(frame);
        true
    }

    fn is_stale(&self) -> bool {
        self.state
            .health
            .is_stale(self.config.health.stale_after_failures)
    }

    /// Copy of everything a renderer needs, as of the last poll
    pub fn snapshot(&self) -> StationSnapshot {
        let state = &self.state;
        StationSnapshot {
            taken_at: state.last_poll,
            metrics: state.metrics,
            air_quality: state.metrics.map(|m| m.air_quality_level()),
            trend: state.forecast.trend(),
            pressure_baseline_hpa: state.forecast.baseline(),
            indicator: state.indicator,
            time: state.time,
            connectivity: state.connectivity,
            health: state.health,
            stale: self.is_stale(),
        }
    }

    pub fn chart(&self, channel: ChartChannel) -> ChartSnapshot {
        self.state.charts.snapshot(channel)
    }

    pub fn state(&self) -> &StationState {
        &self.state
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Record the outcome of network association. Display only.
    pub fn set_connectivity(&mut self, connectivity: Connectivity) {
        if self.state.connectivity != connectivity {
            info!(
                "Connectivity {} -> {}",
                self.state.connectivity.label(),
                connectivity.label()
            );
            self.state.connectivity = connectivity;
        }
    }

    /// Wall-clock milliseconds corresponding to tick zero, once time is synced
    pub fn set_wall_clock_offset(&mut self, offset: u64) {
        info!("Wall clock synchronized");
        self.state.wall_clock_offset = Some(offset);
        self.state.time = TimeOfDay::from_ticks(self.state.last_poll, Some(offset));
    }

    /// Change a task period at run time. Measured from the task's last fire.
    pub fn set_period(&mut self, task: StationTask, period: Ticks) -> bool {
        if period == 0 {
            warn!("Ignoring zero period for {:?}", task);
            return false;
        }
        self.scheduler.reschedule(task, period)
    }

    pub fn period_of(&self, task: StationTask) -> Option<Ticks> {
        self.scheduler.period_of(task)
    }
}
