//! Rolling chart history
//!
//! A [`HistoryBuffer`] always holds exactly `capacity` slots, oldest first.
//! Slots that have never been written are absent rather than zero, so a real
//! 0 °C reading is charted like any other value.
//!
//! Pushing overwrites the oldest slot in place (ring buffer, O(1)); iteration
//! order is render order, oldest on the left and newest on the right.

use alloc::vec;
use alloc::vec::Vec;

use serde::Serialize;

use crate::metrics::DerivedMetrics;

/// Spans narrower than this are widened to a fixed window
pub const MIN_SPAN: f32 = 1.0;

/// Half-width of the forced window around the midpoint
pub const FORCED_HALF_WIDTH: f32 = 1.0;

/// Padding added above and below a wide enough span
pub const RANGE_PADDING: f32 = 0.2;

/// Vertical scale of a chart
///
/// Always has a strictly positive width, so mapping values to coordinates
/// never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartRange {
    pub min: f32,
    pub max: f32,
}

impl ChartRange {
    pub fn width(&self) -> f32 {
        self.max - self.min
    }

    pub fn midpoint(&self) -> f32 {
        self.min + self.width() / 2.0
    }

    /// Position of `value` within the range, 0.0 at `min` and 1.0 at `max`.
    /// Values outside the range are clamped.
    pub fn normalize(&self, value: f32) -> f32 {
        ((value - self.min) / self.width()).clamp(0.0, 1.0)
    }

    /// Map `value` to a screen row inside a plot area starting at `top`.
    ///
    /// Screen Y grows downward, so `max` lands on `top` and `min` on the last
    /// row of the area.
    pub fn to_pixel_y(&self, value: f32, top: i32, height: u32) -> i32 {
        let rows = height.saturating_sub(1) as f32;
        top + libm::roundf((1.0 - self.normalize(value)) * rows) as i32
    }

    fn forced_around(mid: f32) -> Self {
        // Keep the window representable for very large magnitudes
        let half = FORCED_HALF_WIDTH.max(libm::fabsf(mid) * f32::EPSILON * 2.0);
        Self {
            min: mid - half,
            max: mid + half,
        }
    }
}

/// Fixed-capacity FIFO of chart values
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    slots: Vec<Option<f32>>,
    /// Index of the oldest slot, which is also the next one overwritten
    head: usize,
}

impl HistoryBuffer {
    /// Create a buffer with `capacity` absent slots. A zero capacity is
    /// raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            head: 0,
        }
    }

    /// Number of slots. Constant for the lifetime of the buffer.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; the buffer has at least one slot.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append `value` at the newest end and drop the oldest slot.
    /// Non-finite values are stored as a gap.
    pub fn push(&mut self, value: f32) {
        let slot = value.is_finite().then_some(value);
        self.push_slot(slot);
    }

    /// Append an absent slot, used when there is no data for this period.
    pub fn push_gap(&mut self) {
        self.push_slot(None);
    }

    fn push_slot(&mut self, slot: Option<f32>) {
        self.slots[self.head] = slot;
        self.head = (self.head + 1) % self.slots.len();
    }

    /// Slots oldest → newest.
    pub fn iter(&self) -> impl Iterator<Item = Option<f32>> + '_ {
        let cap = self.slots.len();
        (0..cap).map(move |i| self.slots[(self.head + i) % cap])
    }

    /// Slot at render position `index` (0 = oldest).
    pub fn get(&self, index: usize) -> Option<Option<f32>> {
        let cap = self.slots.len();
        (index < cap).then(|| self.slots[(self.head + index) % cap])
    }

    /// Most recent slot's value, if present.
    pub fn latest(&self) -> Option<f32> {
        let cap = self.slots.len();
        self.slots[(self.head + cap - 1) % cap]
    }

    /// Number of slots holding a value
    pub fn present_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Min/max across present slots, if any.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.slots.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Auto-ranged vertical scale for charting.
    ///
    /// With no data, or a span below [`MIN_SPAN`], the range is a fixed
    /// ±[`FORCED_HALF_WIDTH`] window around the midpoint (0 when empty).
    /// Otherwise it is the data span padded by [`RANGE_PADDING`] each side.
    pub fn range(&self) -> ChartRange {
        match self.min_max() {
            None => ChartRange::forced_around(0.0),
            Some((lo, hi)) if hi - lo < MIN_SPAN => ChartRange::forced_around(lo + (hi - lo) / 2.0),
            Some((lo, hi)) => ChartRange {
                min: lo - RANGE_PADDING,
                max: hi + RANGE_PADDING,
            },
        }
    }

    /// Copy the slots out in render order.
    pub fn to_vec(&self) -> Vec<Option<f32>> {
        self.iter().collect()
    }
}

/// Quantity a chart plots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartChannel {
    Temperature,
    Humidity,
    Pressure,
    AirQuality,
}

impl ChartChannel {
    pub const ALL: [ChartChannel; 4] = [
        Self::Temperature,
        Self::Humidity,
        Self::Pressure,
        Self::AirQuality,
    ];

    pub const fn index(self) -> usize {
        match self {
            Self::Temperature => 0,
            Self::Humidity => 1,
            Self::Pressure => 2,
            Self::AirQuality => 3,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Temperature => "Temperature",
            Self::Humidity => "Humidity",
            Self::Pressure => "Pressure",
            Self::AirQuality => "Air quality",
        }
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "C",
            Self::Humidity => "%",
            Self::Pressure => "hPa",
            Self::AirQuality => "%",
        }
    }

    /// Cycle to the next channel, wrapping around.
    pub const fn next(self) -> Self {
        match self {
            Self::Temperature => Self::Humidity,
            Self::Humidity => Self::Pressure,
            Self::Pressure => Self::AirQuality,
            Self::AirQuality => Self::Temperature,
        }
    }

    pub fn value(self, metrics: &DerivedMetrics) -> f32 {
        match self {
            Self::Temperature => metrics.temperature_c,
            Self::Humidity => metrics.humidity_pct,
            Self::Pressure => metrics.pressure_hpa,
            Self::AirQuality => metrics.air_quality_percent as f32,
        }
    }
}

/// Copy-out view of one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSnapshot {
    pub channel: ChartChannel,
    /// Slots oldest → newest
    pub values: Vec<Option<f32>>,
    pub range: ChartRange,
}

/// One history buffer per chart channel
#[derive(Debug, Clone)]
pub struct ChartSet {
    buffers: [HistoryBuffer; 4],
}

impl ChartSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: core::array::from_fn(|_| HistoryBuffer::new(capacity)),
        }
    }

    /// Push the current metrics into every channel, or a gap into each when
    /// nothing has been sampled yet.
    pub fn push_metrics(&mut self, metrics: Option<&DerivedMetrics>) {
        for channel in ChartChannel::ALL {
            let buffer = &mut self.buffers[channel.index()];
            match metrics {
                Some(m) => buffer.push(channel.value(m)),
                None => buffer.push_gap(),
            }
        }
    }

    pub fn get(&self, channel: ChartChannel) -> &HistoryBuffer {
        &self.buffers[channel.index()]
    }

    pub fn snapshot(&self, channel: ChartChannel) -> ChartSnapshot {
        let buffer = self.get(channel);
        ChartSnapshot {
            channel,
            values: buffer.to_vec(),
            range: buffer.range(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f32, b: f32) -> bool {
        libm::fabsf(a - b) < 1e-4
    }

    #[test]
    fn test_new_buffer_is_all_absent() {
        let buf = HistoryBuffer::new(40);
        assert_eq!(buf.len(), 40);
        assert_eq!(buf.present_count(), 0);
        assert!(buf.iter().all(|s| s.is_none()));
        assert_eq!(buf.latest(), None);
    }

    #[test]
    fn test_push_is_fifo_in_render_order() {
        let mut buf = HistoryBuffer::new(3);
        buf.push(1.0);
        assert_eq!(buf.to_vec(), vec![None, None, Some(1.0)]);
        buf.push(2.0);
        buf.push(3.0);
        buf.push(4.0);
        assert_eq!(buf.to_vec(), vec![Some(2.0), Some(3.0), Some(4.0)]);
        assert_eq!(buf.latest(), Some(4.0));
        assert_eq!(buf.get(0), Some(Some(2.0)));
        assert_eq!(buf.get(3), None);
    }

    #[test]
    fn test_zero_reading_is_data_not_sentinel() {
        let mut buf = HistoryBuffer::new(4);
        buf.push(0.0);
        assert_eq!(buf.present_count(), 1);
        assert_eq!(buf.min_max(), Some((0.0, 0.0)));
    }

    #[test]
    fn test_non_finite_push_becomes_gap() {
        let mut buf = HistoryBuffer::new(2);
        buf.push(f32::NAN);
        assert_eq!(buf.present_count(), 0);
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_range_empty_is_forced_window() {
        let range = HistoryBuffer::new(5).range();
        assert_eq!(range, ChartRange { min: -1.0, max: 1.0 });
    }

    #[test]
    fn test_range_flat_data_is_centered() {
        let mut buf = HistoryBuffer::new(5);
        buf.push(20.0);
        buf.push(20.5);
        let range = buf.range();
        assert!(approx(range.min, 19.25));
        assert!(approx(range.max, 21.25));
    }

    #[test]
    fn test_range_wide_data_is_padded() {
        let mut buf = HistoryBuffer::new(5);
        buf.push(10.0);
        buf.push_gap();
        buf.push(15.0);
        let range = buf.range();
        assert!(approx(range.min, 9.8));
        assert!(approx(range.max, 15.2));
    }

    #[test]
    fn test_pixel_mapping() {
        let range = ChartRange { min: 0.0, max: 10.0 };
        assert_eq!(range.to_pixel_y(10.0, 20, 101), 20);
        assert_eq!(range.to_pixel_y(0.0, 20, 101), 120);
        assert_eq!(range.to_pixel_y(5.0, 20, 101), 70);
        // Out-of-range values clamp to the plot edges
        assert_eq!(range.to_pixel_y(50.0, 20, 101), 20);
    }

    #[test]
    fn test_chart_set_pushes_each_channel() {
        let metrics = DerivedMetrics {
            temperature_c: 21.0,
            humidity_pct: 40.0,
            pressure_hpa: 1012.0,
            gas_resistance_kohm: 90.0,
            air_quality_percent: 41,
            sampled_at: 0,
        };
        let mut set = ChartSet::new(3);
        set.push_metrics(None);
        set.push_metrics(Some(&metrics));

        let pressure = set.snapshot(ChartChannel::Pressure);
        assert_eq!(pressure.values, vec![None, None, Some(1012.0)]);
        assert_eq!(set.get(ChartChannel::AirQuality).latest(), Some(41.0));
        assert_eq!(set.get(ChartChannel::Humidity).len(), 3);
    }

    proptest! {
        #[test]
        fn prop_length_is_constant(cap in 1usize..64, values in proptest::collection::vec(-100.0f32..100.0, 0..200)) {
            let mut buf = HistoryBuffer::new(cap);
            for v in values {
                buf.push(v);
                prop_assert_eq!(buf.len(), cap);
                prop_assert_eq!(buf.iter().count(), cap);
            }
        }

        #[test]
        fn prop_range_never_degenerate(values in proptest::collection::vec(proptest::option::of(-1000.0f32..1000.0), 0..60)) {
            let mut buf = HistoryBuffer::new(40);
            for v in values {
                match v {
                    Some(v) => buf.push(v),
                    None => buf.push_gap(),
                }
            }
            let range = buf.range();
            prop_assert!(range.width() > 0.0);
            match buf.min_max() {
                Some((lo, hi)) if hi - lo >= MIN_SPAN => prop_assert!(range.width() >= 0.4),
                _ => prop_assert!(range.width() >= 2.0 - 1e-3),
            }
        }
    }
}
