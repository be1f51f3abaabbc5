//! Segment bar indicator mapping
//!
//! The physical bar has K segments. Normally the number of lit segments grows
//! with the air-quality percentage. Above the alarm threshold the whole bar
//! blinks instead, half a blink period off then half on. The mode is
//! re-evaluated on every poll with no hysteresis, so readings hovering at the
//! threshold switch modes as often as they cross it.

use serde::Serialize;

use crate::clock::Ticks;
use crate::config::IndicatorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IndicatorMode {
    /// Lit segments proportional to the percentage
    Proportional,
    /// Whole bar blinking, proportional display suppressed
    AlarmBlink,
}

/// What the indicator hardware should show right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndicatorFrame {
    pub mode: IndicatorMode,
    /// Number of lit segments, counted from segment 0
    pub lit: u8,
    /// Total segments on the bar
    pub segments: u8,
}

impl IndicatorFrame {
    pub const fn dark(segments: u8) -> Self {
        Self {
            mode: IndicatorMode::Proportional,
            lit: 0,
            segments,
        }
    }

    pub fn is_lit(&self, index: u8) -> bool {
        index < self.lit
    }

    /// Bit `i` set when segment `i` is lit
    pub fn mask(&self) -> u16 {
        if self.lit >= 16 {
            u16::MAX
        } else {
            (1u16 << self.lit) - 1
        }
    }
}

/// Segments lit for `percent` on a bar of `segments`:
/// `floor(percent * (K + 1) / 100)`, capped at K.
pub fn active_segments(percent: u8, segments: u8) -> u8 {
    let active = u32::from(percent) * (u32::from(segments) + 1) / 100;
    active.min(u32::from(segments)) as u8
}

#[derive(Debug, Clone, Copy)]
pub struct Indicator {
    segments: u8,
    alarm_percent: u8,
    blink_period: Ticks,
}

impl Indicator {
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            segments: config.segments,
            alarm_percent: config.alarm_percent,
            blink_period: config.blink_period.max(2),
        }
    }

    pub fn segments(&self) -> u8 {
        self.segments
    }

    /// Frame for the given percentage at time `now`. `None` means no
    /// metrics have been derived yet and the bar stays dark.
    pub fn evaluate(&self, percent: Option<u8>, now: Ticks) -> IndicatorFrame {
        let Some(percent) = percent else {
            return IndicatorFrame::dark(self.segments);
        };

        if percent > self.alarm_percent {
            let phase = now % self.blink_period;
            let on = phase >= self.blink_period / 2;
            return IndicatorFrame {
                mode: IndicatorMode::AlarmBlink,
                lit: if on { self.segments } else { 0 },
                segments: self.segments,
            };
        }

        IndicatorFrame {
            mode: IndicatorMode::Proportional,
            lit: active_segments(percent, self.segments),
            segments: self.segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn indicator() -> Indicator {
        Indicator::new(&IndicatorConfig::default())
    }

    #[test]
    fn test_proportional_mapping() {
        assert_eq!(active_segments(0, 8), 0);
        assert_eq!(active_segments(50, 8), 4);
        assert_eq!(active_segments(90, 8), 8);
        assert_eq!(active_segments(100, 8), 8);
        assert_eq!(active_segments(11, 8), 0);
        assert_eq!(active_segments(12, 8), 1);
    }

    #[test]
    fn test_alarm_blinks_off_then_on() {
        let ind = indicator();
        let off = ind.evaluate(Some(91), 0);
        assert_eq!(off.mode, IndicatorMode::AlarmBlink);
        assert_eq!(off.lit, 0);

        let still_off = ind.evaluate(Some(91), 199);
        assert_eq!(still_off.lit, 0);

        let on = ind.evaluate(Some(91), 200);
        assert_eq!(on.lit, 8);
        assert_eq!(on.mask(), 0xFF);

        let wrapped = ind.evaluate(Some(100), 400);
        assert_eq!(wrapped.lit, 0);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let ind = indicator();
        let frame = ind.evaluate(Some(90), 300);
        assert_eq!(frame.mode, IndicatorMode::Proportional);
        assert_eq!(frame.lit, 8);
    }

    #[test]
    fn test_no_metrics_is_dark() {
        let frame = indicator().evaluate(None, 1234);
        assert_eq!(frame, IndicatorFrame::dark(8));
        assert_eq!(frame.mask(), 0);
    }

    #[test]
    fn test_alarm_independent_of_proportional_value() {
        let ind = indicator();
        for percent in 91..=100 {
            let frame = ind.evaluate(Some(percent), 250);
            assert_eq!(frame.mode, IndicatorMode::AlarmBlink);
            assert_eq!(frame.lit, 8);
        }
    }

    #[test]
    fn test_mask_and_is_lit() {
        let frame = IndicatorFrame {
            mode: IndicatorMode::Proportional,
            lit: 3,
            segments: 8,
        };
        assert_eq!(frame.mask(), 0b111);
        assert!(frame.is_lit(2));
        assert!(!frame.is_lit(3));

        let full = IndicatorFrame {
            mode: IndicatorMode::Proportional,
            lit: 16,
            segments: 16,
        };
        assert_eq!(full.mask(), u16::MAX);
    }

    proptest! {
        #[test]
        fn prop_at_or_below_alarm_is_proportional(percent in 0u8..=90, now in any::<u64>()) {
            let frame = indicator().evaluate(Some(percent), now);
            prop_assert_eq!(frame.mode, IndicatorMode::Proportional);
            prop_assert_eq!(frame.lit, active_segments(percent, 8));
        }
    }
}
