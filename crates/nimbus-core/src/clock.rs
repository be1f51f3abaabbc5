//! Monotonic time source and time-of-day formatting
//!
//! The station measures everything in [`Ticks`]: milliseconds of monotonic
//! time since boot. Period and elapsed comparisons are always done in ticks
//! with wrapping subtraction, so a wrapped counter still yields the right
//! elapsed value.

use core::cell::Cell;
use core::fmt;

use serde::Serialize;

/// Milliseconds of monotonic time
pub type Ticks = u64;

/// Ticks per second
pub const TICKS_PER_SECOND: Ticks = 1000;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Monotonic elapsed-time provider
pub trait Clock {
    /// Current monotonic time in ticks
    fn now(&self) -> Ticks;
}

/// Clock advanced by hand, for tests and the simulator
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Ticks>,
}

impl ManualClock {
    pub const fn new(start: Ticks) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: Ticks) {
        self.now.set(now);
    }

    /// Move the clock forward, wrapping at the counter width.
    pub fn advance(&self, delta: Ticks) {
        self.now.set(self.now.get().wrapping_add(delta));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Ticks {
        self.now.get()
    }
}

/// Clock backed by the embassy time driver
#[cfg(feature = "embassy")]
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyClock;

#[cfg(feature = "embassy")]
impl Clock for EmbassyClock {
    fn now(&self) -> Ticks {
        embassy_time::Instant::now().as_millis()
    }
}

/// Hours, minutes and seconds shown by the clock task
///
/// Without a wall-clock offset this is uptime folded into a 24 hour day.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeOfDay {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    /// True when derived from a synchronised wall clock rather than uptime
    pub synchronized: bool,
}

impl TimeOfDay {
    /// Compute the time of day for `now`.
    ///
    /// `wall_clock_offset` is the wall-clock time in milliseconds (since
    /// midnight or epoch, only the day fraction matters) that corresponds to
    /// tick zero.
    pub fn from_ticks(now: Ticks, wall_clock_offset: Option<u64>) -> Self {
        let millis = now.wrapping_add(wall_clock_offset.unwrap_or(0));
        let secs_of_day = (millis / TICKS_PER_SECOND) % SECONDS_PER_DAY;

        Self {
            hours: (secs_of_day / 3600) as u8,
            minutes: ((secs_of_day / 60) % 60) as u8,
            seconds: (secs_of_day % 60) as u8,
            synchronized: wall_clock_offset.is_some(),
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_manual_clock_advances() {
        let clock = ManualClock::new(10);
        clock.advance(990);
        assert_eq!(clock.now(), 1000);
        clock.set(5);
        assert_eq!(clock.now(), 5);
    }

    #[test]
    fn test_manual_clock_wraps() {
        let clock = ManualClock::new(Ticks::MAX);
        clock.advance(2);
        assert_eq!(clock.now(), 1);
    }

    #[test]
    fn test_uptime_time_of_day() {
        let t = TimeOfDay::from_ticks(3_723_000, None);
        assert_eq!((t.hours, t.minutes, t.seconds), (1, 2, 3));
        assert!(!t.synchronized);
        assert_eq!(t.to_string(), "01:02:03");
    }

    #[test]
    fn test_wall_clock_offset_folds_into_day() {
        // 23:59:59 at tick zero, two seconds later it is 00:00:01
        let offset = (SECONDS_PER_DAY - 1) * TICKS_PER_SECOND;
        let t = TimeOfDay::from_ticks(2_000, Some(offset));
        assert_eq!((t.hours, t.minutes, t.seconds), (0, 0, 1));
        assert!(t.synchronized);
    }
}
