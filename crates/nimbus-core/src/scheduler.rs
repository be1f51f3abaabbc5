//! Cooperative fixed-period task scheduler
//!
//! The scheduler never runs anything itself. Each [`Scheduler::poll`] returns
//! the tasks that are due, in registration order, and the caller dispatches
//! them. A due task fires once per poll no matter how far behind it is, and
//! its last-fire time becomes `now` rather than advancing by one period, so a
//! stalled loop does not produce a burst of catch-up fires.

use heapless::Vec;
use log::debug;

use crate::clock::Ticks;
use crate::error::SchedulerError;

/// When a newly registered task fires for the first time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstFire {
    /// On the very next poll
    Immediate,
    /// One full period after the given start time
    After(Ticks),
}

#[derive(Debug, Clone, Copy)]
struct TaskSlot<T> {
    task: T,
    period: Ticks,
    last_fire: Option<Ticks>,
}

impl<T> TaskSlot<T> {
    fn is_due(&self, now: Ticks) -> bool {
        match self.last_fire {
            None => true,
            Some(last) => now.wrapping_sub(last) >= self.period,
        }
    }
}

/// Table of up to `N` periodic tasks identified by `T`
#[derive(Debug)]
pub struct Scheduler<T, const N: usize> {
    tasks: Vec<TaskSlot<T>, N>,
}

impl<T, const N: usize> Default for Scheduler<T, N>
where
    T: Copy + PartialEq + core::fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Scheduler<T, N>
where
    T: Copy + PartialEq + core::fmt::Debug,
{
    pub const fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    /// Add a task. Fire order within a poll is registration order.
    pub fn register(
        &mut self,
        task: T,
        period: Ticks,
        first: FirstFire,
    ) -> Result<(), SchedulerError> {
        let last_fire = match first {
            FirstFire::Immediate => None,
            FirstFire::After(start) => Some(start),
        };

        self.tasks
            .push(TaskSlot {
                task,
                period,
                last_fire,
            })
            .map_err(|_| SchedulerError::Full { capacity: N })
    }

    /// Return every due task and mark it fired at `now`.
    pub fn poll(&mut self, now: Ticks) -> Vec<T, N> {
        let mut due = Vec::new();
        for slot in self.tasks.iter_mut() {
            if slot.is_due(now) {
                slot.last_fire = Some(now);
                debug!("task {:?} due at {}", slot.task, now);
                // Cannot overflow: `due` has the same capacity as the table
                let _ = due.push(slot.task);
            }
        }
        due
    }

    /// Change a task's period. The last-fire time is kept, so the new period
    /// is measured from the previous fire. Returns false for unknown tasks.
    pub fn reschedule(&mut self, task: T, period: Ticks) -> bool {
        match self.tasks.iter_mut().find(|slot| slot.task == task) {
            Some(slot) => {
                slot.period = period;
                true
            }
            None => false,
        }
    }

    pub fn period_of(&self, task: T) -> Option<Ticks> {
        self.slot(task).map(|slot| slot.period)
    }

    /// Last time `task` fired; `None` if unknown or never fired.
    pub fn last_fire_of(&self, task: T) -> Option<Ticks> {
        self.slot(task).and_then(|slot| slot.last_fire)
    }

    /// Ticks until `task` is next due, zero if already due.
    pub fn time_until_due(&self, task: T, now: Ticks) -> Option<Ticks> {
        self.slot(task).map(|slot| match slot.last_fire {
            None => 0,
            Some(last) => slot.period.saturating_sub(now.wrapping_sub(last)),
        })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn slot(&self, task: T) -> Option<&TaskSlot<T>> {
        self.tasks.iter().find(|slot| slot.task == task)
    }
}
