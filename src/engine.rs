//! Countdown engine with tick-state management and change detection.
//!
//! Provides [`CountdownEngine`] which holds a target instant, recomputes the
//! calendar duration to it on each tick, and queues one [`UnitChange`] per
//! field whose value differs from the last snapshot. Milliseconds are queued
//! on every recomputation so consumers can tell the countdown is live.

use heapless::Deque;

use crate::calendar::{compute_duration, CalendarDuration};
use crate::logging::{debug, trace};
use crate::time::{Instant, TickInterval, TimeSource};
use crate::types::{CountdownUnit, UnitChange};

/// Capacity of the pending change queue. Two full batches fit.
pub const CHANGE_QUEUE_CAPACITY: usize = 32;

/// State of the recurring tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickState {
    /// No tick scheduled. The snapshot is frozen until the next recomputation.
    Stopped,
    /// Recurring tick active at the retained interval.
    Running,
}

/// Scheduling instruction returned by engine operations.
///
/// Tells the host what to do with its recurring timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceTiming {
    /// (Re)arm the recurring tick with this cadence, replacing any pending one.
    Delay(TickInterval),

    /// Keep the current schedule as it is.
    Unchanged,

    /// Cancel the recurring tick. Nothing needs servicing until `play` or `start`.
    Idle,
}

/// Errors that can occur during engine operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EngineError {
    /// Operation called from an invalid state.
    InvalidState {
        /// Human-readable description of the expected state
        expected: &'static str,
        /// The actual current state
        actual: TickState,
    },
    /// Tick interval of zero milliseconds.
    InvalidInterval,
}

impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EngineError::InvalidState { expected, actual } => {
                write!(
                    f,
                    "invalid state: expected {}, but engine is {:?}",
                    expected, actual
                )
            }
            EngineError::InvalidInterval => {
                write!(f, "tick interval must be at least 1ms")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EngineError {}

/// Counts down to a target instant and reports which fields changed.
///
/// The engine never touches a display. Each recomputation appends change
/// notifications to an internal queue which the caller empties with
/// [`drain_changes`](Self::drain_changes). When the queue is full the oldest
/// notification is dropped.
///
/// # Type Parameters
/// * `'t` - Lifetime of the time source reference
/// * `T` - Time source implementation type
pub struct CountdownEngine<'t, T: TimeSource> {
    time_source: &'t T,
    target: Instant,
    now: Instant,
    snapshot: CalendarDuration,
    interval: TickInterval,
    state: TickState,
    changes: Deque<UnitChange, CHANGE_QUEUE_CAPACITY>,
}

impl<'t, T: TimeSource> CountdownEngine<'t, T> {
    /// Creates a stopped engine with the snapshot computed against the
    /// current time. No changes are queued yet.
    pub fn new(time_source: &'t T, target: Instant) -> Self {
        let now = time_source.now();

        Self {
            time_source,
            target,
            now,
            snapshot: compute_duration(now, target),
            interval: TickInterval::default(),
            state: TickState::Stopped,
            changes: Deque::new(),
        }
    }

    /// Queues every field, runs one tick and starts the recurring tick.
    ///
    /// Can be called from any state; a running engine is restarted with the
    /// new cadence.
    pub fn start(&mut self, interval: TickInterval) -> ServiceTiming {
        self.interval = interval;
        self.emit_all();
        self.tick();
        self.state = TickState::Running;

        debug!("countdown started at {}ms", interval.as_millis());
        ServiceTiming::Delay(interval)
    }

    /// Runs one tick: samples the clock, recomputes and queues changes.
    ///
    /// Must be called from `Running` state.
    pub fn service(&mut self) -> Result<ServiceTiming, EngineError> {
        if self.state != TickState::Running {
            return Err(EngineError::InvalidState {
                expected: "Running",
                actual: self.state,
            });
        }

        self.tick();
        Ok(ServiceTiming::Unchanged)
    }

    /// Stops the recurring tick, keeping the interval for [`play`](Self::play).
    ///
    /// Idempotent.
    pub fn pause(&mut self) -> ServiceTiming {
        if self.state == TickState::Running {
            debug!("countdown paused");
        }
        self.state = TickState::Stopped;
        ServiceTiming::Idle
    }

    /// Runs one tick and resumes the recurring tick at the retained interval.
    ///
    /// Returns `Unchanged` when already running.
    pub fn play(&mut self) -> ServiceTiming {
        match self.state {
            TickState::Running => ServiceTiming::Unchanged,
            TickState::Stopped => {
                self.tick();
                self.state = TickState::Running;
                debug!("countdown resumed at {}ms", self.interval.as_millis());
                ServiceTiming::Delay(self.interval)
            }
        }
    }

    /// Replaces the tick cadence and recomputes immediately.
    ///
    /// The tick state is left alone; a stopped engine stays stopped and only
    /// retains the new cadence.
    pub fn set_interval(&mut self, interval: TickInterval) -> ServiceTiming {
        self.interval = interval;
        self.tick();

        match self.state {
            TickState::Running => ServiceTiming::Delay(interval),
            TickState::Stopped => ServiceTiming::Idle,
        }
    }

    /// Like [`set_interval`](Self::set_interval) from raw milliseconds.
    pub fn set_interval_millis(&mut self, millis: u32) -> Result<ServiceTiming, EngineError> {
        let interval = TickInterval::from_millis(millis)?;
        Ok(self.set_interval(interval))
    }

    /// Replaces the target and recomputes against the last sampled "now".
    ///
    /// The clock is not read again; the next tick corrects the staleness.
    pub fn update_target(&mut self, target: Instant) {
        trace!("countdown target updated to {}", target.as_unix_millis());
        self.target = target;
        self.recompute();
    }

    /// Queues every field of the current snapshot regardless of change.
    pub fn emit_all(&mut self) {
        for unit in CountdownUnit::EMISSION_ORDER {
            self.push_change(UnitChange::new(unit, self.snapshot.get(unit)));
        }
    }

    /// Removes and yields queued changes, oldest first.
    pub fn drain_changes(&mut self) -> impl Iterator<Item = UnitChange> + '_ {
        core::iter::from_fn(move || self.changes.pop_front())
    }

    /// Number of queued changes.
    pub fn pending_changes(&self) -> usize {
        self.changes.len()
    }

    /// Returns the current tick state.
    pub fn get_state(&self) -> TickState {
        self.state
    }

    /// Returns true if the recurring tick is active.
    pub fn is_running(&self) -> bool {
        self.state == TickState::Running
    }

    /// Returns the retained tick cadence.
    pub fn interval(&self) -> TickInterval {
        self.interval
    }

    /// Returns the target instant.
    pub fn target(&self) -> Instant {
        self.target
    }

    /// Returns the instant the snapshot was last computed against.
    pub fn last_now(&self) -> Instant {
        self.now
    }

    /// Returns the last computed duration.
    pub fn snapshot(&self) -> &CalendarDuration {
        &self.snapshot
    }

    fn tick(&mut self) {
        self.now = self.time_source.now();
        self.recompute();
    }

    fn recompute(&mut self) {
        let next = compute_duration(self.now, self.target);

        for unit in CountdownUnit::EMISSION_ORDER {
            let value = next.get(unit);
            if unit == CountdownUnit::Milliseconds || value != self.snapshot.get(unit) {
                self.push_change(UnitChange::new(unit, value));
            }
        }

        self.snapshot = next;
    }

    fn push_change(&mut self, change: UnitChange) {
        if self.changes.is_full() {
            self.changes.pop_front();
        }
        // Cannot fail after making room.
        let _ = self.changes.push_back(change);
    }
}
