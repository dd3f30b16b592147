//! Clock source abstraction.
//!
//! The engine needs two independent readings: a monotonic elapsed
//! counter for all remaining-time arithmetic, and a wall-clock instant
//! for alarm targeting and dating completed sessions. Wall-clock deltas
//! are never used for countdown math because wall time can jump
//! (timezone changes, NTP corrections, user edits).

use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

/// Supplies monotonic and wall-clock time to the engine.
pub trait Clock: Send + Sync {
    /// Elapsed time since an arbitrary fixed origin. Never decreases.
    fn monotonic(&self) -> Duration;

    /// Calendar time. May jump discontinuously; only used for alarm
    /// targets and session timestamps.
    fn wall(&self) -> DateTime<Local>;
}

/// Real clock backed by `std::time::Instant` and `chrono::Local`.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn monotonic(&self) -> Duration {
        self.origin.elapsed()
    }

    fn wall(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Manually driven clock for tests. The two readings advance
/// independently so wall-jump immunity can be exercised.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: std::sync::Arc<std::sync::Mutex<ManualClockState>>,
}

#[derive(Debug)]
struct ManualClockState {
    monotonic: Duration,
    wall: DateTime<Local>,
}

impl ManualClock {
    pub fn new(wall: DateTime<Local>) -> Self {
        Self {
            inner: std::sync::Arc::new(std::sync::Mutex::new(ManualClockState {
                monotonic: Duration::ZERO,
                wall,
            })),
        }
    }

    /// Advance both readings together, as a real clock would.
    pub fn advance(&self, by: Duration) {
        let mut state = self.inner.lock().unwrap();
        state.monotonic += by;
        state.wall += chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
    }

    /// Jump only the wall clock, leaving the monotonic counter alone.
    pub fn jump_wall(&self, by: chrono::Duration) {
        let mut state = self.inner.lock().unwrap();
        state.wall += by;
    }
}

impl Clock for ManualClock {
    fn monotonic(&self) -> Duration {
        self.inner.lock().unwrap().monotonic
    }

    fn wall(&self) -> DateTime<Local> {
        self.inner.lock().unwrap().wall
    }
}
