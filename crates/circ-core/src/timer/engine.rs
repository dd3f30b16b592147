//! Timer engine implementation.
//!
//! The engine is a pure state machine over an injected [`Clock`]. It
//! performs no I/O and owns no threads -- the service layer calls
//! `tick()` periodically and applies the effects carried by the
//! returned events.
//!
//! All remaining-time arithmetic uses the monotonic reading. While
//! running, remaining time for the active mode is always derived from
//! `target_end - now`; the stored per-mode fields are only authoritative
//! while idle. Wall-clock jumps therefore cannot corrupt the countdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::session::{split_session, Mode};
use crate::clock::Clock;
use crate::events::Event;

/// Safety margin added to the wake-hold so scheduling jitter cannot
/// let the device suspend just before completion.
pub const WAKE_HOLD_MARGIN_SECS: u64 = 10;

/// State carried across process restarts. Only the frozen per-mode
/// remaining seconds survive; monotonic instants are meaningless in a
/// new process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedTimer {
    pub mode: Mode,
    pub remaining_work_secs: u64,
    pub remaining_break_secs: u64,
}

/// Core countdown state machine.
pub struct TimerEngine {
    clock: Arc<dyn Clock>,
    work_duration_secs: u64,
    break_duration_secs: u64,
    mode: Mode,
    running: bool,
    remaining_work_secs: u64,
    remaining_break_secs: u64,
    /// Monotonic instant the running countdown reaches zero.
    /// `Some` exactly while `running`.
    target_end: Option<Duration>,
}

impl TimerEngine {
    pub fn new(clock: Arc<dyn Clock>, work_minutes: u32, break_minutes: u32) -> Self {
        let work_duration_secs = u64::from(work_minutes) * 60;
        let break_duration_secs = u64::from(break_minutes) * 60;
        Self {
            clock,
            work_duration_secs,
            break_duration_secs,
            mode: Mode::Work,
            running: false,
            remaining_work_secs: work_duration_secs,
            remaining_break_secs: break_duration_secs,
            target_end: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn running(&self) -> bool {
        self.running
    }

    /// Remaining seconds for the active mode. Derived from the
    /// monotonic target while running, read from the frozen field
    /// while idle.
    pub fn remaining_secs(&self) -> u64 {
        match self.target_end {
            Some(target) if self.running => target
                .checked_sub(self.clock.monotonic())
                .map(|d| d.as_secs())
                .unwrap_or(0),
            _ => self.frozen_remaining(self.mode),
        }
    }

    /// The clock this engine was constructed with, shared with
    /// collaborators that schedule against the same time source.
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Frozen remaining seconds for rehydration across restarts.
    pub fn persist_state(&self) -> PersistedTimer {
        let mut state = PersistedTimer {
            mode: self.mode,
            remaining_work_secs: self.remaining_work_secs,
            remaining_break_secs: self.remaining_break_secs,
        };
        if self.running {
            match self.mode {
                Mode::Work => state.remaining_work_secs = self.remaining_secs(),
                Mode::Break => state.remaining_break_secs = self.remaining_secs(),
            }
        }
        state
    }

    /// Rehydrate a freshly constructed engine from a persisted state.
    /// Only valid while idle; the restored countdown resumes on the
    /// next `start()`.
    pub fn restore(&mut self, state: PersistedTimer) {
        if self.running {
            return;
        }
        self.mode = state.mode;
        self.remaining_work_secs = state.remaining_work_secs.min(self.work_duration_secs);
        self.remaining_break_secs = state.remaining_break_secs.min(self.break_duration_secs);
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin the countdown for the active mode. No-op while running.
    ///
    /// The monotonic target and the wall-clock alarm instant are
    /// computed at the same moment: the first drives the countdown, the
    /// second the redundant wake trigger.
    pub fn start(&mut self) -> Option<Event> {
        if self.running {
            return None;
        }
        let remaining = self.frozen_remaining(self.mode);
        self.running = true;
        self.target_end = Some(self.clock.monotonic() + Duration::from_secs(remaining));
        let alarm_at = self.clock.wall() + chrono::Duration::seconds(remaining as i64);
        Some(Event::TimerStarted {
            mode: self.mode,
            duration_secs: remaining,
            alarm_at,
            wake_hold_secs: remaining + WAKE_HOLD_MARGIN_SECS,
            at: Utc::now(),
        })
    }

    /// Freeze the active countdown. No-op while idle.
    pub fn pause(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        let remaining = self.remaining_secs();
        self.running = false;
        self.target_end = None;
        *self.frozen_remaining_mut(self.mode) = remaining;
        Some(Event::TimerPaused {
            mode: self.mode,
            remaining_secs: remaining,
            at: Utc::now(),
        })
    }

    pub fn toggle(&mut self) -> Option<Event> {
        if self.running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Pause semantics, then restore the active mode's full duration.
    pub fn reset(&mut self) -> Option<Event> {
        self.pause();
        *self.frozen_remaining_mut(self.mode) = self.full_duration(self.mode);
        Some(Event::TimerReset {
            mode: self.mode,
            remaining_secs: self.frozen_remaining(self.mode),
            at: Utc::now(),
        })
    }

    /// Swap the active mode. Rejected while running; each mode's
    /// remaining time is preserved independently.
    pub fn switch_mode(&mut self, target: Mode) -> Option<Event> {
        if self.running || self.mode == target {
            return None;
        }
        self.mode = target;
        Some(Event::ModeSwitched {
            mode: self.mode,
            remaining_secs: self.frozen_remaining(self.mode),
            at: Utc::now(),
        })
    }

    /// Periodic tick. Returns the completion event when the countdown
    /// reaches zero, `None` otherwise.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        if self.remaining_secs() == 0 {
            return Some(self.complete());
        }
        None
    }

    /// The redundant alarm fired at the wall-clock deadline. Treated as
    /// "tick reached zero": if the process slept past the target the
    /// countdown still completes now.
    pub fn alarm_fired(&mut self) -> Option<Event> {
        if !self.running {
            return None;
        }
        Some(self.complete())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self) -> Event {
        let mode = self.mode;
        self.running = false;
        self.target_end = None;
        *self.frozen_remaining_mut(mode) = self.full_duration(mode);

        // Work sessions are dated from their nominal start, `now - D`.
        // This is robust against pauses and midnight rollovers.
        let sessions = match mode {
            Mode::Work => split_session(
                self.clock.wall().naive_local(),
                (self.work_duration_secs / 60) as u32,
            ),
            Mode::Break => Vec::new(),
        };
        Event::TimerCompleted {
            mode,
            sessions,
            at: Utc::now(),
        }
    }

    fn full_duration(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Work => self.work_duration_secs,
            Mode::Break => self.break_duration_secs,
        }
    }

    fn frozen_remaining(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Work => self.remaining_work_secs,
            Mode::Break => self.remaining_break_secs,
        }
    }

    fn frozen_remaining_mut(&mut self, mode: Mode) -> &mut u64 {
        match mode {
            Mode::Work => &mut self.remaining_work_secs,
            Mode::Break => &mut self.remaining_break_secs,
        }
    }
}
