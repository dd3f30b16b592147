//! Notification presenter contract.
//!
//! The engine signals two distinct surfaces: the ongoing countdown
//! display (updated once per whole second while running) and the
//! completion alert. Presenters are pure sinks; the desktop
//! implementation lives in the CLI crate.

use std::sync::{Arc, Mutex};

use crate::timer::Mode;

pub trait Notifier: Send {
    /// Ongoing countdown display.
    fn progress(&mut self, mode: Mode, remaining_secs: u64);

    /// Completion alert, distinct from the progress surface. Must fire
    /// even when session persistence failed.
    fn completed(&mut self, mode: Mode);
}

/// Discards everything. Used when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn progress(&mut self, _mode: Mode, _remaining_secs: u64) {}
    fn completed(&mut self, _mode: Mode) {}
}

/// Test presenter recording every signal it receives.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    inner: Arc<Mutex<RecordedSignals>>,
}

#[derive(Default)]
struct RecordedSignals {
    progress: Vec<(Mode, u64)>,
    completed: Vec<Mode>,
}

impl RecordingNotifier {
    pub fn completions(&self) -> Vec<Mode> {
        self.inner.lock().unwrap().completed.clone()
    }

    pub fn progress_updates(&self) -> Vec<(Mode, u64)> {
        self.inner.lock().unwrap().progress.clone()
    }
}

impl Notifier for RecordingNotifier {
    fn progress(&mut self, mode: Mode, remaining_secs: u64) {
        self.inner.lock().unwrap().progress.push((mode, remaining_secs));
    }

    fn completed(&mut self, mode: Mode) {
        self.inner.lock().unwrap().completed.push(mode);
    }
}
