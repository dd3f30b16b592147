//! Desktop notification presenter.
//!
//! Ongoing progress stays quiet on the desktop (the terminal shows the
//! countdown); the completion alert raises a real notification with
//! critical urgency so it surfaces over other windows.

use circ_core::timer::Mode;
use circ_core::Notifier;
use notify_rust::{Notification, Urgency};
use tracing::debug;

pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn progress(&mut self, _mode: Mode, _remaining_secs: u64) {}

    fn completed(&mut self, mode: Mode) {
        let title = match mode {
            Mode::Work => "FOCUS SESSION DONE",
            Mode::Break => "BREAK OVER",
        };
        let result = Notification::new()
            .summary(title)
            .body("Your session is complete.")
            .urgency(Urgency::Critical)
            .show();
        if let Err(e) = result {
            debug!("desktop notification failed: {e}");
        }
    }
}
