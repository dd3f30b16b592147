//! Redundant wall-clock alarm.
//!
//! The tick loop is sufficient while the process is alive and awake;
//! the alarm provides a second wake signal targeted at the wall-clock
//! deadline so completion still runs close to the true end instant if
//! the process was suspended. At most one trigger is outstanding; each
//! `schedule` supersedes the previous one.

use std::sync::Arc;

use chrono::{DateTime, Local, Timelike};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::service::TimerCommand;
use crate::clock::Clock;

pub trait AlarmScheduler: Send {
    /// Replace any pending trigger with a one-shot at `at`.
    fn schedule(&mut self, at: DateTime<Local>);

    /// Remove the pending trigger. Idempotent.
    fn cancel(&mut self);
}

/// Tokio-backed alarm feeding `AlarmFired` into the service channel.
///
/// The delay is computed from the same [`Clock`] the engine counts
/// with, so a substituted clock drives this path too.
pub struct TokioAlarm {
    tx: mpsc::Sender<TimerCommand>,
    clock: Arc<dyn Clock>,
    pending: Option<JoinHandle<()>>,
    exact: bool,
}

impl TokioAlarm {
    pub fn new(tx: mpsc::Sender<TimerCommand>, clock: Arc<dyn Clock>, exact: bool) -> Self {
        Self {
            tx,
            clock,
            pending: None,
            exact,
        }
    }
}

impl AlarmScheduler for TokioAlarm {
    fn schedule(&mut self, at: DateTime<Local>) {
        self.cancel();

        // Without exact scheduling the trigger degrades to the next
        // whole minute. Approximate completion, not an error.
        let target = if self.exact {
            at
        } else {
            let aligned = align_up_to_minute(at);
            debug!(%at, %aligned, "exact alarm unavailable, degrading to minute alignment");
            aligned
        };

        let delay = (target - self.clock.wall())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        let tx = self.tx.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(TimerCommand::AlarmFired).await;
        }));
    }

    fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for TokioAlarm {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn align_up_to_minute(at: DateTime<Local>) -> DateTime<Local> {
    if at.second() == 0 && at.nanosecond() == 0 {
        return at;
    }
    let truncated = at
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at);
    truncated + chrono::Duration::minutes(1)
}

/// No alarm at all; the tick loop alone drives completion. Used in
/// tests where wall-clock sleeps are meaningless.
pub struct NoopAlarm;

impl AlarmScheduler for NoopAlarm {
    fn schedule(&mut self, _at: DateTime<Local>) {}
    fn cancel(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn minute_alignment_rounds_up() {
        let at = Local.with_ymd_and_hms(2026, 3, 10, 10, 29, 40).unwrap();
        let aligned = align_up_to_minute(at);
        assert_eq!(
            aligned,
            Local.with_ymd_and_hms(2026, 3, 10, 10, 30, 0).unwrap()
        );
    }

    #[test]
    fn minute_alignment_keeps_exact_boundaries() {
        let at = Local.with_ymd_and_hms(2026, 3, 10, 10, 30, 0).unwrap();
        assert_eq!(align_up_to_minute(at), at);
    }
}
