use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{CompletedSession, Mode};

/// Every engine transition produces an Event. The service layer turns
/// events into side effects (alarms, wake-holds, store writes,
/// notifications); presentation layers read them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: Mode,
        duration_secs: u64,
        /// Wall-clock instant the redundant alarm should target.
        alarm_at: DateTime<Local>,
        /// How long the wake-hold should be kept, countdown plus margin.
        wake_hold_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    ModeSwitched {
        mode: Mode,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        mode: Mode,
        /// Dated records to persist; empty for break completions and
        /// already midnight-split for work completions.
        sessions: Vec<CompletedSession>,
        at: DateTime<Utc>,
    },
}
