mod alarm;
mod engine;
mod service;
mod session;
mod wake;

pub use alarm::{AlarmScheduler, NoopAlarm, TokioAlarm};
pub use engine::{PersistedTimer, TimerEngine, WAKE_HOLD_MARGIN_SECS};
pub use service::{AlarmMode, TimerCommand, TimerHandle, TimerService, TimerView, ENGINE_KEY};
pub use session::{split_session, CompletedSession, Mode};
pub use wake::{CountingWakeSource, SystemWakeSource, WakeGuard, WakeSource};
