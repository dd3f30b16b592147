//! # CIRC Core Library
//!
//! Core business logic for the CIRC focus timer. The timer engine is a
//! pure state machine driven by an injected clock; all side effects
//! (persistence, alarms, wake-holds, notifications) happen in the
//! service layer, which serializes every transition through a single
//! actor task. Presentation layers (the CLI binary, any future GUI)
//! observe the engine through a watch channel and never touch its
//! state directly.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: countdown state machine with midnight-split
//!   session accounting
//! - [`TimerService`]: tokio actor hosting the engine, tick loop and
//!   alarm callback
//! - [`Database`]: SQLite session storage with upsert semantics
//! - [`Config`]: TOML application configuration

pub mod clock;
pub mod error;
pub mod events;
pub mod notify;
pub mod stats;
pub mod storage;
pub mod timer;
pub mod transfer;

pub use clock::{Clock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, TransferError};
pub use events::Event;
pub use notify::{NullNotifier, Notifier};
pub use storage::{Config, Database, SessionStore};
pub use timer::{
    split_session, AlarmScheduler, CompletedSession, Mode, PersistedTimer, TimerEngine,
    TimerHandle, TimerService, TimerView, TokioAlarm,
};
