//! Single-writer timer service.
//!
//! A tokio actor task owns the engine. Every transition request --
//! user command, 500 ms tick, alarm callback -- arrives through one
//! mpsc channel and is applied in order, so a completion can never race
//! a user-initiated pause. Observers hold a watch receiver; the service
//! keeps running and keeps persisting sessions whether or not anyone is
//! watching.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

use super::alarm::{AlarmScheduler, NoopAlarm, TokioAlarm};
use super::engine::{PersistedTimer, TimerEngine};
use super::session::Mode;
use super::wake::{WakeGuard, WakeSource};
use crate::events::Event;
use crate::notify::Notifier;
use crate::storage::SessionStore;

const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// kv-store key the engine's restart snapshot is persisted under.
pub const ENGINE_KEY: &str = "timer_state";

/// Transition requests, all funneled through the one actor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Start,
    Pause,
    Toggle,
    Reset,
    SwitchMode(Mode),
    AlarmFired,
    Shutdown,
}

/// Observable engine state, published only when the whole-second value
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimerView {
    pub mode: Mode,
    pub running: bool,
    pub remaining_secs: u64,
}

/// Alarm redundancy policy for a spawned service.
pub enum AlarmMode {
    /// Exact wall-clock trigger.
    Exact,
    /// Exact scheduling unavailable; degrade to minute alignment.
    Inexact,
    /// No alarm task (tests drive completion through the channel).
    Disabled,
}

/// The View-state Bridge: commands in, watch state out. Clone freely;
/// dropping every handle shuts the service down.
#[derive(Clone)]
pub struct TimerHandle {
    tx: mpsc::Sender<TimerCommand>,
    view: watch::Receiver<TimerView>,
}

impl TimerHandle {
    pub async fn start(&self) {
        self.send(TimerCommand::Start).await;
    }

    pub async fn pause(&self) {
        self.send(TimerCommand::Pause).await;
    }

    pub async fn toggle(&self) {
        self.send(TimerCommand::Toggle).await;
    }

    pub async fn reset(&self) {
        self.send(TimerCommand::Reset).await;
    }

    pub async fn switch_mode(&self, work: bool) {
        let mode = if work { Mode::Work } else { Mode::Break };
        self.send(TimerCommand::SwitchMode(mode)).await;
    }

    pub async fn shutdown(&self) {
        self.send(TimerCommand::Shutdown).await;
    }

    pub async fn send(&self, command: TimerCommand) {
        if self.tx.send(command).await.is_err() {
            debug!(?command, "timer service is gone, command dropped");
        }
    }

    /// Subscribe to the observable state.
    pub fn view(&self) -> watch::Receiver<TimerView> {
        self.view.clone()
    }

    /// Current state without waiting for a change.
    pub fn current(&self) -> TimerView {
        *self.view.borrow()
    }
}

pub struct TimerService {
    engine: TimerEngine,
    store: SessionStore,
    alarm: Box<dyn AlarmScheduler>,
    wake: Arc<dyn WakeSource>,
    notifier: Box<dyn Notifier>,
    hold: Option<WakeGuard>,
    view_tx: watch::Sender<TimerView>,
}

impl TimerService {
    /// Spawn the actor task. Rehydrates the engine from the persisted
    /// remaining-seconds snapshot before accepting commands.
    pub fn spawn(
        mut engine: TimerEngine,
        store: SessionStore,
        wake: Arc<dyn WakeSource>,
        notifier: Box<dyn Notifier>,
        alarm_mode: AlarmMode,
    ) -> TimerHandle {
        if let Ok(Some(json)) = store.kv_get(ENGINE_KEY) {
            match serde_json::from_str::<PersistedTimer>(&json) {
                Ok(state) => engine.restore(state),
                Err(e) => debug!("discarding unreadable persisted timer state: {e}"),
            }
        }

        let (tx, rx) = mpsc::channel(32);
        let alarm: Box<dyn AlarmScheduler> = match alarm_mode {
            AlarmMode::Exact => Box::new(TokioAlarm::new(tx.clone(), engine.clock(), true)),
            AlarmMode::Inexact => Box::new(TokioAlarm::new(tx.clone(), engine.clock(), false)),
            AlarmMode::Disabled => Box::new(NoopAlarm),
        };

        let (view_tx, view_rx) = watch::channel(TimerView {
            mode: engine.mode(),
            running: engine.running(),
            remaining_secs: engine.remaining_secs(),
        });

        let service = Self {
            engine,
            store,
            alarm,
            wake,
            notifier,
            hold: None,
            view_tx,
        };
        tokio::spawn(service.run(rx));

        TimerHandle { tx, view: view_rx }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<TimerCommand>) {
        info!("timer service started");
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(TimerCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                _ = ticker.tick() => {
                    if self.engine.running() {
                        let event = self.engine.tick();
                        self.apply(event);
                    }
                }
            }
        }

        // Orderly teardown: no pending trigger, no outstanding hold,
        // frozen state persisted for the next process.
        self.alarm.cancel();
        self.hold = None;
        self.persist();
        info!("timer service stopped");
    }

    fn handle_command(&mut self, command: TimerCommand) {
        let event = match command {
            TimerCommand::Start => self.engine.start(),
            TimerCommand::Pause => self.engine.pause(),
            TimerCommand::Toggle => self.engine.toggle(),
            TimerCommand::Reset => self.engine.reset(),
            TimerCommand::SwitchMode(mode) => self.engine.switch_mode(mode),
            TimerCommand::AlarmFired => self.engine.alarm_fired(),
            TimerCommand::Shutdown => None,
        };
        self.apply(event);
    }

    /// Apply the side effects an engine event calls for, then publish
    /// the observable state.
    fn apply(&mut self, event: Option<Event>) {
        match event {
            Some(Event::TimerStarted {
                alarm_at,
                wake_hold_secs,
                ..
            }) => {
                self.hold = Some(self.wake.acquire(Duration::from_secs(wake_hold_secs)));
                self.alarm.schedule(alarm_at);
                self.persist();
            }
            Some(Event::TimerPaused { .. }) | Some(Event::TimerReset { .. }) => {
                self.alarm.cancel();
                self.hold = None;
                self.persist();
            }
            Some(Event::ModeSwitched { .. }) => {
                self.persist();
            }
            Some(Event::TimerCompleted { mode, sessions, .. }) => {
                self.hold = None;
                self.alarm.cancel();
                if !sessions.is_empty() {
                    // Best-effort durability: a failed write is logged,
                    // not retried, and never suppresses the alert.
                    if let Err(e) = self.store.append_batch(&sessions) {
                        error!("failed to persist completed session: {e}");
                    }
                }
                self.persist();
                self.notifier.completed(mode);
            }
            None => {}
        }
        self.publish();
    }

    fn publish(&mut self) {
        let view = TimerView {
            mode: self.engine.mode(),
            running: self.engine.running(),
            remaining_secs: self.engine.remaining_secs(),
        };
        let changed = self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
        if changed && view.running {
            self.notifier.progress(view.mode, view.remaining_secs);
        }
    }

    fn persist(&self) {
        let state = self.engine.persist_state();
        match serde_json::to_string(&state) {
            Ok(json) => {
                if let Err(e) = self.store.kv_set(ENGINE_KEY, &json) {
                    error!("failed to persist timer state: {e}");
                }
            }
            Err(e) => error!("failed to serialize timer state: {e}"),
        }
    }
}
