use std::sync::Arc;

use clap::Subcommand;
use tokio::io::{AsyncBufReadExt, BufReader};

use circ_core::timer::{
    AlarmMode, PersistedTimer, SystemWakeSource, TimerEngine, TimerService, ENGINE_KEY,
};
use circ_core::{Config, Database, Notifier, NullNotifier, SessionStore, SystemClock, TimerView};

use crate::notify::DesktopNotifier;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the timer service in the foreground.
    ///
    /// Line commands on stdin: start, pause, toggle, reset, work,
    /// break, status, quit.
    Run {
        /// Start the countdown immediately
        #[arg(long)]
        start: bool,
        /// Degraded alarm scheduling (minute-aligned triggers)
        #[arg(long)]
        inexact_alarms: bool,
    },
    /// Print the persisted timer state as JSON
    Status,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run {
            start,
            inexact_alarms,
        } => run_service(start, inexact_alarms),
        TimerAction::Status => status(),
    }
}

fn status() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let state = match db.kv_get(ENGINE_KEY)? {
        Some(json) => serde_json::from_str::<PersistedTimer>(&json)?,
        None => PersistedTimer {
            mode: circ_core::timer::Mode::Work,
            remaining_work_secs: u64::from(config.timer.work_minutes) * 60,
            remaining_break_secs: u64::from(config.timer.break_minutes) * 60,
        },
    };
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn run_service(start: bool, inexact_alarms: bool) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let config = Config::load_or_default();
        let clock = Arc::new(SystemClock::new());
        let engine = TimerEngine::new(clock, config.timer.work_minutes, config.timer.break_minutes);
        let store = SessionStore::new(Database::open()?);

        let notifier: Box<dyn Notifier> = if config.notifications.enabled {
            Box::new(DesktopNotifier)
        } else {
            Box::new(NullNotifier)
        };
        let alarm_mode = if inexact_alarms {
            AlarmMode::Inexact
        } else {
            AlarmMode::Exact
        };

        let handle = TimerService::spawn(
            engine,
            store,
            Arc::new(SystemWakeSource),
            notifier,
            alarm_mode,
        );
        if start {
            handle.start().await;
        }
        print_view(handle.current());

        let mut view = handle.view();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                changed = view.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    print_view(*view.borrow_and_update());
                }
                line = lines.next_line() => {
                    let Ok(Some(line)) = line else {
                        handle.shutdown().await;
                        break;
                    };
                    match line.trim() {
                        "start" => handle.start().await,
                        "pause" => handle.pause().await,
                        "toggle" => handle.toggle().await,
                        "reset" => handle.reset().await,
                        "work" => handle.switch_mode(true).await,
                        "break" => handle.switch_mode(false).await,
                        "status" => print_view(handle.current()),
                        "quit" | "exit" => {
                            handle.shutdown().await;
                            break;
                        }
                        "" => {}
                        other => eprintln!("unknown command: {other}"),
                    }
                }
            }
        }
        Ok(())
    })
}

fn print_view(view: TimerView) {
    let state = if view.running { "RUNNING" } else { "PAUSED" };
    println!(
        "{} {:02}:{:02} [{}]",
        view.mode.label(),
        view.remaining_secs / 60,
        view.remaining_secs % 60,
        state
    );
}
