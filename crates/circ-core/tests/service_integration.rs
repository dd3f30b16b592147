//! End-to-end tests for the timer service actor.
//!
//! The service runs on a paused single-threaded tokio runtime with a
//! manually driven clock, so every transition is deterministic. Most
//! tests disable the alarm task and trigger completion through the
//! same command channel the real alarm uses; the exact-alarm test
//! lets the scheduled trigger fire on virtual time instead.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeZone;
use circ_core::clock::ManualClock;
use circ_core::notify::RecordingNotifier;
use circ_core::timer::{
    AlarmMode, CountingWakeSource, Mode, TimerCommand, TimerEngine, TimerService,
};
use circ_core::{Database, SessionStore};

struct Harness {
    clock: ManualClock,
    wake: Arc<CountingWakeSource>,
    notifier: RecordingNotifier,
    handle: circ_core::TimerHandle,
    db_path: std::path::PathBuf,
    _dir: tempfile::TempDir,
}

fn spawn_service(wall: chrono::DateTime<chrono::Local>) -> Harness {
    spawn_service_with_alarm(wall, AlarmMode::Disabled)
}

fn spawn_service_with_alarm(
    wall: chrono::DateTime<chrono::Local>,
    alarm_mode: AlarmMode,
) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("circ.db");
    spawn_service_at(wall, dir, db_path, alarm_mode)
}

fn spawn_service_at(
    wall: chrono::DateTime<chrono::Local>,
    dir: tempfile::TempDir,
    db_path: std::path::PathBuf,
    alarm_mode: AlarmMode,
) -> Harness {
    let clock = ManualClock::new(wall);
    let wake = Arc::new(CountingWakeSource::default());
    let notifier = RecordingNotifier::default();

    let engine = TimerEngine::new(Arc::new(clock.clone()), 30, 5);
    let store = SessionStore::new(Database::open_at(&db_path).unwrap());
    let handle = TimerService::spawn(
        engine,
        store,
        wake.clone(),
        Box::new(notifier.clone()),
        alarm_mode,
    );

    Harness {
        clock,
        wake,
        notifier,
        handle,
        db_path,
        _dir: dir,
    }
}

fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> chrono::DateTime<chrono::Local> {
    chrono::Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

async fn wait_for_running(harness: &Harness, running: bool) {
    let mut view = harness.handle.view();
    tokio::time::timeout(Duration::from_secs(5), async {
        while view.borrow_and_update().running != running {
            view.changed().await.unwrap();
        }
    })
    .await
    .expect("service did not publish the expected running state");
}

#[tokio::test(start_paused = true)]
async fn alarm_completion_persists_split_records_and_alerts_once() {
    // Work session started at 23:50, deadline 00:20 the next day.
    let harness = spawn_service(local(2026, 3, 10, 23, 50));

    harness.handle.start().await;
    wait_for_running(&harness, true).await;
    assert_eq!(harness.wake.active_holds(), 1);

    harness.clock.advance(Duration::from_secs(30 * 60));
    harness.handle.send(TimerCommand::AlarmFired).await;
    wait_for_running(&harness, false).await;

    let db = Database::open_at(&harness.db_path).unwrap();
    let sessions = db.all_sessions().unwrap();
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].date.to_string(), "2026-03-10");
    assert_eq!(sessions[0].start_time_of_day.to_string(), "23:50:00");
    assert_eq!(sessions[0].duration_minutes, 10);
    assert_eq!(sessions[1].date.to_string(), "2026-03-11");
    assert_eq!(sessions[1].start_time_of_day.to_string(), "00:00:00");
    assert_eq!(sessions[1].duration_minutes, 20);

    assert_eq!(harness.notifier.completions(), vec![Mode::Work]);
    assert_eq!(harness.wake.active_holds(), 0);
    assert_eq!(harness.wake.total_acquired(), 1);

    // Countdown is ready for the next run at full duration.
    assert_eq!(harness.handle.current().remaining_secs, 30 * 60);
}

#[tokio::test(start_paused = true)]
async fn redundant_alarm_after_pause_is_ignored() {
    let harness = spawn_service(local(2026, 3, 10, 10, 0));

    harness.handle.start().await;
    wait_for_running(&harness, true).await;
    harness.clock.advance(Duration::from_secs(60));
    harness.handle.pause().await;
    wait_for_running(&harness, false).await;

    // A stale trigger arriving after the pause must not complete the
    // frozen countdown.
    harness.handle.send(TimerCommand::AlarmFired).await;
    harness.handle.send(TimerCommand::SwitchMode(Mode::Break)).await;
    let mut view = harness.handle.view();
    tokio::time::timeout(Duration::from_secs(5), async {
        while view.borrow_and_update().mode != Mode::Break {
            view.changed().await.unwrap();
        }
    })
    .await
    .expect("mode switch not observed");

    assert!(harness.notifier.completions().is_empty());
    let db = Database::open_at(&harness.db_path).unwrap();
    assert!(db.all_sessions().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn paused_remaining_survives_service_restart() {
    let harness = spawn_service(local(2026, 3, 10, 10, 0));

    harness.handle.start().await;
    wait_for_running(&harness, true).await;
    harness.clock.advance(Duration::from_secs(30 * 60 - 12));
    harness.handle.pause().await;
    wait_for_running(&harness, false).await;
    assert_eq!(harness.handle.current().remaining_secs, 12);

    harness.handle.shutdown().await;

    // A new process rehydrates from the kv snapshot, not from the
    // (now meaningless) monotonic target.
    let Harness { handle, .. } = spawn_service_at(
        local(2026, 3, 10, 12, 0),
        harness._dir,
        harness.db_path.clone(),
        AlarmMode::Disabled,
    );
    assert_eq!(handle.current().remaining_secs, 12);
    assert!(!handle.current().running);
}

#[tokio::test(start_paused = true)]
async fn progress_is_published_only_on_whole_second_changes() {
    let harness = spawn_service(local(2026, 3, 10, 10, 0));

    harness.handle.start().await;
    wait_for_running(&harness, true).await;

    // Advance the clock in sub-second steps across several ticks; only
    // three distinct whole-second values are crossed.
    for _ in 0..6 {
        harness.clock.advance(Duration::from_millis(300));
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    let remaining: Vec<u64> = harness
        .notifier
        .progress_updates()
        .iter()
        .map(|(_, secs)| *secs)
        .collect();
    assert_eq!(remaining.first().copied(), Some(30 * 60));
    assert!(remaining.contains(&(30 * 60 - 1)));
    assert!(
        remaining.windows(2).all(|pair| pair[0] != pair[1]),
        "consecutive duplicate updates: {remaining:?}"
    );
    // Seven or more publish opportunities collapse to at most three
    // distinct values.
    assert!(remaining.len() <= 3, "uncoalesced updates: {remaining:?}");
}

#[tokio::test(start_paused = true)]
async fn scheduled_alarm_fires_at_the_wall_deadline() {
    // The alarm path end to end: the exact trigger scheduled at start
    // drives completion once virtual time reaches the deadline, while
    // the frozen manual clock keeps the tick loop from completing.
    let harness = spawn_service_with_alarm(local(2026, 3, 10, 10, 0), AlarmMode::Exact);

    harness.handle.start().await;
    wait_for_running(&harness, true).await;

    // Half an hour of virtual time has to pass before the trigger.
    let mut view = harness.handle.view();
    tokio::time::timeout(Duration::from_secs(3600), async {
        while view.borrow_and_update().running {
            view.changed().await.unwrap();
        }
    })
    .await
    .expect("alarm did not complete the countdown");

    assert_eq!(harness.notifier.completions(), vec![Mode::Work]);
    let db = Database::open_at(&harness.db_path).unwrap();
    let sessions = db.all_sessions().unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].date.to_string(), "2026-03-10");
    assert_eq!(sessions[0].start_time_of_day.to_string(), "09:30:00");
    assert_eq!(sessions[0].duration_minutes, 30);
}

#[tokio::test(start_paused = true)]
async fn break_completion_alerts_but_writes_nothing() {
    let harness = spawn_service(local(2026, 3, 10, 10, 0));

    harness.handle.send(TimerCommand::SwitchMode(Mode::Break)).await;
    harness.handle.start().await;
    wait_for_running(&harness, true).await;
    harness.clock.advance(Duration::from_secs(5 * 60));
    harness.handle.send(TimerCommand::AlarmFired).await;
    wait_for_running(&harness, false).await;

    assert_eq!(harness.notifier.completions(), vec![Mode::Break]);
    let db = Database::open_at(&harness.db_path).unwrap();
    assert!(db.all_sessions().unwrap().is_empty());
}
