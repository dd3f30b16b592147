//! Bounded wake-holds.
//!
//! A wake-hold keeps the host awake for at most a bounded duration so a
//! running countdown keeps accurate time. Acquisition is scoped: the
//! guard releases on drop, so no failure path can leave a hold
//! acquired.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

/// Scoped wake-hold. Releases when dropped.
pub struct WakeGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl WakeGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl Drop for WakeGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Grants bounded wake-holds.
pub trait WakeSource: Send + Sync {
    fn acquire(&self, max: Duration) -> WakeGuard;
}

/// Default source. Platform suspend inhibition is a host concern; this
/// records the hold window in the log so the bound is observable.
pub struct SystemWakeSource;

impl WakeSource for SystemWakeSource {
    fn acquire(&self, max: Duration) -> WakeGuard {
        debug!(max_secs = max.as_secs(), "wake-hold acquired");
        WakeGuard::new(|| debug!("wake-hold released"))
    }
}

/// Test source counting outstanding holds, for asserting balanced
/// acquire/release.
#[derive(Default)]
pub struct CountingWakeSource {
    active: Arc<AtomicUsize>,
    acquired_total: Arc<AtomicUsize>,
}

impl CountingWakeSource {
    pub fn active_holds(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn total_acquired(&self) -> usize {
        self.acquired_total.load(Ordering::SeqCst)
    }
}

impl WakeSource for CountingWakeSource {
    fn acquire(&self, _max: Duration) -> WakeGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        self.acquired_total.fetch_add(1, Ordering::SeqCst);
        let active = Arc::clone(&self.active);
        WakeGuard::new(move || {
            active.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_releases_on_drop() {
        let source = CountingWakeSource::default();
        let guard = source.acquire(Duration::from_secs(60));
        assert_eq!(source.active_holds(), 1);
        drop(guard);
        assert_eq!(source.active_holds(), 0);
        assert_eq!(source.total_acquired(), 1);
    }

    #[test]
    fn guard_releases_on_panic_unwind() {
        let source = Arc::new(CountingWakeSource::default());
        let inner = Arc::clone(&source);
        let result = std::panic::catch_unwind(move || {
            let _guard = inner.acquire(Duration::from_secs(60));
            panic!("completion handler failed");
        });
        assert!(result.is_err());
        assert_eq!(source.active_holds(), 0);
    }
}
