//! Cooperative shutdown.
//!
//! A [`CancellationFlag`] is set once, by the first SIGINT/SIGTERM, and never
//! reset. The reader only acts on it at its loop checkpoints; the fixed
//! sleeps merely wake up early so those checkpoints come around sooner.
//! A second signal while the reader is stuck in a blocking read exits the
//! process right away.

use log::{error, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::utils::error::ReaderError;

#[derive(Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Process-wide cancellation flag. Clones share the same state.
#[derive(Clone, Default)]
pub struct CancellationFlag {
    inner: Arc<Inner>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag. Returns `true` for the call that actually set it.
    pub fn cancel(&self) -> bool {
        let first = self
            .inner
            .cancelled
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once the flag is set.
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        // Register before checking so a concurrent cancel() is not missed
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Sleeps for `duration`, waking early if the flag gets set. Returns `true`
/// when the full duration elapsed.
pub async fn sleep_unless_cancelled(flag: &CancellationFlag, duration: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = flag.cancelled() => false,
    }
}

/// Exit status used when a repeated signal forces the process down.
pub const FORCED_EXIT_CODE: i32 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First signal: stop at the next checkpoint.
    Cancel,
    /// Shutdown already requested: exit without draining.
    ForceExit,
}

/// Decides what a received signal means given the flag's current state.
pub fn on_signal(flag: &CancellationFlag, signal: &str) -> SignalAction {
    if flag.cancel() {
        warn!("Received {}, stopping after the current read", signal);
        SignalAction::Cancel
    } else {
        error!("Received {} again, exiting without writing buffered readings", signal);
        SignalAction::ForceExit
    }
}

/// Routes SIGINT and SIGTERM to `flag`. Must be called inside the runtime.
#[cfg(unix)]
pub fn install_signal_handlers(flag: CancellationFlag) -> Result<JoinHandle<()>, ReaderError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
        ReaderError::ConfigError(format!("Failed to register SIGTERM handler: {}", e))
    })?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(|e| {
        ReaderError::ConfigError(format!("Failed to register SIGINT handler: {}", e))
    })?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                _ = sigterm.recv() => "SIGTERM",
                _ = sigint.recv() => "SIGINT",
            };
            if on_signal(&flag, name) == SignalAction::ForceExit {
                std::process::exit(FORCED_EXIT_CODE);
            }
        }
    }))
}

#[cfg(not(unix))]
pub fn install_signal_handlers(flag: CancellationFlag) -> Result<JoinHandle<()>, ReaderError> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if on_signal(&flag, "Ctrl+C") == SignalAction::ForceExit {
                std::process::exit(FORCED_EXIT_CODE);
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_sets_exactly_once() {
        let flag = CancellationFlag::new();
        let clone = flag.clone();

        assert!(!flag.is_cancelled());
        assert!(clone.cancel());
        assert!(!flag.cancel());
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_repeated_signal_forces_exit() {
        let flag = CancellationFlag::new();

        assert_eq!(on_signal(&flag, "SIGINT"), SignalAction::Cancel);
        assert!(flag.is_cancelled());
        assert_eq!(on_signal(&flag, "SIGTERM"), SignalAction::ForceExit);
        assert_eq!(on_signal(&flag, "SIGINT"), SignalAction::ForceExit);
    }

    #[tokio::test]
    async fn test_cancelled_resolves_for_waiters() {
        let flag = CancellationFlag::new();
        let waiter = {
            let flag = flag.clone();
            tokio::spawn(async move { flag.cancelled().await })
        };
        tokio::task::yield_now().await;

        flag.cancel();

        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_when_already_set() {
        let flag = CancellationFlag::new();
        flag.cancel();
        flag.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_wakes_early_on_cancel() {
        let flag = CancellationFlag::new();
        let started = tokio::time::Instant::now();
        {
            let flag = flag.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                flag.cancel();
            });
        }

        let completed = sleep_unless_cancelled(&flag, Duration::from_secs(60)).await;

        assert!(!completed);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_runs_full_duration() {
        let flag = CancellationFlag::new();
        assert!(sleep_unless_cancelled(&flag, Duration::from_secs(1)).await);
    }
}
