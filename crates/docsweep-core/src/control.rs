//! Cooperative cancellation for a running sweep.
//!
//! The CLI hands a clone of the token to its Ctrl-C listener; the run loop
//! checks it before each id and while sleeping, and the curl progress
//! callback checks it during a transfer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Slice length for abort-aware sleeping.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default)]
pub struct AbortToken(Arc<AtomicBool>);

impl AbortToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Sleep for `total`, waking early if abort is requested.
    /// Returns false when the sleep was cut short.
    pub fn sleep(&self, total: Duration) -> bool {
        let deadline = Instant::now() + total;
        loop {
            if self.is_aborted() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let a = AbortToken::new();
        let b = a.clone();
        assert!(!b.is_aborted());
        a.request_abort();
        assert!(b.is_aborted());
    }

    #[test]
    fn sleep_returns_early_when_aborted() {
        let token = AbortToken::new();
        let remote = token.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(60));
            remote.request_abort();
        });
        let start = Instant::now();
        assert!(!token.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn zero_sleep_completes() {
        assert!(AbortToken::new().sleep(Duration::ZERO));
    }
}
