use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Single-slot guard that keeps a periodic task from re-entering itself.
///
/// A tick that finds the latch held is dropped, not queued.
#[derive(Debug, Clone, Default)]
pub struct BusyLatch {
    busy: Arc<AtomicBool>,
}

/// Held for the duration of one iteration; releases the latch on drop.
#[derive(Debug)]
pub struct BusyGuard {
    busy: Arc<AtomicBool>,
}

impl BusyLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the latch, or `None` if an iteration is already in flight.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let latch = BusyLatch::new();
        let guard = latch.try_acquire();
        assert!(guard.is_some());
        assert!(latch.is_busy());
        assert!(latch.try_acquire().is_none());
    }

    #[test]
    fn dropping_guard_releases() {
        let latch = BusyLatch::new();
        drop(latch.try_acquire().unwrap());
        assert!(!latch.is_busy());
        assert!(latch.try_acquire().is_some());
    }

    #[test]
    fn clones_share_state() {
        let latch = BusyLatch::new();
        let other = latch.clone();
        let _guard = latch.try_acquire().unwrap();
        assert!(other.is_busy());
        assert!(other.try_acquire().is_none());
    }

    #[test]
    fn released_on_early_return() {
        fn bail(latch: &BusyLatch) -> Result<(), &'static str> {
            let _guard = latch.try_acquire().ok_or("busy")?;
            Err("failed midway")
        }
        let latch = BusyLatch::new();
        assert!(bail(&latch).is_err());
        assert!(!latch.is_busy());
    }
}
