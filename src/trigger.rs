use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Marker for "no pending change".
const EMPTY: u64 = 0;

/// Single-slot latch recording the first relevant change not yet acted on.
///
/// The watcher thread calls [`Trigger::emit`], the main loop reads it and
/// calls [`Trigger::release`] once the runner has been invoked. The pending
/// instant is stored as nanoseconds since `origin`, offset by one so that
/// zero can mean empty, which keeps "set if empty" a single compare-and-swap.
#[derive(Debug)]
pub struct Trigger {
    origin: Instant,
    stamp: AtomicU64,
}

impl Trigger {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            stamp: AtomicU64::new(EMPTY),
        }
    }

    /// Record a change now, unless one is already pending.
    pub fn emit(&self) {
        self.emit_at(Instant::now());
    }

    /// Record a change at `at`, unless one is already pending.
    pub fn emit_at(&self, at: Instant) {
        let encoded = self.encode(at);
        // Losing the race means a change is already pending; keep it.
        let _ = self
            .stamp
            .compare_exchange(EMPTY, encoded, Ordering::AcqRel, Ordering::Acquire);
    }

    pub fn is_empty(&self) -> bool {
        self.stamp.load(Ordering::Acquire) == EMPTY
    }

    /// Instant of the first unconsumed change, if any.
    pub fn pending(&self) -> Option<Instant> {
        match self.stamp.load(Ordering::Acquire) {
            EMPTY => None,
            encoded => Some(self.origin + Duration::from_nanos(encoded - 1)),
        }
    }

    pub fn release(&self) {
        self.stamp.store(EMPTY, Ordering::Release);
    }

    fn encode(&self, at: Instant) -> u64 {
        let nanos = at.saturating_duration_since(self.origin).as_nanos();
        u64::try_from(nanos)
            .unwrap_or(u64::MAX - 1)
            .saturating_add(1)
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_empty() {
        let trigger = Trigger::new();
        assert!(trigger.is_empty());
        assert_eq!(trigger.pending(), None);
    }

    #[test]
    fn emit_records_the_instant() {
        let trigger = Trigger::new();
        let at = Instant::now() + Duration::from_millis(250);

        trigger.emit_at(at);

        assert!(!trigger.is_empty());
        assert_eq!(trigger.pending(), Some(at));
    }

    #[test]
    fn repeated_emits_keep_the_first_instant() {
        let trigger = Trigger::new();
        let first = Instant::now() + Duration::from_secs(1);

        trigger.emit_at(first);
        trigger.emit_at(first + Duration::from_secs(2));
        trigger.emit();

        assert_eq!(trigger.pending(), Some(first));
    }

    #[test]
    fn release_empties_and_next_emit_rearms() {
        let trigger = Trigger::new();
        let first = Instant::now() + Duration::from_secs(1);
        let second = first + Duration::from_secs(5);

        trigger.emit_at(first);
        trigger.release();
        assert!(trigger.is_empty());

        trigger.emit_at(second);
        assert_eq!(trigger.pending(), Some(second));
    }

    #[test]
    fn release_on_empty_trigger_is_harmless() {
        let trigger = Trigger::new();
        trigger.release();
        assert!(trigger.is_empty());
    }

    #[test]
    fn concurrent_emits_leave_one_pending_instant() {
        let trigger = Arc::new(Trigger::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let trigger = Arc::clone(&trigger);
                thread::spawn(move || {
                    for _ in 0..100 {
                        trigger.emit();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let pending = trigger.pending().unwrap();
        trigger.emit();
        assert_eq!(trigger.pending(), Some(pending));
    }
}
