use std::{
    collections::{HashMap, VecDeque},
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Derived key for duplicate detection: canonical JSON of `{time, total}`.
pub fn fingerprint(time: &str, total: &Value) -> String {
    json!({ "time": time, "total": total }).to_string()
}

/// Returned when a fingerprint is still cooling down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    /// Whole seconds left, rounded up, never below 1.
    pub remaining_secs: u64,
}

struct Seen {
    first_seen: HashMap<String, Instant>,
    // Oldest first. Each key appears at most once.
    order: VecDeque<(Instant, String)>,
}

/// In-memory, single-process guard against repeated print submissions.
///
/// Entries older than `window` are evicted from the front of the queue on
/// every check. A fingerprint still inside its window is never dropped, so
/// `capacity` is the expected size rather than a hard cap; going past it is
/// logged.
pub struct DuplicateGuard {
    window: Duration,
    capacity: usize,
    seen: Mutex<Seen>,
}

impl DuplicateGuard {
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity: capacity.max(1),
            seen: Mutex::new(Seen {
                first_seen: HashMap::with_capacity(capacity),
                order: VecDeque::with_capacity(capacity),
            }),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check(&self, key: &str) -> Result<(), Cooldown> {
        self.check_at(key, Instant::now())
    }

    /// Records `key` at `now` unless it was recorded within the window.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<(), Cooldown> {
        let mut seen = self.seen.lock();
        self.evict_expired(&mut seen, now);

        if let Some(&at) = seen.first_seen.get(key) {
            let elapsed = now.saturating_duration_since(at);
            let remaining = self.window.saturating_sub(elapsed);
            let remaining_secs = (remaining.as_millis() as u64).div_ceil(1000).max(1);
            return Err(Cooldown { remaining_secs });
        }

        if seen.order.len() >= self.capacity {
            warn!(
                entries = seen.order.len(),
                capacity = self.capacity,
                "duplicate table over capacity; all entries still cooling down"
            );
        }
        seen.first_seen.insert(key.to_string(), now);
        seen.order.push_back((now, key.to_string()));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.seen.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_expired(&self, seen: &mut Seen, now: Instant) {
        let mut evicted = 0usize;
        while let Some((at, _)) = seen.order.front() {
            if now.saturating_duration_since(*at) < self.window {
                break;
            }
            if let Some((_, key)) = seen.order.pop_front() {
                seen.first_seen.remove(&key);
                evicted += 1;
            }
        }
        if evicted > 0 {
            debug!(evicted, remaining = seen.order.len(), "expired print fingerprints");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> DuplicateGuard {
        DuplicateGuard::new(Duration::from_secs(30), 100)
    }

    #[test]
    fn fingerprint_depends_on_time_and_total() {
        let a = fingerprint("2024/03/05 10:00", &json!(["100", "200"]));
        let b = fingerprint("2024/03/05 10:00", &json!(["100", "200"]));
        let c = fingerprint("2024/03/05 10:01", &json!(["100", "200"]));
        let d = fingerprint("2024/03/05 10:00", &json!(["100"]));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn repeat_within_window_reports_remaining_seconds() {
        let g = guard();
        let t0 = Instant::now();
        assert!(g.check_at("k", t0).is_ok());

        let cd = g.check_at("k", t0 + Duration::from_millis(10_500)).unwrap_err();
        assert_eq!(cd.remaining_secs, 20);

        let cd = g.check_at("k", t0).unwrap_err();
        assert_eq!(cd.remaining_secs, 30);

        let cd = g.check_at("k", t0 + Duration::from_millis(29_999)).unwrap_err();
        assert_eq!(cd.remaining_secs, 1);
    }

    #[test]
    fn repeat_after_window_is_allowed() {
        let g = guard();
        let t0 = Instant::now();
        assert!(g.check_at("k", t0).is_ok());
        assert!(g.check_at("k", t0 + Duration::from_secs(30)).is_ok());
        assert!(g.check_at("k", t0 + Duration::from_secs(31)).is_err());
        assert!(g.check_at("k", t0 + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn rejected_repeat_does_not_extend_window() {
        let g = guard();
        let t0 = Instant::now();
        g.check_at("k", t0).unwrap();
        g.check_at("k", t0 + Duration::from_secs(20)).unwrap_err();
        assert!(g.check_at("k", t0 + Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn expired_entries_are_evicted_on_access() {
        let g = guard();
        let t0 = Instant::now();
        for i in 0..10 {
            g.check_at(&format!("k{i}"), t0).unwrap();
        }
        assert_eq!(g.len(), 10);
        g.check_at("fresh", t0 + Duration::from_secs(45)).unwrap();
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn cooling_entries_survive_a_full_table() {
        let g = DuplicateGuard::new(Duration::from_secs(30), 100);
        let t0 = Instant::now();
        g.check_at("invoice-A", t0).unwrap();
        for i in 0..100u64 {
            g.check_at(&format!("other-{i}"), t0 + Duration::from_millis(10 + i)).unwrap();
        }
        assert_eq!(g.len(), 101);

        let cd = g.check_at("invoice-A", t0 + Duration::from_secs(5)).unwrap_err();
        assert_eq!(cd.remaining_secs, 25);
    }

    #[test]
    fn table_shrinks_back_once_entries_expire() {
        let g = DuplicateGuard::new(Duration::from_secs(30), 3);
        let t0 = Instant::now();
        for i in 0..5u64 {
            g.check_at(&format!("k{i}"), t0 + Duration::from_millis(i)).unwrap();
        }
        assert_eq!(g.len(), 5);
        assert!(g.check_at("k0", t0 + Duration::from_millis(10)).is_err());

        g.check_at("late", t0 + Duration::from_secs(31)).unwrap();
        assert_eq!(g.len(), 1);
        assert!(g.check_at("k0", t0 + Duration::from_secs(31)).is_ok());
    }
}
