//! Restoration deadlines, one per device.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::runtime::Instant;

/// Identifies one scheduled restoration. A new schedule for the same device
/// gets a new token, which invalidates the old queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, Copy)]
struct Pending {
    deadline: Instant,
    token: TimerToken,
}

/// A single priority queue of deadlines keyed by device.
///
/// Cancelled or replaced entries stay in the heap until they reach the top
/// and are discarded because their token no longer matches.
#[derive(Debug, Default)]
pub struct RestoreTimers {
    queue: BinaryHeap<Reverse<(Instant, TimerToken, String)>>,
    pending: HashMap<String, Pending>,
    next_token: u64,
}

impl RestoreTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a restoration, replacing any pending one for the device.
    pub fn schedule(&mut self, device_id: &str, deadline: Instant) -> TimerToken {
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        self.pending
            .insert(device_id.to_string(), Pending { deadline, token });
        self.queue
            .push(Reverse((deadline, token, device_id.to_string())));
        token
    }

    /// Cancels the pending restoration for a device, if any.
    pub fn cancel(&mut self, device_id: &str) -> bool {
        self.pending.remove(device_id).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
        self.queue.clear();
    }

    pub fn deadline_for(&self, device_id: &str) -> Option<Instant> {
        self.pending.get(device_id).map(|p| p.deadline)
    }

    /// The earliest live deadline.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.discard_stale();
        self.queue.peek().map(|Reverse((deadline, _, _))| *deadline)
    }

    /// Removes and returns the devices whose deadline is at or before `now`,
    /// earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<String> {
        let mut due = Vec::new();
        while let Some(Reverse((deadline, _, _))) = self.queue.peek() {
            if *deadline > now {
                break;
            }
            let Some(Reverse((_, token, device_id))) = self.queue.pop() else {
                break;
            };
            if self.is_live(&device_id, token) {
                self.pending.remove(&device_id);
                due.push(device_id);
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn is_live(&self, device_id: &str, token: TimerToken) -> bool {
        self.pending
            .get(device_id)
            .is_some_and(|p| p.token == token)
    }

    fn discard_stale(&mut self) {
        while let Some(Reverse((_, token, device_id))) = self.queue.peek() {
            if self.is_live(device_id, *token) {
                break;
            }
            self.queue.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_pop_due_in_deadline_order() {
        let t0 = Instant::now();
        let mut timers = RestoreTimers::new();
        timers.schedule("b", t0 + ms(200));
        timers.schedule("a", t0 + ms(100));
        timers.schedule("c", t0 + ms(300));

        assert_eq!(timers.next_deadline(), Some(t0 + ms(100)));
        assert_eq!(timers.pop_due(t0 + ms(250)), vec!["a", "b"]);
        assert_eq!(timers.len(), 1);
        assert!(timers.pop_due(t0 + ms(299)).is_empty());
    }

    #[test]
    fn test_reschedule_replaces_old_deadline() {
        let t0 = Instant::now();
        let mut timers = RestoreTimers::new();
        timers.schedule("a", t0 + ms(100));
        timers.schedule("a", t0 + ms(500));

        assert_eq!(timers.len(), 1);
        assert_eq!(timers.next_deadline(), Some(t0 + ms(500)));
        assert!(timers.pop_due(t0 + ms(100)).is_empty());
        assert_eq!(timers.pop_due(t0 + ms(500)), vec!["a"]);
        assert!(timers.pop_due(t0 + ms(10_000)).is_empty());
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut timers = RestoreTimers::new();
        timers.schedule("a", t0 + ms(100));
        assert!(timers.cancel("a"));
        assert!(!timers.cancel("a"));
        assert_eq!(timers.next_deadline(), None);
        assert!(timers.pop_due(t0 + ms(100)).is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let t0 = Instant::now();
        let mut timers = RestoreTimers::new();
        timers.schedule("a", t0 + ms(100));
        timers.schedule("b", t0 + ms(100));
        timers.cancel_all();
        assert!(timers.is_empty());
        assert_eq!(timers.deadline_for("a"), None);
    }
}
