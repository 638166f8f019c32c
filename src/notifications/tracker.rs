//! Async Task Tracking
//!
//! Counts in-flight async invocations per observer. An observer (and its id)
//! may only be released once its count is back to zero, and teardown waits for
//! every count to drain.

use std::collections::HashMap;
use std::sync::Arc;

use log::trace;
use parking_lot::{Condvar, Mutex};

use crate::notifications::ids::ObserverId;

#[derive(Debug, Default)]
pub struct AsyncTaskTracker {
    pending: Mutex<HashMap<ObserverId, usize>>,
    drained: Condvar,
}

impl AsyncTaskTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one task for `id`. The task is complete when the ticket drops.
    pub fn begin(self: &Arc<Self>, id: ObserverId) -> TaskTicket {
        *self.pending.lock().entry(id).or_insert(0) += 1;
        TaskTicket {
            tracker: Arc::clone(self),
            id,
        }
    }

    fn complete(&self, id: ObserverId) {
        let mut pending = self.pending.lock();
        if let Some(count) = pending.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                pending.remove(&id);
            }
        }
        trace!("Async task for observer {} complete", id);
        self.drained.notify_all();
    }

    /// Tasks not yet finished for `id`
    pub fn pending(&self, id: ObserverId) -> usize {
        self.pending.lock().get(&id).copied().unwrap_or(0)
    }

    /// Tasks not yet finished for any of `ids`
    pub fn pending_any(&self, ids: &[ObserverId]) -> usize {
        let pending = self.pending.lock();
        ids.iter().filter_map(|id| pending.get(id)).sum()
    }

    /// Tasks not yet finished across all observers
    pub fn total_pending(&self) -> usize {
        self.pending.lock().values().sum()
    }

    /// Block until `id` has no task in flight
    pub fn wait_for(&self, id: ObserverId) {
        let mut pending = self.pending.lock();
        while pending.contains_key(&id) {
            self.drained.wait(&mut pending);
        }
    }

    /// Block until none of `ids` has a task in flight
    pub fn wait_for_ids(&self, ids: &[ObserverId]) {
        let mut pending = self.pending.lock();
        while ids.iter().any(|id| pending.contains_key(id)) {
            self.drained.wait(&mut pending);
        }
    }

    /// Block until every tracked task has finished
    pub fn wait_for_all(&self) {
        let mut pending = self.pending.lock();
        while !pending.is_empty() {
            self.drained.wait(&mut pending);
        }
    }
}

/// Handle for one in-flight async invocation; completes on drop, including when
/// the task is discarded before running or its callback panics.
#[derive(Debug)]
pub struct TaskTicket {
    tracker: Arc<AsyncTaskTracker>,
    id: ObserverId,
}

impl TaskTicket {
    pub fn observer_id(&self) -> ObserverId {
        self.id
    }
}

impl Drop for TaskTicket {
    fn drop(&mut self) {
        self.tracker.complete(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn id(raw: u32) -> ObserverId {
        ObserverId::new(raw).unwrap()
    }

    #[test]
    fn test_tickets_count_per_observer() {
        let tracker = Arc::new(AsyncTaskTracker::new());
        let a = tracker.begin(id(1));
        let b = tracker.begin(id(1));
        let c = tracker.begin(id(2));

        assert_eq!(tracker.pending(id(1)), 2);
        assert_eq!(tracker.pending(id(2)), 1);
        assert_eq!(tracker.pending_any(&[id(1), id(2), id(3)]), 3);
        assert_eq!(tracker.total_pending(), 3);

        drop(a);
        drop(c);
        assert_eq!(tracker.pending(id(1)), 1);
        assert_eq!(tracker.pending(id(2)), 0);

        drop(b);
        assert_eq!(tracker.total_pending(), 0);
    }

    #[test]
    fn test_wait_for_blocks_until_drained() {
        let tracker = Arc::new(AsyncTaskTracker::new());
        let ticket = tracker.begin(id(1));

        let worker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            drop(ticket);
        });

        tracker.wait_for(id(1));
        assert_eq!(tracker.pending(id(1)), 0);
        worker.join().unwrap();
    }

    #[test]
    fn test_wait_for_all() {
        let tracker = Arc::new(AsyncTaskTracker::new());
        let tickets: Vec<_> = (1..=4).map(|raw| tracker.begin(id(raw))).collect();

        let worker = thread::spawn(move || {
            for ticket in tickets {
                thread::sleep(Duration::from_millis(10));
                drop(ticket);
            }
        });

        tracker.wait_for_all();
        assert_eq!(tracker.total_pending(), 0);
        worker.join().unwrap();
    }

    #[test]
    fn test_wait_without_tasks_returns_immediately() {
        let tracker = AsyncTaskTracker::new();
        tracker.wait_for(id(5));
        tracker.wait_for_ids(&[id(5), id(6)]);
        tracker.wait_for_all();
    }
}
