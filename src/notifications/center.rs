//! Notification Center
//!
//! Owns one observer registry, the async task tracker and the worker pool.
//! Registry state lives behind a reentrant lock so a synchronous observer may
//! call back into the same center (add, remove, post) from its own thread.

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

use log::{debug, info, warn};
use parking_lot::ReentrantMutex;

use crate::notifications::callback::{erase, Callback, ErasedCallback};
use crate::notifications::error::{NotiflyError, NotiflyResult};
use crate::notifications::ids::{IdAllocator, ObserverId, DEFAULT_MAX_OBSERVER_ID};
use crate::notifications::registry::ObserverRegistry;
use crate::notifications::signature::{Payload, TypeSignature};
use crate::notifications::tracker::AsyncTaskTracker;
use crate::notifications::Topic;
use crate::pool::{PoolStats, StopMode, WorkerPool};

/// Engine settings for one center
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CenterConfig {
    /// Worker threads for async dispatch; at least one is always started
    pub worker_threads: usize,
    /// Largest observer id handed out before reuse is the only option
    pub max_observer_id: u32,
}

impl Default for CenterConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            max_observer_id: DEFAULT_MAX_OBSERVER_ID,
        }
    }
}

/// One worker per logical CPU
pub fn default_worker_threads() -> usize {
    num_cpus::get().max(1)
}

pub struct NotificationCenter {
    pub(super) state: ReentrantMutex<RefCell<ObserverRegistry>>,
    pub(super) tracker: Arc<AsyncTaskTracker>,
    pub(super) pool: WorkerPool,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_config(CenterConfig::default())
    }

    pub fn with_config(config: CenterConfig) -> Self {
        let threads = config.worker_threads.max(1);
        debug!(
            "Creating notification center ({} workers, max observer id {})",
            threads, config.max_observer_id
        );
        Self {
            state: ReentrantMutex::new(RefCell::new(ObserverRegistry::new(IdAllocator::with_limit(
                config.max_observer_id,
            )))),
            tracker: Arc::new(AsyncTaskTracker::new()),
            pool: WorkerPool::new(threads),
        }
    }

    /// The shared process-wide center, created on first use and never torn down
    pub fn default_center() -> &'static NotificationCenter {
        static DEFAULT: OnceLock<NotificationCenter> = OnceLock::new();
        DEFAULT.get_or_init(|| {
            info!("Initializing default notification center");
            NotificationCenter::new()
        })
    }

    /// Register `callback` on `topic`.
    ///
    /// The first observer of a topic pins its payload signature; later observers
    /// must take the same argument types or get `PayloadTypeMismatch`.
    ///
    /// ```
    /// use notifly::NotificationCenter;
    ///
    /// let center = NotificationCenter::new();
    /// let id = center.add_observer(1, |a: i32, b: i32| a + b).unwrap();
    /// assert_eq!(center.post_notification(1, (5, 10)).unwrap(), 1);
    /// center.remove_observer(id).unwrap();
    /// ```
    pub fn add_observer<Args, C>(&self, topic: Topic, callback: C) -> NotiflyResult<ObserverId>
    where
        Args: Payload,
        C: Callback<Args>,
    {
        self.add_erased(topic, Args::signature(), erase::<Args, C>(callback))
    }

    pub(crate) fn add_erased(
        &self,
        topic: Topic,
        signature: TypeSignature,
        callback: ErasedCallback,
    ) -> NotiflyResult<ObserverId> {
        let state = self.state.lock();
        let result = state.borrow_mut().add(topic, signature, callback);
        if let Err(e) = &result {
            warn!("Failed to add observer to notification {}: {}", topic, e);
        }
        result
    }

    /// Unregister one observer, then wait for its in-flight async callbacks.
    ///
    /// The observer stops receiving posts as soon as this is called; the id is
    /// released for reuse only once its queued and running callbacks are done.
    /// Calling this from inside a synchronous callback while that observer has
    /// async work that itself needs this center will deadlock.
    pub fn remove_observer(&self, id: ObserverId) -> NotiflyResult<()> {
        let topic = {
            let state = self.state.lock();
            let detached = state.borrow_mut().detach(id);
            detached.map_err(|e| {
                warn!("Cannot remove observer {}: not registered", id);
                e
            })?
        };

        // tickets are only issued under the lock, so none can start for `id` now
        if self.tracker.pending(id) > 0 {
            debug!("Waiting for async tasks of observer {}", id);
            self.tracker.wait_for(id);
        }

        self.state.lock().borrow_mut().release(id);
        debug!("Observer {} removed from notification {}", id, topic);
        Ok(())
    }

    /// Unregister every observer on `topic` and forget its signature.
    /// Returns how many were removed; an unknown topic removes nothing.
    pub fn remove_all_observers(&self, topic: Topic) -> usize {
        let ids = {
            let state = self.state.lock();
            let detached = state.borrow_mut().detach_topic(topic);
            detached
        };
        if ids.is_empty() {
            return 0;
        }

        self.tracker.wait_for_ids(&ids);

        {
            let state = self.state.lock();
            let mut registry = state.borrow_mut();
            for id in &ids {
                registry.release(*id);
            }
        }
        debug!("Removed {} observers from notification {}", ids.len(), topic);
        ids.len()
    }

    /// Change the number of async workers (minimum one)
    pub fn resize_thread_pool(&self, threads: usize) {
        let threads = threads.max(1);
        info!("Resizing notification worker pool to {} threads", threads);
        self.pool.resize(threads);
    }

    pub fn thread_pool_size(&self) -> usize {
        self.pool.size()
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub fn observer_count(&self, topic: Topic) -> usize {
        self.state.lock().borrow().observer_count(topic)
    }

    pub fn total_observers(&self) -> usize {
        self.state.lock().borrow().total_observers()
    }

    pub fn has_topic(&self, topic: Topic) -> bool {
        self.state.lock().borrow().signature(topic).is_some()
    }

    /// Topics with at least one observer, in no particular order
    pub fn topics(&self) -> Vec<Topic> {
        self.state.lock().borrow().topics()
    }

    /// Signature pinned on `topic`, if it has observers
    pub fn topic_signature(&self, topic: Topic) -> Option<TypeSignature> {
        self.state.lock().borrow().signature(topic).cloned()
    }

    /// Async callbacks queued or running
    pub fn pending_tasks(&self) -> usize {
        self.tracker.total_pending()
    }

    /// Block until every async callback posted so far has finished.
    /// Must not be called from inside an async callback of this center.
    pub fn wait_for_async_tasks(&self) {
        self.tracker.wait_for_all();
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NotificationCenter {
    fn drop(&mut self) {
        let pending = self.tracker.total_pending();
        if self.pool.is_worker_thread() {
            // the running task holds a ticket, and queued tasks may need this worker
            warn!(
                "Notification center dropped from its own worker; {} async tasks finish after teardown",
                pending
            );
        } else {
            if pending > 0 {
                debug!("Notification center waiting for {} async tasks", pending);
            }
            self.tracker.wait_for_all();
        }
        self.pool.shutdown(StopMode::Drain);

        let removed = self.state.get_mut().get_mut().clear();
        debug!("Notification center dropped ({} observers released)", removed);
    }
}
