//! Notification Dispatch
//!
//! Posting validates the payload against the topic before anything runs, so a
//! rejected post invokes no observer at all. Synchronous posts run every
//! observer in registration order on the caller's thread while holding the
//! center's lock; async posts hand one task per observer to the worker pool.

use std::any::Any;

use log::{debug, error, trace, warn};

use crate::notifications::center::NotificationCenter;
use crate::notifications::error::NotiflyResult;
use crate::notifications::registry::{ObserverRegistry, PostSnapshot};
use crate::notifications::signature::Payload;
use crate::notifications::Topic;

impl NotificationCenter {
    /// Invoke every observer of `topic` with `args`, in registration order.
    /// Returns the number of observers invoked.
    pub fn post_notification<Args: Payload>(&self, topic: Topic, args: Args) -> NotiflyResult<usize> {
        let state = self.state.lock();
        let snapshot = snapshot_for::<Args>(topic, &state.borrow())?;

        let count = snapshot.observers.len();
        debug!("Posting notification {} to {} observers", topic, count);

        // the registry is not borrowed here, so observers may re-enter the center
        let payload: &dyn Any = &args;
        for (id, callback) in &snapshot.observers {
            trace!("Notification {} -> observer {}", topic, id);
            callback(payload);
        }

        drop(state);
        Ok(count)
    }

    /// Queue one task per observer of `topic` and return without waiting.
    /// Each task gets its own copy of `args`.
    pub fn post_notification_async<Args: Payload>(&self, topic: Topic, args: Args) -> NotiflyResult<usize> {
        let tasks: Vec<_> = {
            let state = self.state.lock();
            let snapshot = snapshot_for::<Args>(topic, &state.borrow())?;
            snapshot
                .observers
                .into_iter()
                .map(|(id, callback)| (self.tracker.begin(id), callback))
                .collect()
        };

        let count = tasks.len();
        debug!("Posting notification {} asynchronously to {} observers", topic, count);

        for (ticket, callback) in tasks {
            let payload = args.clone();
            let submitted = self.pool.submit(move || {
                trace!("Async notification {} -> observer {}", topic, ticket.observer_id());
                callback(&payload as &dyn Any);
                drop(ticket);
            });
            if let Err(e) = submitted {
                // the rejected task, and its ticket, were dropped with the error
                error!("Failed to queue notification {}: {}", topic, e);
            }
        }

        Ok(count)
    }
}

fn snapshot_for<Args: Payload>(topic: Topic, registry: &ObserverRegistry) -> NotiflyResult<PostSnapshot> {
    registry.snapshot_for_post(topic, &Args::signature()).map_err(|e| {
        warn!("Post to notification {} rejected: {}", topic, e);
        e
    })
}
