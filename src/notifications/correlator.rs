//! Request / Response Correlation
//!
//! `post_and_wait` turns a fire-and-forget post into a call: a single-use
//! observer on the wait topic fulfils a one-slot promise, and the caller waits
//! on it with a timeout. The temporary observer is removed exactly once on
//! every path out of the call.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use log::{debug, warn};

use crate::notifications::callback::ErasedCallback;
use crate::notifications::center::NotificationCenter;
use crate::notifications::error::{NotiflyError, NotiflyResult};
use crate::notifications::ids::ObserverId;
use crate::notifications::signature::Payload;
use crate::notifications::Topic;

/// Temporary observer, removed when dropped
struct ResponseObserver<'a> {
    center: &'a NotificationCenter,
    id: ObserverId,
}

impl Drop for ResponseObserver<'_> {
    fn drop(&mut self) {
        match self.center.remove_observer(self.id) {
            Ok(()) => {}
            // someone cleared the wait topic under us
            Err(NotiflyError::ObserverNotFound(_)) => {}
            Err(e) => warn!("Failed to remove response observer {}: {}", self.id, e),
        }
    }
}

impl NotificationCenter {
    /// Post `args` on `post_topic`, then wait up to `timeout` for the first
    /// notification on `wait_topic` and return its payload.
    ///
    /// Fails with the registration error if `Resp` conflicts with the wait
    /// topic's signature, with the post error if the post is rejected, and with
    /// `Timeout` when nothing arrives in time. The post itself is not undone.
    ///
    /// ```
    /// use notifly::NotificationCenter;
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// let center = Arc::new(NotificationCenter::new());
    /// let responder = Arc::clone(&center);
    /// center
    ///     .add_observer(1, move |a: i32, b: i32| {
    ///         responder.post_notification_async(2, (a + b,)).unwrap();
    ///     })
    ///     .unwrap();
    ///
    /// let (sum,): (i32,) = center
    ///     .post_and_wait(1, 2, Duration::from_millis(500), (20, 22))
    ///     .unwrap();
    /// assert_eq!(sum, 42);
    /// # center.remove_all_observers(1);
    /// ```
    pub fn post_and_wait<Args, Resp>(
        &self,
        post_topic: Topic,
        wait_topic: Topic,
        timeout: Duration,
        args: Args,
    ) -> NotiflyResult<Resp>
    where
        Args: Payload,
        Resp: Payload,
    {
        let (promise, response) = crossbeam_channel::bounded::<Resp>(1);

        let fulfil: ErasedCallback = Arc::new(move |payload: &dyn Any| {
            if let Some(value) = payload.downcast_ref::<Resp>() {
                // only the first response fits; later ones are dropped
                let _ = promise.try_send(value.clone());
            }
        });

        let id = self.add_erased(wait_topic, Resp::signature(), fulfil)?;
        let _observer = ResponseObserver { center: self, id };
        debug!(
            "Waiting up to {:?} on notification {} (observer {})",
            timeout, wait_topic, id
        );

        let count = self.post_notification(post_topic, args)?;
        if count == 0 {
            return Err(NotiflyError::NotificationNotFound(post_topic));
        }

        match response.recv_timeout(timeout) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                warn!("No response on notification {} within {:?}", wait_topic, timeout);
                Err(NotiflyError::timeout(
                    wait_topic,
                    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                ))
            }
        }
    }
}
