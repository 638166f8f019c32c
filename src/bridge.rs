//! Untyped Bridge
//!
//! Handle-based adapter for callers that cannot use the generic API: every
//! observer has the same fixed callback shape, every payload is an opaque
//! shared value, and every entry point returns a plain integer (an id or count
//! when non-negative, a [`ResultCode`] otherwise).
//!
//! All bridge topics carry the single payload shape `(UntypedPayload,)`, so a
//! typed observer of any other shape on the same topic is rejected by the engine.
//!
//! ```
//! use notifly::bridge::{self, UntypedPayload, UserData};
//! use notifly::notifications::Topic;
//! use std::sync::Arc;
//!
//! fn on_event(topic: Topic, data: UntypedPayload, _user: UserData) {
//!     let value = data.and_then(|d| d.downcast_ref::<u32>().copied());
//!     println!("notification {} carried {:?}", topic, value);
//! }
//!
//! let handle = bridge::create();
//! let id = bridge::add_observer(handle, 5, Some(on_event), None);
//! assert!(id > 0);
//! assert_eq!(bridge::post_notification(handle, 5, Some(Arc::new(7u32))), 1);
//! assert_eq!(bridge::destroy(handle), 0);
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::notifications::{NotificationCenter, NotiflyError, ObserverId, ResultCode, Topic};

pub use crate::notifications::result_to_string;

/// Opaque payload handed through the bridge
pub type UntypedPayload = Option<Arc<dyn Any + Send + Sync>>;

/// Caller context passed back to the callback unchanged
pub type UserData = Option<Arc<dyn Any + Send + Sync>>;

/// Fixed observer shape: topic, payload and the user data given at registration
pub type RawCallback = fn(Topic, UntypedPayload, UserData);

/// Opaque reference to a notification center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    /// Raw value, stable for the lifetime of the handle
    pub fn as_raw(self) -> u64 {
        self.0
    }
}

const DEFAULT_HANDLE: Handle = Handle(0);

struct Instances {
    next: AtomicU64,
    centers: Mutex<HashMap<Handle, Arc<NotificationCenter>>>,
}

fn instances() -> &'static Instances {
    static INSTANCES: OnceLock<Instances> = OnceLock::new();
    INSTANCES.get_or_init(|| Instances {
        next: AtomicU64::new(1),
        centers: Mutex::new(HashMap::new()),
    })
}

/// Run `f` against the center behind `handle`
fn with_center<R>(handle: Handle, f: impl FnOnce(&NotificationCenter) -> R) -> Option<R> {
    if handle == DEFAULT_HANDLE {
        return Some(f(NotificationCenter::default_center()));
    }

    // the map lock is released before `f` runs; observers may use the bridge
    let center = instances().centers.lock().get(&handle).cloned();
    match center {
        Some(center) => Some(f(&center)),
        None => {
            warn!("Bridge call with unknown handle {}", handle.0);
            None
        }
    }
}

fn invalid_handle() -> i32 {
    ResultCode::InvalidHandle.code()
}

fn to_code(result: Result<usize, NotiflyError>) -> i32 {
    match result {
        Ok(count) => i32::try_from(count).unwrap_or(i32::MAX),
        Err(e) => e.code(),
    }
}

/// Create an independent center and return its handle
pub fn create() -> Handle {
    let handles = instances();
    let handle = Handle(handles.next.fetch_add(1, Ordering::Relaxed));
    handles
        .centers
        .lock()
        .insert(handle, Arc::new(NotificationCenter::new()));
    debug!("Bridge handle {} created", handle.0);
    handle
}

/// Handle of the shared default center. It is never destroyed.
pub fn default_handle() -> Handle {
    DEFAULT_HANDLE
}

/// Destroy a center created with [`create`], waiting for its async callbacks.
pub fn destroy(handle: Handle) -> i32 {
    if handle == DEFAULT_HANDLE {
        warn!("The default bridge handle cannot be destroyed");
        return invalid_handle();
    }

    let removed = instances().centers.lock().remove(&handle);
    match removed {
        Some(center) => {
            // teardown runs here unless a concurrent bridge call still holds a clone
            drop(center);
            debug!("Bridge handle {} destroyed", handle.0);
            ResultCode::Success.code()
        }
        None => invalid_handle(),
    }
}

/// Register `callback` on `topic`; returns the observer id or a negative code
pub fn add_observer(handle: Handle, topic: Topic, callback: Option<RawCallback>, user_data: UserData) -> i32 {
    let Some(callback) = callback else {
        warn!("Bridge observer for notification {} has no callback", topic);
        return invalid_handle();
    };

    with_center(handle, |center| {
        let result = center.add_observer(topic, move |data: UntypedPayload| {
            callback(topic, data, user_data.clone())
        });
        match result {
            Ok(id) => id.as_i32(),
            Err(e) => e.code(),
        }
    })
    .unwrap_or_else(invalid_handle)
}

pub fn remove_observer(handle: Handle, observer_id: i32) -> i32 {
    with_center(handle, |center| {
        let Some(id) = ObserverId::from_raw(i64::from(observer_id)) else {
            return ResultCode::ObserverNotFound.code();
        };
        match center.remove_observer(id) {
            Ok(()) => ResultCode::Success.code(),
            Err(e) => e.code(),
        }
    })
    .unwrap_or_else(invalid_handle)
}

/// Returns the number of observers removed, zero for an unknown topic
pub fn remove_all_observers(handle: Handle, topic: Topic) -> i32 {
    with_center(handle, |center| to_code(Ok(center.remove_all_observers(topic)))).unwrap_or_else(invalid_handle)
}

pub fn post_notification(handle: Handle, topic: Topic, data: UntypedPayload) -> i32 {
    with_center(handle, |center| to_code(center.post_notification(topic, (data,)))).unwrap_or_else(invalid_handle)
}

pub fn post_notification_async(handle: Handle, topic: Topic, data: UntypedPayload) -> i32 {
    with_center(handle, |center| to_code(center.post_notification_async(topic, (data,))))
        .unwrap_or_else(invalid_handle)
}

/// Post `data` on `post_topic` and store the first payload seen on `wait_topic`
/// in `response`. Returns `Success` or a negative code; a missing response slot
/// counts as an invalid handle.
pub fn post_and_wait(
    handle: Handle,
    post_topic: Topic,
    wait_topic: Topic,
    timeout_ms: u64,
    response: Option<&mut UntypedPayload>,
    data: UntypedPayload,
) -> i32 {
    let Some(response) = response else {
        warn!("Bridge post_and_wait without a response slot");
        return invalid_handle();
    };

    with_center(handle, |center| {
        let result = center.post_and_wait::<(UntypedPayload,), (UntypedPayload,)>(
            post_topic,
            wait_topic,
            Duration::from_millis(timeout_ms),
            (data,),
        );
        match result {
            Ok((payload,)) => {
                *response = payload;
                ResultCode::Success.code()
            }
            Err(e) => e.code(),
        }
    })
    .unwrap_or_else(invalid_handle)
}
