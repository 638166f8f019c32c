//! Typed Pub/Sub Notification Engine
//!
//! Producers post payloads on integer topics; observers registered on a topic
//! are invoked synchronously on the posting thread or asynchronously on the
//! center's worker pool.
//!
//! # Architecture
//!
//! - **Signatures**: every topic accepts one payload shape, pinned by its first observer
//! - **Registry**: topic -> observers in registration order, plus the id index
//! - **Dispatch**: sync and async posting, both validated before any callback runs
//! - **Tracker**: in-flight async work per observer, awaited by removal and teardown
//! - **Correlator**: `post_and_wait` request/response on top of the above
//!
//! # Example Usage
//!
//! ```
//! use notifly::notifications::{NotificationCenter, NotiflyError};
//!
//! let center = NotificationCenter::new();
//! center.add_observer(7, |name: String| println!("hello {}", name)).unwrap();
//!
//! assert_eq!(center.post_notification(7, ("world".to_string(),)).unwrap(), 1);
//! assert!(matches!(
//!     center.post_notification(7, (42,)),
//!     Err(NotiflyError::PayloadTypeMismatch { .. })
//! ));
//! ```

pub mod callback;
pub mod center;
mod correlator;
mod dispatch;
pub mod error;
pub mod ids;
pub(crate) mod registry;
pub mod signature;
pub mod tracker;


pub use callback::Callback;
pub use center::{CenterConfig, NotificationCenter};
pub use error::{result_to_string, NotiflyError, NotiflyResult, ResultCode};
pub use ids::ObserverId;
pub use signature::{signature_of, Payload, TypeDescriptor, TypeSignature};

/// Notification topic key
pub type Topic = i32;
