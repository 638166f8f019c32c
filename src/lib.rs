//! notifly
//!
//! An in-process typed publish/subscribe notification center. Observers are
//! registered on integer topics and invoked synchronously on the posting thread
//! or asynchronously on a resizable worker pool; every topic enforces a single
//! payload signature at runtime.

pub mod bridge;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod notifications;
pub mod pool;
pub mod version;

pub use notifications::{
    result_to_string, CenterConfig, NotificationCenter, NotiflyError, NotiflyResult, ObserverId, ResultCode,
    Topic,
};
