//! Notification Engine Error Types
//!
//! Every failure the engine reports is an ordinary value. Each variant maps to a
//! stable negative integer so adapters can hand results across an untyped boundary.

use thiserror::Error;

use crate::notifications::ids::ObserverId;
use crate::notifications::signature::TypeSignature;
use crate::notifications::Topic;

/// Result type for notification operations
pub type NotiflyResult<T> = Result<T, NotiflyError>;

/// Errors that can occur in the notification engine
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotiflyError {
    /// No live observer carries this id
    #[error("Observer {0} not found")]
    ObserverNotFound(ObserverId),

    /// Nothing observes this topic
    #[error("Notification {0} does not exist")]
    NotificationNotFound(Topic),

    /// Callback or payload shape disagrees with the topic's pinned signature
    #[error("Payload type mismatch on notification {topic}: expected {expected}, found {found}")]
    PayloadTypeMismatch {
        topic: Topic,
        expected: TypeSignature,
        found: TypeSignature,
    },

    /// The id space is exhausted and nothing has been released for reuse
    #[error("No more observer IDs available")]
    NoMoreObserverIds,

    /// No response arrived on the wait topic in time
    #[error("Timed out after {duration_ms}ms waiting on notification {topic}")]
    Timeout { topic: Topic, duration_ms: u64 },
}

impl NotiflyError {
    /// Create a payload type mismatch error
    pub fn payload_type_mismatch(topic: Topic, expected: TypeSignature, found: TypeSignature) -> Self {
        Self::PayloadTypeMismatch { topic, expected, found }
    }

    /// Create a timeout error
    pub fn timeout(topic: Topic, duration_ms: u64) -> Self {
        Self::Timeout { topic, duration_ms }
    }

    /// The stable result code for this error
    pub fn result_code(&self) -> ResultCode {
        match self {
            NotiflyError::ObserverNotFound(_) => ResultCode::ObserverNotFound,
            NotiflyError::NotificationNotFound(_) => ResultCode::NotificationNotFound,
            NotiflyError::PayloadTypeMismatch { .. } => ResultCode::PayloadTypeMismatch,
            NotiflyError::NoMoreObserverIds => ResultCode::NoMoreObserverIds,
            NotiflyError::Timeout { .. } => ResultCode::Timeout,
        }
    }

    /// Shorthand for `self.result_code().code()`
    pub fn code(&self) -> i32 {
        self.result_code().code()
    }
}

/// Stable integer result codes shared with the untyped bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ResultCode {
    Success = 0,
    ObserverNotFound = -1,
    NotificationNotFound = -2,
    PayloadTypeMismatch = -3,
    NoMoreObserverIds = -4,
    InvalidHandle = -5,
    Timeout = -6,
}

impl ResultCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(ResultCode::Success),
            -1 => Some(ResultCode::ObserverNotFound),
            -2 => Some(ResultCode::NotificationNotFound),
            -3 => Some(ResultCode::PayloadTypeMismatch),
            -4 => Some(ResultCode::NoMoreObserverIds),
            -5 => Some(ResultCode::InvalidHandle),
            -6 => Some(ResultCode::Timeout),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResultCode::Success => "Success",
            ResultCode::ObserverNotFound => "Observer not found",
            ResultCode::NotificationNotFound => "Notification not found",
            ResultCode::PayloadTypeMismatch => "Payload type mismatch",
            ResultCode::NoMoreObserverIds => "No more observer IDs available",
            ResultCode::InvalidHandle => "Invalid handle",
            ResultCode::Timeout => "Timeout",
        }
    }
}

/// Diagnostic string for any integer result, including unknown ones
pub fn result_to_string(code: i32) -> &'static str {
    ResultCode::from_code(code)
        .map(ResultCode::as_str)
        .unwrap_or("Unknown error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_codes_are_stable() {
        assert_eq!(ResultCode::Success.code(), 0);
        assert_eq!(NotiflyError::ObserverNotFound(ObserverId::new(3).unwrap()).code(), -1);
        assert_eq!(NotiflyError::NotificationNotFound(42).code(), -2);
        assert_eq!(NotiflyError::NoMoreObserverIds.code(), -4);
        assert_eq!(NotiflyError::timeout(7, 100).code(), -6);
    }

    #[test]
    fn test_result_to_string() {
        assert_eq!(result_to_string(0), "Success");
        assert_eq!(result_to_string(-1), "Observer not found");
        assert_eq!(result_to_string(-2), "Notification not found");
        assert_eq!(result_to_string(-3), "Payload type mismatch");
        assert_eq!(result_to_string(-4), "No more observer IDs available");
        assert_eq!(result_to_string(-5), "Invalid handle");
        assert_eq!(result_to_string(-6), "Timeout");
        assert_eq!(result_to_string(999), "Unknown error");
    }

    #[test]
    fn test_error_display() {
        let error = NotiflyError::NotificationNotFound(42);
        assert_eq!(error.to_string(), "Notification 42 does not exist");

        let error = NotiflyError::timeout(2, 100);
        assert_eq!(error.to_string(), "Timed out after 100ms waiting on notification 2");
    }
}
