//! Worker Pool Error Types

use thiserror::Error;

/// Result type for worker pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors that can occur when using the worker pool
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The pool was shut down and accepts no more tasks
    #[error("Worker pool has been stopped")]
    Stopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_error_display() {
        assert_eq!(PoolError::Stopped.to_string(), "Worker pool has been stopped");
    }
}
