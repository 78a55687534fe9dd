//! Timeout enforcement.
//!
//! # Responsibilities
//! - Race an arbitrary future against a timer
//! - Report expiry with a caller-supplied, already-safe message
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Expiry abandons the pending future; it is not cancelled and may run
//!   to completion with its result discarded

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Timer expiry.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TimeoutError {
    pub message: String,
    pub limit: Duration,
}

/// Await `fut` for at most `limit`; on expiry return a `TimeoutError`
/// carrying `message`.
pub async fn with_timeout<T>(
    fut: impl Future<Output = T>,
    limit: Duration,
    message: &str,
) -> Result<T, TimeoutError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(value) => Ok(value),
        Err(_) => Err(TimeoutError {
            message: message.to_string(),
            limit,
        }),
    }
}
