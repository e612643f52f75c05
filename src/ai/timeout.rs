//! Operation Timeouts
//!
//! Bounds on the two slow external calls the pipeline makes:
//! completion requests and PDF renders.
//!
//! ```ignore
//! let response = with_timeout(
//!     timeouts.completion,
//!     provider.generate(&request),
//!     "completion request",
//! ).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use crate::constants::{network, render};
use crate::types::{BundleError, Result};

/// Per-operation timeout settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// One completion request (default: 5 minutes)
    pub completion: Duration,
    /// One HTML-to-PDF render (default: 2 minutes)
    pub render: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            completion: Duration::from_secs(network::DEFAULT_TIMEOUT_SECS),
            render: Duration::from_secs(render::DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl TimeoutConfig {
    pub fn new(completion_secs: u64, render_secs: u64) -> Self {
        Self {
            completion: Duration::from_secs(completion_secs),
            render: Duration::from_secs(render_secs),
        }
    }
}

/// Execute an async operation with a timeout
///
/// Elapsed timeouts surface as `BundleError::Timeout`, which the chunk
/// generator treats as an ordinary retryable failure.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(BundleError::timeout(operation_name, timeout)),
    }
}
