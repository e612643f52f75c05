pub mod error;

pub use error::{BundleError, ErrorCategory, ErrorClassifier, IoContext, LlmError, Result};

// =============================================================================
// Domain Newtypes
// =============================================================================

use serde::Serialize;
use std::fmt;

/// Type-safe wrapper for build run IDs
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RunId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
