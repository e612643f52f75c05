//! Content Generation
//!
//! - [`ChunkGenerator`]: one completion with retry and backoff
//! - [`SectionGenerator`]: the ordered chunks of one section

mod chunk;
mod section;

#[cfg(test)]
pub(crate) mod testing;

pub use chunk::{ChunkGenerator, ChunkRequest, Sleeper, TokioSleeper};
pub use section::{SectionGenerator, SectionOutput};

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::generation as gen_constants;

/// Model parameters and retry policy shared by every chunk of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Attempts per chunk; 0 behaves like 1
    pub max_retries: u32,
    /// Base delay for linear backoff
    #[serde(with = "duration_millis")]
    pub retry_delay: Duration,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: gen_constants::DEFAULT_MODEL.to_string(),
            temperature: gen_constants::DEFAULT_TEMPERATURE,
            max_tokens: gen_constants::DEFAULT_MAX_TOKENS,
            max_retries: gen_constants::DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(gen_constants::DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl GenerationSettings {
    /// Total attempts allowed per chunk
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Linear backoff after a failed attempt (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt)
    }

    /// Extended wait after a rate-limited attempt (1-based)
    pub fn rate_limit_wait(&self, attempt: u32) -> Duration {
        self.backoff(attempt)
            .saturating_mul(gen_constants::RATE_LIMIT_MULTIPLIER as u32)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule() {
        let settings = GenerationSettings {
            retry_delay: Duration::from_millis(100),
            ..Default::default()
        };
        assert_eq!(settings.backoff(1), Duration::from_millis(100));
        assert_eq!(settings.backoff(3), Duration::from_millis(300));
        assert_eq!(settings.rate_limit_wait(2), Duration::from_millis(400));
    }

    #[test]
    fn test_zero_retries_still_attempts_once() {
        let settings = GenerationSettings {
            max_retries: 0,
            ..Default::default()
        };
        assert_eq!(settings.max_attempts(), 1);
    }

    #[test]
    fn test_settings_serialize_delay_as_millis() {
        let json = serde_json::to_value(GenerationSettings::default()).unwrap();
        assert_eq!(json["retry_delay"], 2000);
    }
}
