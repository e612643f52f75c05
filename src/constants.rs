//! Global Constants
//!
//! Centralized constants for configuration and tuning.
//! All magic numbers should be defined here with documentation.

/// Generation defaults
pub mod generation {
    /// Default model identifier
    pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

    /// Default sampling temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    /// Default completion token cap per chunk
    pub const DEFAULT_MAX_TOKENS: u32 = 4000;

    /// Default attempts per chunk
    pub const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Base delay for linear backoff (milliseconds)
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;

    /// Multiplier applied on top of the linear backoff when rate limited
    pub const RATE_LIMIT_MULTIPLIER: u64 = 2;
}

/// Output layout
pub mod output {
    /// Separator placed between chunks in the combined section text
    pub const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

    /// Default output directory
    pub const DEFAULT_OUTPUT_DIR: &str = "output";

    /// Default root folder inside the output directory
    pub const DEFAULT_ROOT_FOLDER: &str = "content-bundle";

    /// Archive file extension
    pub const ARCHIVE_EXTENSION: &str = "zip";

    /// Suffix of the master archive (`<root>_complete.zip`)
    pub const MASTER_ARCHIVE_SUFFIX: &str = "_complete";

    /// Suffix of the in-progress combined text file
    pub const PARTIAL_SUFFIX: &str = "part";

    /// Default deflate level (0-9)
    pub const DEFAULT_COMPRESSION_LEVEL: i64 = 9;
}

/// Pricing constants (USD per 1K tokens)
pub mod pricing {
    /// Version tag of the built-in pricing table
    pub const TABLE_VERSION: &str = "2024-11";

    /// Conservative input rate for unknown models
    pub const FALLBACK_INPUT_PER_1K: f64 = 0.03;

    /// Conservative output rate for unknown models
    pub const FALLBACK_OUTPUT_PER_1K: f64 = 0.06;
}

/// HTTP/Network constants
pub mod network {
    /// Default request timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

    /// Default OpenAI-compatible endpoint
    pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
}

/// Environment variables
pub mod env {
    pub const API_KEY: &str = "OPENAI_API_KEY";
    pub const MODEL: &str = "BUNDLEGEN_MODEL";
    pub const OUTPUT_DIR: &str = "BUNDLEGEN_OUTPUT_DIR";
    pub const VERBOSE: &str = "BUNDLEGEN_VERBOSE";

    /// Prefix for figment environment overrides (`BUNDLEGEN_GENERATION__MAX_TOKENS`)
    pub const CONFIG_PREFIX: &str = "BUNDLEGEN_";
}

/// Render defaults
pub mod render {
    /// Default HTML-to-PDF command
    pub const DEFAULT_COMMAND: &str = "wkhtmltopdf";

    /// Render timeout (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
}

/// Credential storage
pub mod credentials {
    /// Key under which the API key is stored
    pub const API_KEY_ENTRY: &str = "openai_api_key";

    /// File name inside the user config directory
    pub const FILE_NAME: &str = "credentials.json";
}
