//! Application constants and configuration defaults
//!
//! Centralized location for magic numbers and default values

use std::time::Duration;

/// HTTP client configuration
pub mod http {
    use super::*;

    /// Connection timeout for HTTP requests
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Overall timeout for a generation request. Full HTML documents can
    /// take a while to come back, but the call must not hang forever.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);
}

/// AI/LLM configuration
pub mod ai {
    /// Default maximum output tokens (a full single-file app fits in 8K)
    pub const MAX_OUTPUT_TOKENS: usize = 8192;

    /// Default model ID
    pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
}

/// Local app configuration
pub mod app {
    /// Config directory name
    pub const CONFIG_DIR_NAME: &str = ".appforge";

    /// Database file name
    pub const DATABASE_FILE_NAME: &str = "appforge.db";

    /// Exports subdirectory name
    pub const EXPORTS_DIR_NAME: &str = "exports";
}
