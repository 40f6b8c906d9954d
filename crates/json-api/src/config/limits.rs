//! Rate Limit & Request Config

use std::time::Duration;

use clap::Args;

/// Per-client request quotas.
#[derive(Debug, Args)]
pub struct RateLimitConfig {
    /// Requests allowed per window on every route
    #[arg(long, env = "RATE_LIMIT_REQUESTS", default_value_t = 100)]
    pub requests: usize,

    /// Length of the global window in seconds
    #[arg(long, env = "RATE_LIMIT_WINDOW_SECONDS", default_value_t = 60)]
    pub window_seconds: u32,

    /// Requests allowed per window on credential and code routes
    #[arg(long, env = "AUTH_RATE_LIMIT_REQUESTS", default_value_t = 10)]
    pub auth_requests: usize,

    /// Length of the credential route window in seconds
    #[arg(long, env = "AUTH_RATE_LIMIT_WINDOW_SECONDS", default_value_t = 60)]
    pub auth_window_seconds: u32,
}

/// Request handling limits.
#[derive(Debug, Args)]
pub struct RequestConfig {
    /// Deadline for a whole request, in seconds
    #[arg(
        long = "request-timeout",
        env = "REQUEST_TIMEOUT_SECONDS",
        default_value_t = 30
    )]
    pub timeout_seconds: u64,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "REQUEST_MAX_BODY_SIZE", default_value_t = 10 * 1024 * 1024)]
    pub max_body_size: u64,
}

impl RequestConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}
