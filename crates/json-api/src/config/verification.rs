//! Verification Code Config

use std::time::Duration;

use clap::Args;
use trusioo_app::verification::VerificationSettings;

/// Verification code issuance settings.
#[derive(Debug, Args)]
pub struct VerificationConfig {
    /// How long an issued code stays valid, in seconds
    #[arg(long, env = "VERIFICATION_CODE_TTL_SECONDS", default_value_t = 600)]
    pub code_ttl_seconds: u64,

    /// Minimum gap between two codes for the same target and purpose, in seconds
    #[arg(long, env = "VERIFICATION_SEND_COOLDOWN_SECONDS", default_value_t = 60)]
    pub send_cooldown_seconds: u64,

    /// Failed attempts tolerated before verification is blocked
    #[arg(long, env = "VERIFICATION_MAX_ATTEMPTS", default_value_t = 5)]
    pub max_attempts: u32,

    /// Interval of the expired code sweep, in seconds
    #[arg(
        long,
        env = "VERIFICATION_SWEEP_INTERVAL_SECONDS",
        default_value_t = 300
    )]
    pub sweep_interval_seconds: u64,
}

impl VerificationConfig {
    #[must_use]
    pub fn settings(&self) -> VerificationSettings {
        VerificationSettings {
            code_ttl: Duration::from_secs(self.code_ttl_seconds),
            send_cooldown: Duration::from_secs(self.send_cooldown_seconds),
            max_attempts: self.max_attempts,
            sweep_interval: Duration::from_secs(self.sweep_interval_seconds),
        }
    }
}
