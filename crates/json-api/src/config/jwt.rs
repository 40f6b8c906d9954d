//! JWT Config

use std::time::Duration;

use clap::Args;
use trusioo_app::auth::TokenSettings;
use zeroize::Zeroizing;

/// Access and refresh token signing settings.
#[derive(Debug, Args)]
pub struct JwtConfig {
    /// Secret used to sign access tokens
    #[arg(long = "jwt-secret", env = "JWT_SECRET", hide_env_values = true)]
    pub access_secret: String,

    /// Secret used to sign refresh tokens
    #[arg(
        long = "jwt-refresh-secret",
        env = "JWT_REFRESH_SECRET",
        hide_env_values = true
    )]
    pub refresh_secret: String,

    /// Access token lifetime in seconds
    #[arg(
        long = "jwt-access-expire",
        env = "JWT_ACCESS_EXPIRE",
        default_value_t = 7200
    )]
    pub access_expire_seconds: u64,

    /// Refresh token lifetime in seconds
    #[arg(
        long = "jwt-refresh-expire",
        env = "JWT_REFRESH_EXPIRE",
        default_value_t = 604_800
    )]
    pub refresh_expire_seconds: u64,
}

impl JwtConfig {
    #[must_use]
    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            access_secret: Zeroizing::new(self.access_secret.clone()),
            refresh_secret: Zeroizing::new(self.refresh_secret.clone()),
            access_ttl: Duration::from_secs(self.access_expire_seconds),
            refresh_ttl: Duration::from_secs(self.refresh_expire_seconds),
        }
    }
}
