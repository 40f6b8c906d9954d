//! IP Lookup Config

use std::time::Duration;

use clap::Args;
use trusioo_app::auth::IpInfoConfig;

/// Login session geolocation settings.
#[derive(Debug, Args)]
pub struct IpInfoSettings {
    /// Enrich login sessions with IP geolocation
    #[arg(
        id = "ipinfo-enabled",
        long = "ipinfo-enabled",
        env = "IPINFO_ENABLED",
        default_value_t = false
    )]
    pub enabled: bool,

    /// Lookup service base URL
    #[arg(
        long = "ipinfo-base-url",
        env = "IPINFO_BASE_URL",
        default_value = "https://ipinfo.io"
    )]
    pub base_url: String,

    /// Lookup service access token
    #[arg(
        long = "ipinfo-token",
        env = "IPINFO_TOKEN",
        default_value = "",
        hide_env_values = true
    )]
    pub token: String,

    /// Lookup deadline in seconds
    #[arg(
        id = "ipinfo-timeout",
        long = "ipinfo-timeout",
        env = "IPINFO_TIMEOUT_SECONDS",
        default_value_t = 5
    )]
    pub timeout_seconds: u64,
}

impl IpInfoSettings {
    #[must_use]
    pub fn client_config(&self) -> Option<IpInfoConfig> {
        self.enabled.then(|| IpInfoConfig {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
        })
    }
}
