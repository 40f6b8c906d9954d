//! Card Detection Config

use std::time::Duration;

use clap::Args;
use trusioo_app::card_detection::CardDetectionConfig;

/// Upstream card detection settings.
#[derive(Debug, Args)]
pub struct CardDetectionSettings {
    /// Enable the card detection endpoints
    #[arg(
        id = "card-detection-enabled",
        long = "card-detection-enabled",
        env = "CARD_DETECTION_ENABLED",
        default_value_t = false
    )]
    pub enabled: bool,

    /// Upstream base URL
    #[arg(
        id = "card-detection-host",
        long = "card-detection-host",
        env = "CARD_DETECTION_HOST",
        default_value = ""
    )]
    pub host: String,

    /// Value of the `appId` header
    #[arg(
        long = "card-detection-app-id",
        env = "CARD_DETECTION_APP_ID",
        default_value = ""
    )]
    pub app_id: String,

    /// Shared signing and encryption secret
    #[arg(
        long = "card-detection-app-secret",
        env = "CARD_DETECTION_APP_SECRET",
        default_value = "",
        hide_env_values = true
    )]
    pub app_secret: String,

    /// Per-call deadline in seconds
    #[arg(
        id = "card-detection-timeout",
        long = "card-detection-timeout",
        env = "CARD_DETECTION_TIMEOUT_SECONDS",
        default_value_t = 30
    )]
    pub timeout_seconds: u64,
}

impl CardDetectionSettings {
    /// `None` when the endpoints are switched off.
    ///
    /// Missing host or credentials are not rejected here; the service reports them
    /// through its status endpoint.
    #[must_use]
    pub fn client_config(&self) -> Option<CardDetectionConfig> {
        self.enabled.then(|| {
            CardDetectionConfig::new(
                self.host.clone(),
                self.app_id.clone(),
                self.app_secret.clone(),
                Some(Duration::from_secs(self.timeout_seconds)),
            )
        })
    }
}
