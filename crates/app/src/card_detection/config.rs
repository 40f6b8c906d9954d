//! Card detection client configuration.

use std::time::Duration;

use zeroize::Zeroizing;

use crate::card_detection::CardDetectionError;

/// Outbound deadline applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the card detection upstream.
#[derive(Debug, Clone)]
pub struct CardDetectionConfig {
    /// Base URL, e.g. `"https://upstream.example"`.
    pub host: String,

    /// Value sent in the `appId` header.
    pub app_id: String,

    /// Shared secret used for signing and as the DES key source.
    pub app_secret: Zeroizing<String>,

    /// Per-request deadline.
    pub timeout: Duration,
}

impl CardDetectionConfig {
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
            app_id: app_id.into(),
            app_secret: Zeroizing::new(app_secret.into()),
            timeout: timeout
                .filter(|timeout| !timeout.is_zero())
                .unwrap_or(DEFAULT_TIMEOUT),
        }
    }

    /// Check that every required setting is present.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfig` error naming the first missing setting.
    pub fn validate(&self) -> Result<(), CardDetectionError> {
        if self.host.is_empty() {
            return Err(CardDetectionError::missing_host());
        }

        if self.app_id.is_empty() {
            return Err(CardDetectionError::missing_app_id());
        }

        if self.app_secret.is_empty() {
            return Err(CardDetectionError::missing_app_secret());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let config = CardDetectionConfig::new("h", "a", "s", Some(Duration::ZERO));

        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn trailing_slash_is_trimmed_from_host() {
        let config = CardDetectionConfig::new("https://upstream.test/", "a", "s", None);

        assert_eq!(config.host, "https://upstream.test");
    }

    #[test]
    fn validate_reports_first_missing_setting() {
        let missing_host = CardDetectionConfig::new("", "", "", None);
        let missing_id = CardDetectionConfig::new("h", "", "", None);
        let missing_secret = CardDetectionConfig::new("h", "a", "", None);

        assert_eq!(
            missing_host.validate().map_err(|e| e.message().to_string()),
            Err("missing host configuration".to_string())
        );
        assert_eq!(
            missing_id.validate().map_err(|e| e.message().to_string()),
            Err("missing app ID configuration".to_string())
        );
        assert_eq!(
            missing_secret.validate().map_err(|e| e.code()),
            Err(1001)
        );
        assert!(CardDetectionConfig::new("h", "a", "s", None).validate().is_ok());
    }
}
