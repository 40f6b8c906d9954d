//! Server configuration module

use clap::Parser;
use trusioo_app::context::AppSettings;

use crate::config::{
    card_detection::CardDetectionSettings,
    db::DatabaseConfig,
    ipinfo::IpInfoSettings,
    jwt::JwtConfig,
    limits::{RateLimitConfig, RequestConfig},
    logging::LoggingConfig,
    observability::ObservabilityConfig,
    server::ServerRuntimeConfig,
    verification::VerificationConfig,
};

pub(crate) mod card_detection;
pub(crate) mod db;
pub(crate) mod ipinfo;
pub(crate) mod jwt;
pub(crate) mod limits;
pub(crate) mod logging;
pub(crate) mod observability;
pub(crate) mod server;
pub(crate) mod verification;

/// Trusioo JSON API Server configuration
#[derive(Debug, Parser)]
#[command(name = "trusioo-json", about = "Trusioo JSON API Server", long_about = None)]
pub struct ServerConfig {
    /// Server network settings.
    #[command(flatten)]
    pub server: ServerRuntimeConfig,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// Observability (traces/metrics) settings.
    #[command(flatten)]
    pub observability: ObservabilityConfig,

    /// Application database settings.
    #[command(flatten)]
    pub database: DatabaseConfig,

    /// Token signing settings.
    #[command(flatten)]
    pub jwt: JwtConfig,

    /// Verification code settings.
    #[command(flatten)]
    pub verification: VerificationConfig,

    /// Request quotas.
    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    /// Request deadline and body size.
    #[command(flatten)]
    pub request: RequestConfig,

    /// Upstream card detection settings.
    #[command(flatten)]
    pub card_detection: CardDetectionSettings,

    /// IP geolocation settings.
    #[command(flatten)]
    pub ipinfo: IpInfoSettings,
}

impl ServerConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }

    /// Get the socket address for binding
    #[must_use]
    pub fn socket_addr(&self) -> String {
        self.server.socket_addr()
    }

    /// Settings handed to the application services.
    #[must_use]
    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            pool: self.database.pool_settings(),
            tokens: self.jwt.token_settings(),
            verification: self.verification.settings(),
            card_detection: self.card_detection.client_config(),
            ipinfo: self.ipinfo.client_config(),
        }
    }
}
