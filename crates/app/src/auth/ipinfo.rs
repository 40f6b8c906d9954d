//! IP geolocation lookups for login session enrichment.

use std::{net::IpAddr, time::Duration};

use async_trait::async_trait;
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// Default lookup base URL.
pub const DEFAULT_IPINFO_BASE_URL: &str = "https://ipinfo.io";

/// Configuration for the lookup service.
#[derive(Debug, Clone)]
pub struct IpInfoConfig {
    /// Base URL, e.g. `"https://ipinfo.io"`.
    pub base_url: String,

    /// Access token sent as the `token` query parameter. Empty means anonymous.
    pub token: String,

    pub timeout: Duration,
}

impl Default for IpInfoConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_IPINFO_BASE_URL.to_string(),
            token: String::new(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Location details for a public address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IpDetails {
    #[serde(default)]
    pub ip: String,

    #[serde(default)]
    pub city: String,

    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub country: String,

    #[serde(default, rename = "loc")]
    pub location: String,

    #[serde(default, rename = "org")]
    pub organization: String,

    #[serde(default)]
    pub timezone: String,
}

/// Errors that can occur when looking up an address.
#[derive(Debug, Error)]
pub enum IpLookupError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned a non-2xx response.
    #[error("unexpected response from ip lookup: {0}")]
    UnexpectedResponse(String),

    /// Private, loopback or unparseable addresses are never sent upstream.
    #[error("address is not a public ip: {0}")]
    NotPublic(String),
}

#[automock]
#[async_trait]
pub trait IpLookup: Send + Sync {
    /// Resolve location details for `ip`.
    async fn lookup(&self, ip: &str) -> Result<IpDetails, IpLookupError>;
}

/// HTTP client for the lookup service.
#[derive(Debug, Clone)]
pub struct IpInfoClient {
    config: IpInfoConfig,
    http: Client,
}

impl IpInfoClient {
    /// Create a client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: IpInfoConfig) -> Result<Self, IpLookupError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            config: IpInfoConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            http,
        })
    }
}

#[async_trait]
impl IpLookup for IpInfoClient {
    async fn lookup(&self, ip: &str) -> Result<IpDetails, IpLookupError> {
        if !is_public(ip) {
            return Err(IpLookupError::NotPublic(ip.to_string()));
        }

        let url = format!("{}/{ip}", self.config.base_url);

        let mut request = self.http.get(&url);

        if !self.config.token.is_empty() {
            request = request.query(&[("token", self.config.token.as_str())]);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            return Err(IpLookupError::UnexpectedResponse(format!(
                "lookup failed with status {status}: {text}"
            )));
        }

        Ok(response.json().await?)
    }
}

fn is_public(ip: &str) -> bool {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        Ok(IpAddr::V6(v6)) => {
            !(v6.is_loopback() || v6.is_unspecified() || (v6.segments()[0] & 0xfe00) == 0xfc00)
        }
        Err(_) => false,
    }
}
