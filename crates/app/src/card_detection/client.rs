//! HTTP client for the card detection upstream.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use reqwest::{Client, header::CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::card_detection::{
    CardCrypto, CardDetectionConfig, CardDetectionError, CardResult, CheckCardRequest,
    CheckCardResponse, CheckCardResultRequest, CheckCardResultResponse, ErrorKind,
    types::{EncryptedPayload, WireRequest},
};

const CHECK_CARD_PATH: &str = "/api/userApiManage/checkCard";
const CHECK_CARD_RESULT_PATH: &str = "/api/userApiManage/checkCardResult";

/// Signed and encrypted calls to the card detection upstream.
#[derive(Debug, Clone)]
pub struct CardDetectionClient {
    config: CardDetectionConfig,
    http: Client,
    crypto: CardCrypto,
}

impl CardDetectionClient {
    /// Build a client with a shared connection pool and the configured deadline.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be constructed.
    pub fn new(config: CardDetectionConfig) -> Result<Self, CardDetectionError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| {
                CardDetectionError::wrap(error, ErrorKind::ApiRequest, "failed to build HTTP client")
            })?;

        Ok(Self {
            crypto: CardCrypto::new(config.app_secret.clone()),
            config,
            http,
        })
    }

    #[must_use]
    pub fn config(&self) -> &CardDetectionConfig {
        &self.config
    }

    fn seal(&self, mut wire: WireRequest) -> Result<EncryptedPayload, CardDetectionError> {
        wire.sign = self.crypto.sign(&wire.sign_params());

        let plaintext = serde_json::to_string(&wire).map_err(|error| {
            CardDetectionError::wrap(
                error,
                ErrorKind::EncryptionFailed,
                "failed to encrypt request",
            )
        })?;

        let data = self.crypto.encrypt(&plaintext).map_err(|error| {
            CardDetectionError::wrap(
                error,
                ErrorKind::EncryptionFailed,
                "failed to encrypt request",
            )
        })?;

        Ok(EncryptedPayload { data })
    }

    async fn post<T>(&self, path: &str, payload: &EncryptedPayload) -> Result<T, CardDetectionError>
    where
        T: DeserializeOwned,
    {
        let body = serde_json::to_vec(payload).map_err(|error| {
            CardDetectionError::wrap(error, ErrorKind::ApiRequest, "failed to marshal request")
        })?;

        let url = format!("{}{path}", self.config.host);

        debug!(url = %url, "sending card detection request");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header("appId", &self.config.app_id)
            .body(body)
            .send()
            .await
            .map_err(|error| transport_error(error, "HTTP request failed"))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|error| transport_error(error, "failed to read response body"))?;

        serde_json::from_slice(&bytes).map_err(|error| {
            CardDetectionError::wrap(error, ErrorKind::ApiResponse, "failed to parse response")
        })
    }
}

fn transport_error(error: reqwest::Error, message: &str) -> CardDetectionError {
    if error.is_timeout() {
        return CardDetectionError::wrap(error, ErrorKind::Timeout, "request timeout");
    }

    let kind = if error.is_body() || error.is_decode() {
        ErrorKind::ApiResponse
    } else {
        ErrorKind::ApiRequest
    };

    CardDetectionError::wrap(error, kind, message)
}

fn now_timestamp() -> String {
    Timestamp::now().as_second().to_string()
}

#[async_trait]
impl CardDetectionApi for CardDetectionClient {
    fn validate_config(&self) -> Result<(), CardDetectionError> {
        self.config.validate()
    }

    async fn check_card(
        &self,
        request: &CheckCardRequest,
    ) -> Result<CheckCardResponse, CardDetectionError> {
        self.validate_config()?;
        request.validate()?;

        let payload = self.seal(WireRequest::for_check(request, now_timestamp()))?;

        self.post(CHECK_CARD_PATH, &payload).await
    }

    async fn check_card_result(
        &self,
        request: &CheckCardResultRequest,
    ) -> Result<CardResult, CardDetectionError> {
        self.validate_config()?;
        request.validate()?;

        let payload = self.seal(WireRequest::for_result(request, now_timestamp()))?;

        let response: CheckCardResultResponse = self.post(CHECK_CARD_RESULT_PATH, &payload).await?;

        if response.code != 200 {
            return Err(CardDetectionError::new(ErrorKind::ApiResponse, response.msg));
        }

        let plaintext = self.crypto.decrypt(&response.data).map_err(|error| {
            CardDetectionError::wrap(
                error,
                ErrorKind::DecryptionFailed,
                "failed to decrypt response data",
            )
        })?;

        serde_json::from_str(&plaintext).map_err(|error| {
            CardDetectionError::wrap(
                error,
                ErrorKind::ApiResponse,
                "failed to parse decrypted result",
            )
        })
    }
}

/// Upstream card detection operations.
#[automock]
#[async_trait]
pub trait CardDetectionApi: Send + Sync {
    /// Check that host, app id and secret are all configured.
    fn validate_config(&self) -> Result<(), CardDetectionError>;

    /// Submit a batch of cards. Validation failures never reach the network.
    async fn check_card(
        &self,
        request: &CheckCardRequest,
    ) -> Result<CheckCardResponse, CardDetectionError>;

    /// Fetch and decrypt the result for a single card.
    async fn check_card_result(
        &self,
        request: &CheckCardResultRequest,
    ) -> Result<CardResult, CardDetectionError>;
}
