//! Card detection errors.

use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
};

type Cause = Box<dyn StdError + Send + Sync + 'static>;

/// Stable error families of the upstream protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidConfig,
    InvalidRequest,
    EncryptionFailed,
    DecryptionFailed,
    SignatureFailed,
    ApiRequest,
    ApiResponse,
    Timeout,
    UnsupportedRegion,
    InvalidCardFormat,
}

impl ErrorKind {
    /// Numeric code reported to clients.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::InvalidConfig => 1001,
            Self::InvalidRequest => 1002,
            Self::EncryptionFailed => 1003,
            Self::DecryptionFailed => 1004,
            Self::SignatureFailed => 1005,
            Self::ApiRequest => 1006,
            Self::ApiResponse => 1007,
            Self::Timeout => 1008,
            Self::UnsupportedRegion => 1009,
            Self::InvalidCardFormat => 1010,
        }
    }

    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::InvalidConfig => "invalid configuration",
            Self::InvalidRequest => "invalid request parameters",
            Self::EncryptionFailed => "encryption failed",
            Self::DecryptionFailed => "decryption failed",
            Self::SignatureFailed => "signature generation/verification failed",
            Self::ApiRequest => "API request failed",
            Self::ApiResponse => "invalid API response",
            Self::Timeout => "request timeout",
            Self::UnsupportedRegion => "unsupported region for this product",
            Self::InvalidCardFormat => "invalid card format",
        }
    }
}

/// An error raised while talking to the card detection upstream.
#[derive(Debug)]
pub struct CardDetectionError {
    kind: ErrorKind,
    message: String,
    cause: Option<Cause>,
}

impl CardDetectionError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap an underlying failure, keeping it as the error source.
    #[must_use]
    pub fn wrap<E>(cause: E, kind: ErrorKind, message: impl Into<String>) -> Self
    where
        E: Into<Cause>,
    {
        Self {
            kind,
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    #[must_use]
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }

    #[must_use]
    pub fn missing_host() -> Self {
        Self::new(ErrorKind::InvalidConfig, "missing host configuration")
    }

    #[must_use]
    pub fn missing_app_id() -> Self {
        Self::new(ErrorKind::InvalidConfig, "missing app ID configuration")
    }

    #[must_use]
    pub fn missing_app_secret() -> Self {
        Self::new(ErrorKind::InvalidConfig, "missing app secret configuration")
    }

    #[must_use]
    pub fn invalid_product_mark() -> Self {
        Self::new(ErrorKind::InvalidRequest, "invalid product mark")
    }

    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    #[must_use]
    pub fn unsupported_region() -> Self {
        Self::from_kind(ErrorKind::UnsupportedRegion)
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[must_use]
    pub const fn code(&self) -> i32 {
        self.kind.code()
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for CardDetectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "CardDetection Error {}: {}", self.code(), self.message)?;

        if let Some(cause) = &self.cause {
            write!(f, " (caused by: {cause})")?;
        }

        Ok(())
    }
}

impl StdError for CardDetectionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// Returns `true` when `error` is a [`CardDetectionError`].
#[must_use]
pub fn is_card_detection_error(error: &(dyn StdError + 'static)) -> bool {
    error.downcast_ref::<CardDetectionError>().is_some()
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn codes_are_stable() {
        let kinds = [
            ErrorKind::InvalidConfig,
            ErrorKind::InvalidRequest,
            ErrorKind::EncryptionFailed,
            ErrorKind::DecryptionFailed,
            ErrorKind::SignatureFailed,
            ErrorKind::ApiRequest,
            ErrorKind::ApiResponse,
            ErrorKind::Timeout,
            ErrorKind::UnsupportedRegion,
            ErrorKind::InvalidCardFormat,
        ];

        let codes: Vec<i32> = kinds.iter().map(|kind| kind.code()).collect();

        assert_eq!(codes, (1001..=1010).collect::<Vec<_>>());
    }

    #[test]
    fn display_without_cause() {
        let error = CardDetectionError::invalid_request("cards cannot be empty");

        assert_eq!(
            error.to_string(),
            "CardDetection Error 1002: cards cannot be empty"
        );
    }

    #[test]
    fn display_with_cause() {
        let error = CardDetectionError::wrap(
            io::Error::other("connection reset"),
            ErrorKind::ApiRequest,
            "HTTP request failed",
        );

        assert_eq!(
            error.to_string(),
            "CardDetection Error 1006: HTTP request failed (caused by: connection reset)"
        );
        assert!(error.source().is_some());
    }

    #[test]
    fn predicate_identifies_card_detection_errors() {
        let error = CardDetectionError::unsupported_region();
        let other = io::Error::other("boom");

        assert!(is_card_detection_error(&error));
        assert!(!is_card_detection_error(&other));
        assert_eq!(error.message(), "unsupported region for this product");
    }
}
