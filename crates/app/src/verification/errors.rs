//! Verification service errors.

use sqlx::Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerificationServiceError {
    /// Issued too recently, or too many failed attempts.
    #[error("verification code was sent recently, please wait before requesting again")]
    RateLimited,

    /// Too many wrong codes for this target and purpose.
    #[error("too many failed verification attempts, please request a new code")]
    TooManyAttempts,

    /// Register codes are only issued for existing users.
    #[error("user not found in database, please register first")]
    UserNotFound,

    /// Unknown purpose tag.
    #[error("invalid verification type")]
    InvalidPurpose,

    /// Mail collaborator refused the code.
    #[error("failed to send verification email")]
    Delivery(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl VerificationServiceError {
    /// `true` for the two throttling variants.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited | Self::TooManyAttempts)
    }
}

impl From<Error> for VerificationServiceError {
    fn from(error: Error) -> Self {
        Self::Sql(error)
    }
}
