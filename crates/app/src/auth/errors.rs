//! Auth service errors.

use sqlx::{Error, error::DatabaseError, error::ErrorKind};
use thiserror::Error;

use crate::{auth::TokenError, verification::VerificationServiceError};

#[derive(Debug, Error)]
pub enum AuthServiceError {
    #[error("user not found")]
    UserNotFound,

    #[error("admin not found")]
    AdminNotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid admin credentials")]
    InvalidAdminCredentials,

    #[error("email already exists")]
    EmailExists,

    #[error("phone already exists")]
    PhoneExists,

    #[error("email not verified")]
    EmailNotVerified,

    #[error("user account is inactive")]
    UserInactive,

    #[error("admin account is inactive")]
    AdminInactive,

    #[error("verification code not found")]
    CodeNotFound,

    #[error("verification code expired")]
    CodeExpired,

    #[error("verification code already used")]
    CodeAlreadyUsed,

    #[error("invalid verification code")]
    InvalidCode,

    #[error("token not found")]
    TokenNotFound,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token")]
    TokenInvalid,

    #[error("invalid refresh token")]
    RefreshTokenInvalid,

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("insufficient permissions")]
    InsufficientPermissions,

    #[error("internal server error")]
    InternalServer,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("too many requests")]
    RateLimited,

    #[error("password hashing failed")]
    PasswordHash(#[source] bcrypt::BcryptError),

    #[error("token processing error")]
    Token(#[source] TokenError),

    #[error("verification error")]
    Verification(#[source] VerificationServiceError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for AuthServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::EmailExists,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl From<TokenError> for AuthServiceError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Expired | TokenError::Invalid(_) => Self::TokenInvalid,
            other => Self::Token(other),
        }
    }
}

impl From<VerificationServiceError> for AuthServiceError {
    fn from(error: VerificationServiceError) -> Self {
        if error.is_rate_limited() {
            return Self::RateLimited;
        }

        match error {
            VerificationServiceError::Sql(error) => Self::Sql(error),
            other => Self::Verification(other),
        }
    }
}

impl From<bcrypt::BcryptError> for AuthServiceError {
    fn from(error: bcrypt::BcryptError) -> Self {
        Self::PasswordHash(error)
    }
}
