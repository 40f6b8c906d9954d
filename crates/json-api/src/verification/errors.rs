//! Verification error mapping.

use trusioo_app::verification::VerificationServiceError;

use crate::errors::ApiError;

impl From<VerificationServiceError> for ApiError {
    fn from(error: VerificationServiceError) -> Self {
        match error {
            VerificationServiceError::RateLimited | VerificationServiceError::TooManyAttempts => {
                ApiError::too_many_requests(error.to_string())
            }
            VerificationServiceError::UserNotFound => ApiError::not_found(error.to_string()),
            VerificationServiceError::InvalidPurpose => ApiError::bad_request(error.to_string()),
            VerificationServiceError::Delivery(ref source) => {
                ApiError::internal("failed to deliver verification code", source.as_ref())
            }
            VerificationServiceError::Sql(ref source) => {
                ApiError::internal("verification storage error", source)
            }
        }
    }
}
