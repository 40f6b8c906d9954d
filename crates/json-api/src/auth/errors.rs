//! Auth error mapping.

use trusioo_app::auth::AuthServiceError;

use crate::errors::ApiError;

impl From<AuthServiceError> for ApiError {
    fn from(error: AuthServiceError) -> Self {
        match error {
            AuthServiceError::UserNotFound
            | AuthServiceError::AdminNotFound
            | AuthServiceError::NotFound => ApiError::not_found(error.to_string()),

            AuthServiceError::InvalidCredentials
            | AuthServiceError::InvalidAdminCredentials
            | AuthServiceError::TokenNotFound
            | AuthServiceError::TokenExpired
            | AuthServiceError::TokenInvalid
            | AuthServiceError::RefreshTokenInvalid
            | AuthServiceError::Unauthorized => ApiError::unauthorized(error.to_string()),

            AuthServiceError::EmailNotVerified
            | AuthServiceError::UserInactive
            | AuthServiceError::AdminInactive
            | AuthServiceError::Forbidden
            | AuthServiceError::InsufficientPermissions => ApiError::forbidden(error.to_string()),

            AuthServiceError::EmailExists
            | AuthServiceError::PhoneExists
            | AuthServiceError::CodeNotFound
            | AuthServiceError::CodeExpired
            | AuthServiceError::CodeAlreadyUsed
            | AuthServiceError::InvalidCode => ApiError::bad_request(error.to_string()),

            AuthServiceError::BadRequest(message) | AuthServiceError::Validation(message) => {
                ApiError::bad_request(message)
            }

            AuthServiceError::RateLimited => ApiError::too_many_requests(error.to_string()),

            AuthServiceError::Verification(source) => source.into(),

            AuthServiceError::PasswordHash(ref source) => {
                ApiError::internal("failed to hash password", source)
            }
            AuthServiceError::Token(ref source) => {
                ApiError::internal("failed to process token", source)
            }
            AuthServiceError::Sql(ref source) => ApiError::internal("auth storage error", source),
            AuthServiceError::InternalServer => ApiError::internal("auth service error", &error),
        }
    }
}
