//! User management error mapping.

use trusioo_app::users::UsersServiceError;

use crate::errors::ApiError;

impl From<UsersServiceError> for ApiError {
    fn from(error: UsersServiceError) -> Self {
        match error {
            UsersServiceError::NotFound => ApiError::not_found(error.to_string()),
            UsersServiceError::Sql(ref source) => ApiError::internal("user storage error", source),
        }
    }
}
