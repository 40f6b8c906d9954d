//! Detection error mapping.

use tracing::warn;
use trusioo_app::{card_detection::ErrorKind, detections::DetectionsServiceError};

use crate::errors::ApiError;

const UNAVAILABLE_MESSAGE: &str = "card detection service is not available";

impl From<DetectionsServiceError> for ApiError {
    fn from(error: DetectionsServiceError) -> Self {
        match error {
            DetectionsServiceError::Unavailable => {
                ApiError::service_unavailable(UNAVAILABLE_MESSAGE)
            }

            // Missing host or credentials: the service is switched on but cannot be used.
            DetectionsServiceError::CardDetection(ref source)
                if source.kind() == ErrorKind::InvalidConfig =>
            {
                warn!(
                    code = source.code(),
                    "card detection is misconfigured: {source}"
                );

                ApiError::service_unavailable(UNAVAILABLE_MESSAGE)
            }

            DetectionsServiceError::CardDetection(source) => {
                warn!(code = source.code(), "card detection failed: {source}");

                ApiError::bad_request(source.message()).with_code(source.code())
            }

            DetectionsServiceError::NotFound | DetectionsServiceError::ProductNotFound => {
                ApiError::not_found(error.to_string())
            }

            DetectionsServiceError::Sql(ref source) => {
                ApiError::internal("detection storage error", source)
            }
        }
    }
}
