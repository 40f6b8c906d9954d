//! Detections service errors.

use sqlx::Error;
use thiserror::Error;

use crate::card_detection::CardDetectionError;

#[derive(Debug, Error)]
pub enum DetectionsServiceError {
    #[error("card detection service is not available")]
    Unavailable,

    #[error(transparent)]
    CardDetection(#[from] CardDetectionError),

    #[error("detection record not found")]
    NotFound,

    #[error("product not found")]
    ProductNotFound,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for DetectionsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        Self::Sql(error)
    }
}
