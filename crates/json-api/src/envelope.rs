//! Response envelope shared by every JSON endpoint.

use salvo::{oapi::ToSchema, prelude::Json};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

pub(crate) const SUCCESS_CODE: i32 = 200;

/// `{code, message, data}` wrapper around a successful payload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct Envelope<T: ToSchema + 'static> {
    /// `200` on success
    pub code: i32,

    /// Human readable outcome
    pub message: String,

    /// Endpoint specific payload
    pub data: T,
}

pub(crate) type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

/// Wrap a payload with the generic success message.
pub(crate) fn success<T: ToSchema + 'static>(data: T) -> ApiResult<T> {
    success_with("success", data)
}

pub(crate) fn success_with<T: ToSchema + 'static>(
    message: impl Into<String>,
    data: T,
) -> ApiResult<T> {
    Ok(Json(Envelope {
        code: SUCCESS_CODE,
        message: message.into(),
        data,
    }))
}

/// Payload of endpoints that only report an outcome.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct MessageResponse {
    pub message: String,
}
