//! Verification request and response bodies.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use trusioo_app::verification::{CodeCheck, SentCode};

/// Request a code for `target`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SendCodeRequest {
    /// Email address the code is sent to
    pub target: String,

    /// One of `register`, `user_login`, `admin_login`, `forgot_password`, `reset_password`
    #[serde(rename = "type")]
    pub purpose: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct VerifyCodeRequest {
    pub target: String,

    #[serde(rename = "type")]
    pub purpose: String,

    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SendCodeResponse {
    pub message: String,

    /// When the code stops being accepted
    pub expired_at: String,
}

impl From<SentCode> for SendCodeResponse {
    fn from(sent: SentCode) -> Self {
        Self {
            message: sent.message,
            expired_at: sent.expired_at.to_string(),
        }
    }
}

/// A wrong code is reported with `valid: false`, not as an error
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct VerifyCodeResponse {
    pub message: String,
    pub valid: bool,
}

impl From<CodeCheck> for VerifyCodeResponse {
    fn from(check: CodeCheck) -> Self {
        Self {
            message: check.message,
            valid: check.valid,
        }
    }
}
