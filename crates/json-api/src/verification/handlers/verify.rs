//! Verify Code Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};
use trusioo_app::verification::Purpose;

use crate::{
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
    verification::models::{VerifyCodeRequest, VerifyCodeResponse},
};

/// Consume a verification code. `register` codes activate the account
#[endpoint(tags("verification"), summary = "Verify code")]
pub(crate) async fn handler(
    json: JsonBody<VerifyCodeRequest>,
    depot: &mut Depot,
) -> ApiResult<VerifyCodeResponse> {
    let request = json.into_inner();
    let purpose: Purpose = request.purpose.parse()?;

    let check = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .verification
        .check(&request.target, purpose, &request.code)
        .await?;

    success(check.into())
}
