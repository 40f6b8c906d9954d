//! Send Code Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};
use trusioo_app::verification::Purpose;

use crate::{
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
    verification::models::{SendCodeRequest, SendCodeResponse},
};

/// Issue a verification code and email it
#[endpoint(tags("verification"), summary = "Send verification code")]
pub(crate) async fn handler(
    json: JsonBody<SendCodeRequest>,
    depot: &mut Depot,
) -> ApiResult<SendCodeResponse> {
    let request = json.into_inner();
    let purpose: Purpose = request.purpose.parse()?;

    let sent = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .verification
        .send(&request.target, purpose)
        .await?;

    success(sent.into())
}
