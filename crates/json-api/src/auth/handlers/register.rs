//! Registration Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};

use crate::{
    auth::models::{ProfileResponse, RegisterRequest},
    envelope::{ApiResult, success_with},
    extensions::*,
    state::State,
};

/// Create an inactive user; activate it through `/verification/verify` with type `register`
#[endpoint(tags("auth"), summary = "Register user")]
pub(crate) async fn handler(
    json: JsonBody<RegisterRequest>,
    depot: &mut Depot,
) -> ApiResult<ProfileResponse> {
    let request = json.into_inner();

    let profile = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .user_auth
        .register(&request.email, &request.password)
        .await?;

    success_with(
        "registration successful, please verify your email",
        profile.into(),
    )
}
