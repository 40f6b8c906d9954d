//! Forgot Password Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};
use trusioo_app::auth::PrincipalKind;

use crate::{
    auth::models::{CodeSentResponse, ForgotPasswordRequest},
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
};

/// Email a user password reset code
#[endpoint(tags("auth"), summary = "Request user password reset")]
pub(crate) async fn user(
    json: JsonBody<ForgotPasswordRequest>,
    depot: &mut Depot,
) -> ApiResult<CodeSentResponse> {
    forgot_password(PrincipalKind::User, json.into_inner(), depot).await
}

/// Email an admin password reset code
#[endpoint(tags("admin auth"), summary = "Request admin password reset")]
pub(crate) async fn admin(
    json: JsonBody<ForgotPasswordRequest>,
    depot: &mut Depot,
) -> ApiResult<CodeSentResponse> {
    forgot_password(PrincipalKind::Admin, json.into_inner(), depot).await
}

async fn forgot_password(
    kind: PrincipalKind,
    request: ForgotPasswordRequest,
    depot: &Depot,
) -> ApiResult<CodeSentResponse> {
    let sent = depot
        .obtain_or_500::<Arc<State>>()?
        .auth(kind)
        .forgot_password(&request.email)
        .await?;

    success(sent.into())
}
