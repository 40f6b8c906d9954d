//! Login Handler (step one)

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};
use trusioo_app::auth::PrincipalKind;

use crate::{
    auth::models::{CodeSentResponse, LoginRequest},
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
};

/// Check user credentials and email a login code
#[endpoint(tags("auth"), summary = "Start user login")]
pub(crate) async fn user(
    json: JsonBody<LoginRequest>,
    req: &mut Request,
    depot: &mut Depot,
) -> ApiResult<CodeSentResponse> {
    login(PrincipalKind::User, json.into_inner(), req, depot).await
}

/// Check admin credentials and email a login code
#[endpoint(tags("admin auth"), summary = "Start admin login")]
pub(crate) async fn admin(
    json: JsonBody<LoginRequest>,
    req: &mut Request,
    depot: &mut Depot,
) -> ApiResult<CodeSentResponse> {
    login(PrincipalKind::Admin, json.into_inner(), req, depot).await
}

async fn login(
    kind: PrincipalKind,
    request: LoginRequest,
    req: &Request,
    depot: &Depot,
) -> ApiResult<CodeSentResponse> {
    let sent = depot
        .obtain_or_500::<Arc<State>>()?
        .auth(kind)
        .login(&request.email, &request.password, &req.client_meta())
        .await?;

    success(sent.into())
}
