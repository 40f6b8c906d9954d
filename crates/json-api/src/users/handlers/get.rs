//! User Detail Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};

use crate::{
    auth::models::ProfileResponse,
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
};

#[endpoint(
    tags("admin users"),
    summary = "User detail",
    security(("bearer_auth" = [])),
    responses((status_code = 404, description = "No such user")),
)]
pub(crate) async fn handler(id: PathParam<i64>, depot: &mut Depot) -> ApiResult<ProfileResponse> {
    let user = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .users
        .detail(id.into_inner())
        .await?;

    success(user.into())
}
