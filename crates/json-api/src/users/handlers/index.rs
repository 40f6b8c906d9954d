//! User List Handler

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};
use trusioo_app::users::UserListQuery;

use crate::{
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
    users::models::UserPageResponse,
};

/// Page through users
///
/// `status` is `active`, `inactive` or `all`; `email` matches case-insensitively on any part
/// of the address. `page_size` is capped at 100.
#[endpoint(tags("admin users"), summary = "List users", security(("bearer_auth" = [])))]
pub(crate) async fn handler(
    page: QueryParam<i64, false>,
    page_size: QueryParam<i64, false>,
    status: QueryParam<String, false>,
    email: QueryParam<String, false>,
    depot: &mut Depot,
) -> ApiResult<UserPageResponse> {
    let query = UserListQuery {
        page: page.into_inner(),
        page_size: page_size.into_inner(),
        status: status.into_inner(),
        email: email.into_inner(),
    };

    let page = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .users
        .list(&query)
        .await?;

    success(page.into())
}
