//! Detection Record Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};

use crate::{
    card_detection::models::RecordResponse,
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
};

/// One of the caller's detection records
#[endpoint(
    tags("card detection"),
    summary = "Detection record",
    security(("bearer_auth" = [])),
    responses((status_code = 404, description = "No such record for this user")),
)]
pub(crate) async fn handler(id: PathParam<i64>, depot: &mut Depot) -> ApiResult<RecordResponse> {
    let principal = depot.principal_or_401()?;

    let record = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .detections
        .detail(principal.id, id.into_inner())
        .await?;

    success(record.into())
}
