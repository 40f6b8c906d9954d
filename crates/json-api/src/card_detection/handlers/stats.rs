//! Detection Stats Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    card_detection::models::StatsResponse,
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
};

/// Per-product and per-month breakdown of the caller's records
#[endpoint(
    tags("card detection"),
    summary = "Detection statistics",
    security(("bearer_auth" = [])),
)]
pub(crate) async fn handler(depot: &mut Depot) -> ApiResult<StatsResponse> {
    let principal = depot.principal_or_401()?;

    let stats = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .detections
        .stats(principal.id)
        .await?;

    success(stats.into())
}
