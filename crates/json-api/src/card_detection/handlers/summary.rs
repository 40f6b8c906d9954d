//! Detection Summary Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    card_detection::models::SummaryResponse,
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
};

/// Totals over all of the caller's records
#[endpoint(
    tags("card detection"),
    summary = "Detection summary",
    security(("bearer_auth" = [])),
)]
pub(crate) async fn handler(depot: &mut Depot) -> ApiResult<SummaryResponse> {
    let principal = depot.principal_or_401()?;

    let summary = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .detections
        .summary(principal.id)
        .await?;

    success(summary.into())
}
