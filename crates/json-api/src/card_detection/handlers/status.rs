//! Service Status Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    card_detection::models::StatusResponse,
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
};

/// Whether card detection is enabled and its upstream configuration is usable
#[endpoint(
    tags("card detection"),
    summary = "Card detection status",
    security(("bearer_auth" = [])),
)]
pub(crate) async fn handler(depot: &mut Depot) -> ApiResult<StatusResponse> {
    let status = depot.obtain_or_500::<Arc<State>>()?.app.detections.status();

    success(status.into())
}
