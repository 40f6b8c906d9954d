//! Detection History Handler

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};
use trusioo_app::detections::HistoryQuery;

use crate::{
    card_detection::models::HistoryResponse,
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
};

/// Page through the caller's records, newest first
///
/// Only one filter applies, in the order `status`, `product_mark`, `card_number`.
#[endpoint(
    tags("card detection"),
    summary = "Detection history",
    security(("bearer_auth" = [])),
)]
pub(crate) async fn handler(
    page: QueryParam<i64, false>,
    page_size: QueryParam<i64, false>,
    status: QueryParam<String, false>,
    product_mark: QueryParam<String, false>,
    card_number: QueryParam<String, false>,
    depot: &mut Depot,
) -> ApiResult<HistoryResponse> {
    let principal = depot.principal_or_401()?;

    let query = HistoryQuery {
        page: page.into_inner(),
        page_size: page_size.into_inner(),
        status: status.into_inner(),
        product_mark: product_mark.into_inner(),
        card_number: card_number.into_inner(),
    };

    let history = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .detections
        .history(principal.id, &query)
        .await?;

    success(history.into())
}
