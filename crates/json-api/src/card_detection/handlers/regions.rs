//! Region Catalog Handler

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};

use crate::{
    card_detection::models::{RegionResponse, RegionsResponse},
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
};

/// Active regions, optionally for one product
#[endpoint(
    tags("card detection"),
    summary = "Supported regions",
    security(("bearer_auth" = [])),
    responses((status_code = 404, description = "Unknown product mark")),
)]
pub(crate) async fn handler(
    product_mark: QueryParam<String, false>,
    depot: &mut Depot,
) -> ApiResult<RegionsResponse> {
    let product_mark = product_mark.into_inner().filter(|mark| !mark.is_empty());

    let regions = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .detections
        .regions(product_mark.as_deref())
        .await?;

    let regions: Vec<RegionResponse> = regions.into_iter().map(Into::into).collect();

    success(RegionsResponse {
        total: regions.len(),
        regions,
        product_mark,
    })
}
