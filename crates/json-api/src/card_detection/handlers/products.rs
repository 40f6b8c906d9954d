//! Product Catalog Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    card_detection::models::{ProductResponse, ProductsResponse},
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
};

/// Active products, in catalog order
#[endpoint(
    tags("card detection"),
    summary = "Supported products",
    security(("bearer_auth" = [])),
)]
pub(crate) async fn handler(depot: &mut Depot) -> ApiResult<ProductsResponse> {
    let products = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .detections
        .products()
        .await?;

    let products: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();

    success(ProductsResponse {
        total: products.len(),
        products,
    })
}
