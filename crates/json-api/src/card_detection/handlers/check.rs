//! Check Cards Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};

use crate::{
    card_detection::models::{CheckCardBody, CheckSubmissionResponse},
    envelope::{ApiResult, success_with},
    extensions::*,
    state::State,
};

/// Record a batch of cards and submit it upstream
#[endpoint(
    tags("card detection"),
    summary = "Submit cards for checking",
    security(("bearer_auth" = [])),
    responses(
        (status_code = 400, description = "Validation or upstream failure, `code` in 1001..=1010"),
        (status_code = 503, description = "Card detection is disabled or unconfigured"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CheckCardBody>,
    depot: &mut Depot,
) -> ApiResult<CheckSubmissionResponse> {
    let principal = depot.principal_or_401()?;

    let submission = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .detections
        .check_card(principal.id, &json.into_inner().into())
        .await?;

    success_with("cards submitted for checking", submission.into())
}
