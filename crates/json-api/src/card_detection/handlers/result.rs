//! Card Result Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};

use crate::{
    card_detection::models::{CheckCardResultBody, ResultFetchResponse},
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
};

/// Record and fetch the upstream result for one card
#[endpoint(
    tags("card detection"),
    summary = "Fetch a card result",
    security(("bearer_auth" = [])),
    responses(
        (status_code = 400, description = "Validation or upstream failure, `code` in 1001..=1010"),
        (status_code = 503, description = "Card detection is disabled or unconfigured"),
    ),
)]
pub(crate) async fn handler(
    json: JsonBody<CheckCardResultBody>,
    depot: &mut Depot,
) -> ApiResult<ResultFetchResponse> {
    let principal = depot.principal_or_401()?;

    let fetch = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .detections
        .check_card_result(principal.id, &json.into_inner().into())
        .await?;

    success(fetch.into())
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;
    use trusioo_app::{
        card_detection::{CardDetectionError, CardResult},
        detections::{DetectionsServiceError, MockDetectionsService, ResultFetch},
    };

    use crate::test_helpers::{Mocks, user_service};

    use super::*;

    fn service(detections: MockDetectionsService) -> Service {
        let mocks = Mocks {
            detections,
            ..Mocks::default()
        };

        user_service(mocks, Router::with_path("result").post(handler))
    }

    #[tokio::test]
    async fn result_is_returned_with_a_normalized_check_time() -> TestResult {
        let mut detections = MockDetectionsService::new();

        detections
            .expect_check_card_result()
            .once()
            .withf(|_, request| {
                request.product_mark == "sephora"
                    && request.card_no == "S1234567890123456"
                    && request.pin_code.as_deref() == Some("1234")
            })
            .return_once(|_, _| {
                Ok(ResultFetch {
                    record_id: 21,
                    result: CardResult {
                        card_no: "S1234567890123456".to_string(),
                        status: 2,
                        check_time: json!("2024-05-01 10:00:00"),
                        ..CardResult::default()
                    },
                })
            });

        let mut res = TestClient::post("http://example.com/result")
            .json(&json!({
                "productMark": "sephora",
                "cardNo": "S1234567890123456",
                "pinCode": "1234"
            }))
            .send(&service(detections))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: Value = res.take_json().await?;

        assert_eq!(body["data"]["record_id"], 21);
        assert_eq!(body["data"]["result"]["cardNo"], "S1234567890123456");
        assert_eq!(body["data"]["result"]["status"], 2);
        assert_eq!(body["data"]["result"]["checkTime"], "2024-05-01 10:00:00");

        Ok(())
    }

    #[tokio::test]
    async fn missing_pin_is_an_invalid_request() -> TestResult {
        let mut detections = MockDetectionsService::new();

        detections
            .expect_check_card_result()
            .once()
            .return_once(|_, _| {
                Err(DetectionsServiceError::CardDetection(
                    CardDetectionError::invalid_request("pin code is required for this product"),
                ))
            });

        let mut res = TestClient::post("http://example.com/result")
            .json(&json!({ "productMark": "sephora", "cardNo": "S1234567890123456" }))
            .send(&service(detections))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: Value = res.take_json().await?;

        assert_eq!(body["code"], 1002);

        Ok(())
    }
}
