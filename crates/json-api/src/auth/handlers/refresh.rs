//! Token Refresh Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};
use trusioo_app::auth::PrincipalKind;

use crate::{
    auth::models::{LoginResponse, RefreshRequest},
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
};

/// Issue a new user access token
#[endpoint(tags("auth"), summary = "Refresh user access token")]
pub(crate) async fn user(
    json: JsonBody<RefreshRequest>,
    depot: &mut Depot,
) -> ApiResult<LoginResponse> {
    refresh(PrincipalKind::User, json.into_inner(), depot).await
}

/// Issue a new admin access token
#[endpoint(tags("admin auth"), summary = "Refresh admin access token")]
pub(crate) async fn admin(
    json: JsonBody<RefreshRequest>,
    depot: &mut Depot,
) -> ApiResult<LoginResponse> {
    refresh(PrincipalKind::Admin, json.into_inner(), depot).await
}

async fn refresh(
    kind: PrincipalKind,
    request: RefreshRequest,
    depot: &Depot,
) -> ApiResult<LoginResponse> {
    let envelope = depot
        .obtain_or_500::<Arc<State>>()?
        .auth(kind)
        .refresh(&request.refresh_token)
        .await?;

    success(envelope.into())
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;
    use trusioo_app::auth::{AuthServiceError, MockAuthService};

    use crate::{
        auth::models::fixtures,
        test_helpers::{Mocks, public_service},
    };

    use super::*;

    #[tokio::test]
    async fn refresh_returns_the_same_refresh_token() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_refresh()
            .once()
            .withf(|token| token == "refresh")
            .return_once(|_| Ok(fixtures::login_envelope(PrincipalKind::User)));

        let mocks = Mocks {
            user_auth: auth,
            ..Mocks::default()
        };

        let mut res = TestClient::post("http://example.com/refresh")
            .json(&json!({ "refresh_token": "refresh" }))
            .send(&public_service(
                mocks,
                Router::with_path("refresh").post(user),
            ))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(body["data"]["refresh_token"], "refresh");
        assert_eq!(body["data"]["expires_in"], 7200);

        Ok(())
    }

    #[tokio::test]
    async fn revoked_refresh_tokens_return_401() -> TestResult {
        let mut admin_auth = MockAuthService::new();

        admin_auth
            .expect_refresh()
            .once()
            .return_once(|_| Err(AuthServiceError::RefreshTokenInvalid));

        let mocks = Mocks {
            admin_auth,
            ..Mocks::default()
        };

        let res = TestClient::post("http://example.com/refresh")
            .json(&json!({ "refresh_token": "stale" }))
            .send(&public_service(
                mocks,
                Router::with_path("refresh").post(admin),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));

        Ok(())
    }
}
