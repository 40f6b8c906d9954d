//! Login Verification Handler (step two)

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};
use trusioo_app::auth::PrincipalKind;

use crate::{
    auth::models::{LoginResponse, LoginVerifyRequest},
    envelope::{ApiResult, success_with},
    extensions::*,
    state::State,
};

/// Exchange a user login code for tokens
#[endpoint(tags("auth"), summary = "Verify user login code")]
pub(crate) async fn user(
    json: JsonBody<LoginVerifyRequest>,
    req: &mut Request,
    depot: &mut Depot,
) -> ApiResult<LoginResponse> {
    verify(PrincipalKind::User, json.into_inner(), req, depot).await
}

/// Exchange an admin login code for tokens
#[endpoint(tags("admin auth"), summary = "Verify admin login code")]
pub(crate) async fn admin(
    json: JsonBody<LoginVerifyRequest>,
    req: &mut Request,
    depot: &mut Depot,
) -> ApiResult<LoginResponse> {
    verify(PrincipalKind::Admin, json.into_inner(), req, depot).await
}

async fn verify(
    kind: PrincipalKind,
    request: LoginVerifyRequest,
    req: &Request,
    depot: &Depot,
) -> ApiResult<LoginResponse> {
    let envelope = depot
        .obtain_or_500::<Arc<State>>()?
        .auth(kind)
        .login_verify(&request.email, &request.code, &req.client_meta())
        .await?;

    success_with("login successful", envelope.into())
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;
    use trusioo_app::auth::{AuthServiceError, MockAuthService, SessionInfo};

    use crate::{
        auth::models::fixtures,
        test_helpers::{Mocks, public_service},
    };

    use super::*;

    #[tokio::test]
    async fn user_verification_returns_tokens_and_session() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_login_verify()
            .once()
            .withf(|email, code, _| email == "ada@example.com" && code == "123456")
            .return_once(|_, _, _| {
                let mut envelope = fixtures::login_envelope(PrincipalKind::User);

                envelope.session = Some(SessionInfo {
                    ip: "203.0.113.9".to_string(),
                    country: "GB".to_string(),
                    ..SessionInfo::default()
                });

                Ok(envelope)
            });

        let mocks = Mocks {
            user_auth: auth,
            ..Mocks::default()
        };

        let mut res = TestClient::post("http://example.com/verify")
            .json(&json!({ "email": "ada@example.com", "code": "123456" }))
            .send(&public_service(
                mocks,
                Router::with_path("verify").post(user),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: Value = res.take_json().await?;

        assert_eq!(body["data"]["access_token"], "access");
        assert_eq!(body["data"]["token_type"], "Bearer");
        assert_eq!(body["data"]["user"]["email"], "ada@example.com");
        assert_eq!(body["data"]["session_info"]["country"], "GB");
        assert!(body["data"].get("admin").is_none());

        Ok(())
    }

    #[tokio::test]
    async fn expired_codes_are_rejected() -> TestResult {
        let mut admin_auth = MockAuthService::new();

        admin_auth
            .expect_login_verify()
            .once()
            .return_once(|_, _, _| Err(AuthServiceError::CodeExpired));

        let mocks = Mocks {
            admin_auth,
            ..Mocks::default()
        };

        let res = TestClient::post("http://example.com/verify")
            .json(&json!({ "email": "root@example.com", "code": "000000" }))
            .send(&public_service(
                mocks,
                Router::with_path("verify").post(admin),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        Ok(())
    }
}
