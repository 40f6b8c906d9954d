//! Reset Password Handler

use std::sync::Arc;

use salvo::{oapi::extract::JsonBody, prelude::*};
use trusioo_app::auth::PrincipalKind;

use crate::{
    auth::models::ResetPasswordRequest,
    envelope::{ApiResult, MessageResponse, success},
    extensions::*,
    state::State,
};

/// Set a new user password with a reset code
#[endpoint(tags("auth"), summary = "Reset user password")]
pub(crate) async fn user(
    json: JsonBody<ResetPasswordRequest>,
    depot: &mut Depot,
) -> ApiResult<MessageResponse> {
    reset_password(PrincipalKind::User, json.into_inner(), depot).await
}

/// Set a new admin password with a reset code
#[endpoint(tags("admin auth"), summary = "Reset admin password")]
pub(crate) async fn admin(
    json: JsonBody<ResetPasswordRequest>,
    depot: &mut Depot,
) -> ApiResult<MessageResponse> {
    reset_password(PrincipalKind::Admin, json.into_inner(), depot).await
}

async fn reset_password(
    kind: PrincipalKind,
    request: ResetPasswordRequest,
    depot: &Depot,
) -> ApiResult<MessageResponse> {
    let message = depot
        .obtain_or_500::<Arc<State>>()?
        .auth(kind)
        .reset_password(&request.email, &request.code, &request.password)
        .await?;

    success(MessageResponse { message })
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;
    use trusioo_app::auth::{AuthServiceError, MockAuthService};

    use crate::test_helpers::{Mocks, public_service};

    use super::*;

    #[tokio::test]
    async fn user_password_is_reset() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_reset_password()
            .once()
            .withf(|email, code, password| {
                email == "ada@example.com" && code == "654321" && password == "n3w-secret"
            })
            .return_once(|_, _, _| Ok("password reset successfully".to_string()));

        let mocks = Mocks {
            user_auth: auth,
            ..Mocks::default()
        };

        let mut res = TestClient::post("http://example.com/reset")
            .json(
                &json!({ "email": "ada@example.com", "code": "654321", "password": "n3w-secret" }),
            )
            .send(&public_service(
                mocks,
                Router::with_path("reset").post(user),
            ))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(body["data"]["message"], "password reset successfully");

        Ok(())
    }

    #[tokio::test]
    async fn used_codes_are_rejected() -> TestResult {
        let mut admin_auth = MockAuthService::new();

        admin_auth
            .expect_reset_password()
            .once()
            .return_once(|_, _, _| Err(AuthServiceError::CodeAlreadyUsed));

        let mocks = Mocks {
            admin_auth,
            ..Mocks::default()
        };

        let mut res = TestClient::post("http://example.com/reset")
            .json(&json!({ "email": "root@example.com", "code": "111111", "password": "abcdef" }))
            .send(&public_service(
                mocks,
                Router::with_path("reset").post(admin),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_REQUEST));

        let body: Value = res.take_json().await?;

        assert_eq!(body["message"], "verification code already used");

        Ok(())
    }
}
