//! Profile Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    auth::models::ProfileResponse,
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
};

/// Current user
#[endpoint(tags("auth"), summary = "User profile", security(("bearer_auth" = [])))]
pub(crate) async fn user(depot: &mut Depot) -> ApiResult<ProfileResponse> {
    profile(depot).await
}

/// Current admin
#[endpoint(tags("admin auth"), summary = "Admin profile", security(("bearer_auth" = [])))]
pub(crate) async fn admin(depot: &mut Depot) -> ApiResult<ProfileResponse> {
    profile(depot).await
}

/// The bearer middleware already pinned the principal kind.
async fn profile(depot: &Depot) -> ApiResult<ProfileResponse> {
    let principal = depot.principal_or_401()?;

    let profile = depot
        .obtain_or_500::<Arc<State>>()?
        .auth(principal.kind)
        .profile(principal.id)
        .await?;

    success(profile.into())
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::Value;
    use testresult::TestResult;
    use trusioo_app::auth::{AuthServiceError, MockAuthService, PrincipalKind};

    use crate::{
        auth::models::fixtures,
        test_helpers::{Mocks, TEST_ADMIN_ID, TEST_USER_ID, admin_service, user_service},
    };

    use super::*;

    #[tokio::test]
    async fn user_profile_is_loaded_for_the_token_owner() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_profile()
            .once()
            .withf(|id| *id == TEST_USER_ID)
            .return_once(|_| Ok(fixtures::profile(PrincipalKind::User)));

        let mocks = Mocks {
            user_auth: auth,
            ..Mocks::default()
        };

        let mut res = TestClient::get("http://example.com/profile")
            .send(&user_service(mocks, Router::with_path("profile").get(user)))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(body["data"]["email"], "ada@example.com");
        assert!(body["data"].get("is_super").is_none());

        Ok(())
    }

    #[tokio::test]
    async fn admin_profile_includes_is_super() -> TestResult {
        let mut admin_auth = MockAuthService::new();

        admin_auth
            .expect_profile()
            .once()
            .withf(|id| *id == TEST_ADMIN_ID)
            .return_once(|_| Ok(fixtures::profile(PrincipalKind::Admin)));

        let mocks = Mocks {
            admin_auth,
            ..Mocks::default()
        };

        let mut res = TestClient::get("http://example.com/profile")
            .send(&admin_service(
                mocks,
                Router::with_path("profile").get(admin),
            ))
            .await;

        let body: Value = res.take_json().await?;

        assert_eq!(body["data"]["is_super"], true);

        Ok(())
    }

    #[tokio::test]
    async fn deleted_principal_returns_404() -> TestResult {
        let mut auth = MockAuthService::new();

        auth.expect_profile()
            .once()
            .return_once(|_| Err(AuthServiceError::UserNotFound));

        let mocks = Mocks {
            user_auth: auth,
            ..Mocks::default()
        };

        let res = TestClient::get("http://example.com/profile")
            .send(&user_service(mocks, Router::with_path("profile").get(user)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
