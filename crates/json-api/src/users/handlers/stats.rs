//! User Stats Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    envelope::{ApiResult, success},
    extensions::*,
    state::State,
    users::models::UserStatsResponse,
};

/// Registration and activity counters
#[endpoint(tags("admin users"), summary = "User statistics", security(("bearer_auth" = [])))]
pub(crate) async fn handler(depot: &mut Depot) -> ApiResult<UserStatsResponse> {
    let stats = depot
        .obtain_or_500::<Arc<State>>()?
        .app
        .users
        .stats()
        .await?;

    success(stats.into())
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::Value;
    use testresult::TestResult;
    use trusioo_app::users::{MockUsersService, UserStats};

    use crate::test_helpers::{Mocks, admin_service};

    use super::*;

    #[tokio::test]
    async fn returns_the_counters() -> TestResult {
        let mut users = MockUsersService::new();

        users.expect_stats().once().return_once(|| {
            Ok(UserStats {
                total_users: 10,
                active_users: 8,
                inactive_users: 2,
                registered_today: 1,
                registered_this_week: 3,
                registered_this_month: 6,
            })
        });

        let mocks = Mocks {
            users,
            ..Mocks::default()
        };

        let mut res = TestClient::get("http://example.com/stats")
            .send(&admin_service(
                mocks,
                Router::with_path("stats").get(handler),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: Value = res.take_json().await?;

        assert_eq!(body["code"], 200);
        assert_eq!(body["data"]["total_users"], 10);
        assert_eq!(body["data"]["inactive_users"], 2);
        assert_eq!(body["data"]["registered_this_week"], 3);

        Ok(())
    }
}
