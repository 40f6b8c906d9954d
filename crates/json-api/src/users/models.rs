//! User management response bodies.

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use trusioo_app::users::{UserPage, UserStats};

use crate::auth::models::ProfileResponse;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UserStatsResponse {
    pub total_users: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    pub registered_today: i64,

    /// Since Monday 00:00, server time
    pub registered_this_week: i64,

    pub registered_this_month: i64,
}

impl From<UserStats> for UserStatsResponse {
    fn from(stats: UserStats) -> Self {
        Self {
            total_users: stats.total_users,
            active_users: stats.active_users,
            inactive_users: stats.inactive_users,
            registered_today: stats.registered_today,
            registered_this_week: stats.registered_this_week,
            registered_this_month: stats.registered_this_month,
        }
    }
}

/// One page of users, newest first
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UserPageResponse {
    pub total: i64,
    pub page: i64,
    pub size: i64,
    pub users: Vec<ProfileResponse>,
}

impl From<UserPage> for UserPageResponse {
    fn from(page: UserPage) -> Self {
        Self {
            total: page.total,
            page: page.page,
            size: page.size,
            users: page.users.into_iter().map(Into::into).collect(),
        }
    }
}
