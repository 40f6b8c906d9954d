//! Users Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    auth::{PrincipalKind, Profile},
    users::models::UserStats,
};

const USER_STATS_SQL: &str = include_str!("sql/user_stats.sql");
const LIST_USERS_SQL: &str = include_str!("sql/list_users.sql");
const COUNT_USERS_SQL: &str = include_str!("sql/count_users.sql");
const FIND_USER_SQL: &str = include_str!("sql/find_user.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgUsersRepository;

impl PgUsersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn stats(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<UserStats, sqlx::Error> {
        let row = query(USER_STATS_SQL).fetch_one(&mut **tx).await?;

        Ok(UserStats {
            total_users: row.try_get("total_users")?,
            active_users: row.try_get("active_users")?,
            inactive_users: row.try_get("inactive_users")?,
            registered_today: row.try_get("registered_today")?,
            registered_this_week: row.try_get("registered_this_week")?,
            registered_this_month: row.try_get("registered_this_month")?,
        })
    }

    pub(crate) async fn list_users(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        status: Option<&str>,
        email: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Profile>, sqlx::Error> {
        query_as::<Postgres, UserRow>(LIST_USERS_SQL)
            .bind(status)
            .bind(email)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut **tx)
            .await
            .map(|rows| rows.into_iter().map(|row| row.0).collect())
    }

    pub(crate) async fn count_users(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        status: Option<&str>,
        email: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        query_scalar::<Postgres, i64>(COUNT_USERS_SQL)
            .bind(status)
            .bind(email)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Profile, sqlx::Error> {
        query_as::<Postgres, UserRow>(FIND_USER_SQL)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
            .map(|row| row.0)
    }
}

/// A `users` row projected without its password hash.
struct UserRow(Profile);

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self(Profile {
            id: row.try_get("id")?,
            kind: PrincipalKind::User,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            role: row.try_get("role")?,
            status: row.try_get("status")?,
            is_super: false,
            email_verified: row.try_get("email_verified")?,
            last_login_at: row
                .try_get::<Option<SqlxTimestamp>, _>("last_login_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        }))
    }
}
