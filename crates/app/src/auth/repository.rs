//! Auth Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::auth::models::{
    NewLoginSession, NewPrincipal, Principal, PrincipalKind, RefreshTokenRecord,
};

/// Statements for one principal table family.
struct Statements {
    find_by_email: &'static str,
    find_by_id: &'static str,
    create: &'static str,
    insert_refresh_token: &'static str,
    find_refresh_token: &'static str,
    record_login: &'static str,
    update_password: &'static str,
    revoke_refresh_tokens: &'static str,
    insert_login_session: &'static str,
}

static USER_STATEMENTS: Statements = Statements {
    find_by_email: include_str!("sql/users/find_by_email.sql"),
    find_by_id: include_str!("sql/users/find_by_id.sql"),
    create: include_str!("sql/users/create.sql"),
    insert_refresh_token: include_str!("sql/users/insert_refresh_token.sql"),
    find_refresh_token: include_str!("sql/users/find_refresh_token.sql"),
    record_login: include_str!("sql/users/record_login.sql"),
    update_password: include_str!("sql/users/update_password.sql"),
    revoke_refresh_tokens: include_str!("sql/users/revoke_refresh_tokens.sql"),
    insert_login_session: include_str!("sql/users/insert_login_session.sql"),
};

static ADMIN_STATEMENTS: Statements = Statements {
    find_by_email: include_str!("sql/admins/find_by_email.sql"),
    find_by_id: include_str!("sql/admins/find_by_id.sql"),
    create: include_str!("sql/admins/create.sql"),
    insert_refresh_token: include_str!("sql/admins/insert_refresh_token.sql"),
    find_refresh_token: include_str!("sql/admins/find_refresh_token.sql"),
    record_login: include_str!("sql/admins/record_login.sql"),
    update_password: include_str!("sql/admins/update_password.sql"),
    revoke_refresh_tokens: include_str!("sql/admins/revoke_refresh_tokens.sql"),
    insert_login_session: include_str!("sql/admins/insert_login_session.sql"),
};

/// Principal, refresh token and login journal storage for one principal kind.
#[derive(Debug, Clone, Copy)]
pub struct PgAuthRepository {
    kind: PrincipalKind,
}

impl PgAuthRepository {
    #[must_use]
    pub fn new(kind: PrincipalKind) -> Self {
        Self { kind }
    }

    #[must_use]
    pub fn kind(&self) -> PrincipalKind {
        self.kind
    }

    fn statements(&self) -> &'static Statements {
        match self.kind {
            PrincipalKind::User => &USER_STATEMENTS,
            PrincipalKind::Admin => &ADMIN_STATEMENTS,
        }
    }

    pub(crate) async fn find_by_email(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        email: &str,
    ) -> Result<Option<Principal>, sqlx::Error> {
        query_as::<Postgres, Principal>(self.statements().find_by_email)
            .bind(email)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn find_by_id(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<Principal>, sqlx::Error> {
        query_as::<Postgres, Principal>(self.statements().find_by_id)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn create(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        principal: &NewPrincipal,
    ) -> Result<Principal, sqlx::Error> {
        let statement = query_as::<Postgres, Principal>(self.statements().create)
            .bind(&principal.name)
            .bind(&principal.email)
            .bind(&principal.password_hash)
            .bind(&principal.role)
            .bind(principal.status);

        let statement = match self.kind {
            PrincipalKind::User => statement,
            PrincipalKind::Admin => statement.bind(principal.is_super),
        };

        statement.fetch_one(&mut **tx).await
    }

    pub(crate) async fn insert_refresh_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: i64,
        token: &str,
        expires_at: Timestamp,
        device_info: &str,
    ) -> Result<RefreshTokenRecord, sqlx::Error> {
        query_as::<Postgres, RefreshTokenRecord>(self.statements().insert_refresh_token)
            .bind(owner_id)
            .bind(token)
            .bind(SqlxTimestamp::from(expires_at))
            .bind(device_info)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn find_refresh_token(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, sqlx::Error> {
        query_as::<Postgres, RefreshTokenRecord>(self.statements().find_refresh_token)
            .bind(token)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Stamp `last_login_at`, mark the email verified and return the updated principal.
    pub(crate) async fn record_login(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Principal, sqlx::Error> {
        query_as::<Postgres, Principal>(self.statements().record_login)
            .bind(id)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_password(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = query(self.statements().update_password)
            .bind(id)
            .bind(password_hash)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Invalidate every live refresh token of `owner_id`, returning how many were revoked.
    pub(crate) async fn revoke_refresh_tokens(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        owner_id: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = query(self.statements().revoke_refresh_tokens)
            .bind(owner_id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    pub(crate) async fn insert_login_session(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        session: &NewLoginSession,
    ) -> Result<(), sqlx::Error> {
        let statement = query(self.statements().insert_login_session)
            .bind(session.owner_id)
            .bind(&session.ip)
            .bind(&session.country)
            .bind(&session.city)
            .bind(&session.region)
            .bind(&session.timezone)
            .bind(&session.organization)
            .bind(&session.location)
            .bind(&session.user_agent)
            .bind(&session.device_type)
            .bind(&session.os)
            .bind(&session.browser)
            .bind(session.is_trusted)
            .bind(&session.platform)
            .bind(session.status)
            .bind(&session.reason);

        let statement = match self.kind {
            PrincipalKind::User => statement.bind(session.login_method.unwrap_or("email")),
            PrincipalKind::Admin => statement,
        };

        statement.execute(&mut **tx).await?;

        Ok(())
    }
}

impl<'r> FromRow<'r, PgRow> for Principal {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let kind = match row.try_get::<&str, _>("kind")? {
            "admin" => PrincipalKind::Admin,
            _ => PrincipalKind::User,
        };

        Ok(Self {
            id: row.try_get("id")?,
            kind,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            password_hash: row.try_get("password")?,
            role: row.try_get("role")?,
            status: row.try_get("status")?,
            is_super: row.try_get("is_super")?,
            email_verified: row.try_get("email_verified")?,
            last_login_at: row
                .try_get::<Option<SqlxTimestamp>, _>("last_login_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for RefreshTokenRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            token: row.try_get("token")?,
            is_valid: row.try_get("is_valid")?,
            expires_at: row.try_get::<SqlxTimestamp, _>("expires_at")?.to_jiff(),
            device_info: row.try_get("device_info")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
