//! Verification Repository

use std::time::Duration;

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::verification::models::{Purpose, Verification};

const CREATE_VERIFICATION_SQL: &str = include_str!("sql/create_verification.sql");
const RECENTLY_SENT_SQL: &str = include_str!("sql/recently_sent.sql");
const CONSUME_VERIFICATION_SQL: &str = include_str!("sql/consume_verification.sql");
const DELETE_EXPIRED_VERIFICATIONS_SQL: &str = include_str!("sql/delete_expired_verifications.sql");
const FIND_USER_ID_BY_EMAIL_SQL: &str = include_str!("sql/find_user_id_by_email.sql");
const ACTIVATE_USER_SQL: &str = include_str!("sql/activate_user.sql");

const EMAIL_VERIFICATION_ACTION: &str = "email_verification";

#[derive(Debug, Clone, Default)]
pub(crate) struct PgVerificationRepository;

impl PgVerificationRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_verification(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: Option<i64>,
        target: &str,
        purpose: Purpose,
        code: &str,
        ttl: Duration,
    ) -> Result<Verification, sqlx::Error> {
        query_as::<Postgres, Verification>(CREATE_VERIFICATION_SQL)
            .bind(user_id)
            .bind(target)
            .bind(purpose.as_str())
            .bind(EMAIL_VERIFICATION_ACTION)
            .bind(code)
            .bind(ttl.as_secs_f64())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn sent_within(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        target: &str,
        purpose: Purpose,
        window: Duration,
    ) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(RECENTLY_SENT_SQL)
            .bind(target)
            .bind(purpose.as_str())
            .bind(window.as_secs_f64())
            .fetch_one(&mut **tx)
            .await
    }

    /// Mark the newest matching live code as used, returning its id.
    pub(crate) async fn consume(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        target: &str,
        purpose: Purpose,
        code: &str,
    ) -> Result<Option<i64>, sqlx::Error> {
        query_scalar::<Postgres, i64>(CONSUME_VERIFICATION_SQL)
            .bind(target)
            .bind(purpose.as_str())
            .bind(code)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn delete_expired(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<u64, sqlx::Error> {
        query(DELETE_EXPIRED_VERIFICATIONS_SQL)
            .execute(&mut **tx)
            .await
            .map(|result| result.rows_affected())
    }

    pub(crate) async fn find_user_id(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        email: &str,
    ) -> Result<Option<i64>, sqlx::Error> {
        query_scalar::<Postgres, i64>(FIND_USER_ID_BY_EMAIL_SQL)
            .bind(email)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn activate_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        query(ACTIVATE_USER_SQL)
            .bind(email)
            .execute(&mut **tx)
            .await
            .map(|result| result.rows_affected() > 0)
    }
}

impl<'r> FromRow<'r, PgRow> for Verification {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            target: row.try_get("target")?,
            purpose: row.try_get("type")?,
            code: row.try_get("code")?,
            sent_at: row.try_get::<SqlxTimestamp, _>("sent_at")?.to_jiff(),
            expired_at: row.try_get::<SqlxTimestamp, _>("expired_at")?.to_jiff(),
            is_used: row.try_get("is_used")?,
        })
    }
}
