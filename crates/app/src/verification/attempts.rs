//! Failed-attempt budget per target and purpose, kept in `verification_attempts`.
//!
//! Failures are written in their own transaction so they outlive a caller that rolls back
//! after a rejected code. Clearing happens in the caller's transaction and commits with the
//! consumed code.

use std::time::Duration;

use sqlx::{Postgres, Transaction, query, query_scalar};

use crate::{database::Db, verification::models::Purpose};

const ATTEMPTS_BLOCKED_SQL: &str = include_str!("sql/attempts_blocked.sql");
const RECORD_FAILED_ATTEMPT_SQL: &str = include_str!("sql/record_failed_attempt.sql");
const CLEAR_ATTEMPTS_SQL: &str = include_str!("sql/clear_attempts.sql");
const DELETE_STALE_ATTEMPTS_SQL: &str = include_str!("sql/delete_stale_attempts.sql");

#[derive(Debug, Clone, Copy)]
pub(crate) struct AttemptLimiter {
    max_attempts: u32,
    window: Duration,
}

impl AttemptLimiter {
    pub(crate) fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
        }
    }

    /// A zero maximum disables blocking.
    pub(crate) fn enabled(&self) -> bool {
        self.max_attempts > 0
    }

    fn max_attempts(&self) -> i32 {
        i32::try_from(self.max_attempts).unwrap_or(i32::MAX)
    }

    /// `true` once the failure count inside the window reaches the maximum.
    pub(crate) async fn is_blocked(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        target: &str,
        purpose: Purpose,
    ) -> Result<bool, sqlx::Error> {
        if !self.enabled() {
            return Ok(false);
        }

        query_scalar::<Postgres, bool>(ATTEMPTS_BLOCKED_SQL)
            .bind(target)
            .bind(purpose.as_str())
            .bind(self.max_attempts())
            .bind(self.window.as_secs_f64())
            .fetch_one(&mut **tx)
            .await
    }

    /// Count a failure and return the failures inside the current window.
    pub(crate) async fn record_failure(
        &self,
        db: &Db,
        target: &str,
        purpose: Purpose,
    ) -> Result<i32, sqlx::Error> {
        let mut tx = db.begin().await?;

        let failures = query_scalar::<Postgres, i32>(RECORD_FAILED_ATTEMPT_SQL)
            .bind(target)
            .bind(purpose.as_str())
            .bind(self.window.as_secs_f64())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(failures)
    }

    pub(crate) async fn clear(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        target: &str,
        purpose: Purpose,
    ) -> Result<(), sqlx::Error> {
        query(CLEAR_ATTEMPTS_SQL)
            .bind(target)
            .bind(purpose.as_str())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    /// Drop windows that have aged out.
    pub(crate) async fn prune(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<u64, sqlx::Error> {
        query(DELETE_STALE_ATTEMPTS_SQL)
            .bind(self.window.as_secs_f64())
            .execute(&mut **tx)
            .await
            .map(|result| result.rows_affected())
    }
}
