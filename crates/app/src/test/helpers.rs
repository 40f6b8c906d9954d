//! Test Helpers

use sqlx::query_scalar;
use testresult::TestResult;

use crate::{auth::hash_password, test::TestContext, verification::Purpose};

/// Most recently issued code for `(target, purpose)`, used or not.
pub(crate) async fn latest_code(
    ctx: &TestContext,
    target: &str,
    purpose: Purpose,
) -> TestResult<Option<String>> {
    let code = query_scalar::<_, String>(
        "SELECT code FROM verifications WHERE target = $1 AND type = $2 ORDER BY id DESC LIMIT 1",
    )
    .bind(target)
    .bind(purpose.as_str())
    .fetch_optional(ctx.db.pool())
    .await?;

    Ok(code)
}

pub(crate) async fn insert_user(
    ctx: &TestContext,
    email: &str,
    password: &str,
    status: &str,
) -> TestResult<i64> {
    let id = query_scalar::<_, i64>(
        "INSERT INTO users (name, email, password, status, email_verified) \
         VALUES ($1, $2, $3, $4, $4 = 'active') RETURNING id",
    )
    .bind(email.split('@').next().unwrap_or_default())
    .bind(email)
    .bind(hash_password(password).await?)
    .bind(status)
    .fetch_one(ctx.db.pool())
    .await?;

    Ok(id)
}

pub(crate) async fn insert_admin(
    ctx: &TestContext,
    email: &str,
    password: &str,
    status: &str,
) -> TestResult<i64> {
    let id = query_scalar::<_, i64>(
        "INSERT INTO admins (name, email, password, status, role) \
         VALUES ($1, $2, $3, $4, 'admin') RETURNING id",
    )
    .bind("Admin")
    .bind(email)
    .bind(hash_password(password).await?)
    .bind(status)
    .fetch_one(ctx.db.pool())
    .await?;

    Ok(id)
}
