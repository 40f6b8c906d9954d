//! Verification service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use rand::{Rng, rngs::OsRng};
use sqlx::{Postgres, Transaction};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::{
    database::Db,
    verification::{
        VerificationServiceError,
        attempts::AttemptLimiter,
        mailer::{CodeMailer, LogMailer},
        models::{CodeCheck, IssuedCode, Purpose, SentCode, VerificationSettings},
        repository::PgVerificationRepository,
    },
};

const CODE_SENT_MESSAGE: &str = "Verification code sent successfully";
const CODE_VALID_MESSAGE: &str = "Verification code is valid";
const CODE_INVALID_MESSAGE: &str = "Invalid or expired verification code";

/// Issues and consumes one-time codes bound to a target and purpose.
#[derive(Clone)]
pub struct PgVerificationService {
    db: Db,
    repository: PgVerificationRepository,
    mailer: Arc<dyn CodeMailer>,
    attempts: AttemptLimiter,
    settings: VerificationSettings,
}

impl std::fmt::Debug for PgVerificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgVerificationService")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PgVerificationService {
    #[must_use]
    pub fn new(db: Db, settings: VerificationSettings) -> Self {
        Self::with_mailer(db, settings, Arc::new(LogMailer))
    }

    #[must_use]
    pub fn with_mailer(
        db: Db,
        settings: VerificationSettings,
        mailer: Arc<dyn CodeMailer>,
    ) -> Self {
        Self {
            db,
            repository: PgVerificationRepository::new(),
            mailer,
            attempts: AttemptLimiter::new(settings.max_attempts, settings.code_ttl),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> VerificationSettings {
        self.settings
    }

    /// Issue and deliver a new code for `(target, purpose)`.
    ///
    /// # Errors
    ///
    /// Returns `RateLimited` when a code was issued within the cool-down window, or an error
    /// if persistence or delivery fails.
    pub async fn issue(
        &self,
        target: &str,
        purpose: Purpose,
        user_id: Option<i64>,
    ) -> Result<IssuedCode, VerificationServiceError> {
        let mut tx = self.db.begin().await?;

        if !self.settings.send_cooldown.is_zero()
            && self
                .repository
                .sent_within(&mut tx, target, purpose, self.settings.send_cooldown)
                .await?
        {
            debug!(target_email = target, purpose = %purpose, "verification issuance throttled");

            return Err(VerificationServiceError::RateLimited);
        }

        let code = generate_code();

        let verification = self
            .repository
            .create_verification(&mut tx, user_id, target, purpose, &code, self.settings.code_ttl)
            .await?;

        self.mailer
            .deliver(target, purpose, &code, verification.expired_at)
            .await?;

        tx.commit().await?;

        Ok(IssuedCode {
            code,
            expired_at: verification.expired_at,
            ttl: self.settings.code_ttl,
        })
    }

    /// Consume a code in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns `TooManyAttempts` once the failure budget is spent, or a storage error.
    pub async fn verify(
        &self,
        target: &str,
        purpose: Purpose,
        code: &str,
    ) -> Result<bool, VerificationServiceError> {
        let mut tx = self.db.begin().await?;

        let valid = self.verify_in(&mut tx, target, purpose, code).await?;

        tx.commit().await?;

        Ok(valid)
    }

    /// Consume a code inside the caller's transaction.
    ///
    /// A wrong code never touches stored codes; it only counts against the failure budget.
    /// That failure is committed on its own, even when the caller rolls `tx` back.
    ///
    /// # Errors
    ///
    /// Returns `TooManyAttempts` once the failure budget is spent, or a storage error.
    pub async fn verify_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        target: &str,
        purpose: Purpose,
        code: &str,
    ) -> Result<bool, VerificationServiceError> {
        if self.attempts.is_blocked(tx, target, purpose).await? {
            return Err(VerificationServiceError::TooManyAttempts);
        }

        let consumed = if is_well_formed(code) {
            self.repository.consume(tx, target, purpose, code).await?
        } else {
            None
        };

        match consumed {
            Some(id) => {
                debug!(verification_id = id, purpose = %purpose, "verification code consumed");
                self.attempts.clear(tx, target, purpose).await?;
                Ok(true)
            }
            None => {
                if self.attempts.enabled() {
                    let failures = self
                        .attempts
                        .record_failure(&self.db, target, purpose)
                        .await?;

                    debug!(
                        target_email = target,
                        purpose = %purpose,
                        failures,
                        "verification code rejected"
                    );
                }

                Ok(false)
            }
        }
    }
}

fn generate_code() -> Zeroizing<String> {
    Zeroizing::new(format!("{:06}", OsRng.gen_range(0..1_000_000_u32)))
}

fn is_well_formed(code: &str) -> bool {
    code.len() == 6 && code.bytes().all(|byte| byte.is_ascii_digit())
}

#[async_trait]
impl VerificationService for PgVerificationService {
    async fn send(
        &self,
        target: &str,
        purpose: Purpose,
    ) -> Result<SentCode, VerificationServiceError> {
        let user_id = if purpose == Purpose::Register {
            let mut tx = self.db.begin().await?;
            let user_id = self.repository.find_user_id(&mut tx, target).await?;
            tx.commit().await?;

            Some(user_id.ok_or(VerificationServiceError::UserNotFound)?)
        } else {
            None
        };

        let issued = self.issue(target, purpose, user_id).await?;

        Ok(SentCode {
            message: CODE_SENT_MESSAGE.to_string(),
            expired_at: issued.expired_at,
        })
    }

    async fn check(
        &self,
        target: &str,
        purpose: Purpose,
        code: &str,
    ) -> Result<CodeCheck, VerificationServiceError> {
        let mut tx = self.db.begin().await?;

        if !self.verify_in(&mut tx, target, purpose, code).await? {
            return Ok(CodeCheck {
                message: CODE_INVALID_MESSAGE.to_string(),
                valid: false,
            });
        }

        if purpose == Purpose::Register {
            let activated = self.repository.activate_user(&mut tx, target).await?;

            if activated {
                info!(target_email = target, "user account activated");
            } else {
                warn!(target_email = target, "register code consumed for an active or missing user");
            }
        }

        tx.commit().await?;

        Ok(CodeCheck {
            message: CODE_VALID_MESSAGE.to_string(),
            valid: true,
        })
    }

    async fn sweep(&self) -> Result<u64, VerificationServiceError> {
        let mut tx = self.db.begin().await?;

        let deleted = self.repository.delete_expired(&mut tx).await?;
        let stale_windows = self.attempts.prune(&mut tx).await?;

        tx.commit().await?;

        debug!(stale_windows, "stale attempt windows removed");

        if deleted > 0 {
            info!(deleted, "expired verification codes removed");
        }

        Ok(deleted)
    }
}

/// Public verification operations.
#[automock]
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Issue and deliver a code. Register codes require an existing user.
    async fn send(&self, target: &str, purpose: Purpose)
    -> Result<SentCode, VerificationServiceError>;

    /// Consume a code. Register codes activate the matching user.
    async fn check(
        &self,
        target: &str,
        purpose: Purpose,
        code: &str,
    ) -> Result<CodeCheck, VerificationServiceError>;

    /// Delete expired codes and return how many were removed.
    async fn sweep(&self) -> Result<u64, VerificationServiceError>;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sqlx::query;
    use testresult::TestResult;

    use crate::test::{TestContext, helpers};

    use super::*;

    fn relaxed() -> VerificationSettings {
        VerificationSettings {
            send_cooldown: Duration::ZERO,
            ..VerificationSettings::default()
        }
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();

            assert!(is_well_formed(&code), "{}", code.as_str());
        }
    }

    #[tokio::test]
    async fn issue_persists_a_live_code() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.verification_with(relaxed());

        let issued = service
            .issue("a@example.com", Purpose::UserLogin, None)
            .await?;

        let stored = helpers::latest_code(&ctx, "a@example.com", Purpose::UserLogin).await?;

        assert_eq!(stored.as_deref(), Some(issued.code.as_str()));
        assert_eq!(issued.ttl, Duration::from_secs(600));

        Ok(())
    }

    #[tokio::test]
    async fn codes_are_single_use() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.verification_with(relaxed());

        let issued = service
            .issue("a@example.com", Purpose::AdminLogin, None)
            .await?;

        assert!(service.verify("a@example.com", Purpose::AdminLogin, &issued.code).await?);
        assert!(!service.verify("a@example.com", Purpose::AdminLogin, &issued.code).await?);

        Ok(())
    }

    #[tokio::test]
    async fn wrong_code_leaves_real_code_consumable() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.verification_with(relaxed());

        let issued = service
            .issue("a@example.com", Purpose::UserLogin, None)
            .await?;

        let wrong = if issued.code.as_str() == "000000" { "111111" } else { "000000" };

        assert!(!service.verify("a@example.com", Purpose::UserLogin, wrong).await?);
        assert!(service.verify("a@example.com", Purpose::UserLogin, &issued.code).await?);

        Ok(())
    }

    #[tokio::test]
    async fn codes_do_not_cross_purposes() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.verification_with(relaxed());

        let issued = service
            .issue("a@example.com", Purpose::ForgotPassword, None)
            .await?;

        assert!(!service.verify("a@example.com", Purpose::ResetPassword, &issued.code).await?);
        assert!(service.verify("a@example.com", Purpose::ForgotPassword, &issued.code).await?);

        Ok(())
    }

    #[tokio::test]
    async fn expired_codes_never_validate() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.verification_with(relaxed());

        let issued = service
            .issue("a@example.com", Purpose::UserLogin, None)
            .await?;

        query("UPDATE verifications SET expired_at = NOW() - INTERVAL '1 second'")
            .execute(ctx.db.pool())
            .await?;

        assert!(!service.verify("a@example.com", Purpose::UserLogin, &issued.code).await?);

        Ok(())
    }

    #[tokio::test]
    async fn issuance_inside_cooldown_is_rate_limited() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.verification_with(VerificationSettings::default());

        service
            .issue("a@example.com", Purpose::UserLogin, None)
            .await?;

        let second = service.issue("a@example.com", Purpose::UserLogin, None).await;

        assert!(matches!(second, Err(VerificationServiceError::RateLimited)));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verifications")
            .fetch_one(ctx.db.pool())
            .await?;

        assert_eq!(rows, 1);

        // other purposes have their own window
        service
            .issue("a@example.com", Purpose::AdminLogin, None)
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn repeated_failures_block_verification() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.verification_with(VerificationSettings {
            max_attempts: 2,
            ..relaxed()
        });

        let issued = service
            .issue("a@example.com", Purpose::UserLogin, None)
            .await?;

        let wrong = if issued.code.as_str() == "000000" { "111111" } else { "000000" };

        assert!(!service.verify("a@example.com", Purpose::UserLogin, wrong).await?);
        assert!(!service.verify("a@example.com", Purpose::UserLogin, wrong).await?);

        let blocked = service
            .verify("a@example.com", Purpose::UserLogin, &issued.code)
            .await;

        assert!(matches!(blocked, Err(VerificationServiceError::TooManyAttempts)));

        let unused: bool = sqlx::query_scalar("SELECT NOT is_used FROM verifications")
            .fetch_one(ctx.db.pool())
            .await?;

        assert!(unused);

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_verifications_consume_a_code_once() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.verification_with(relaxed());

        for round in 0..5 {
            let target = format!("racer{round}@example.com");

            let issued = service.issue(&target, Purpose::UserLogin, None).await?;

            let (first, second) = tokio::join!(
                service.verify(&target, Purpose::UserLogin, &issued.code),
                service.verify(&target, Purpose::UserLogin, &issued.code),
            );

            assert!(first? ^ second?, "round {round}");
        }

        Ok(())
    }

    #[tokio::test]
    async fn failure_budget_is_shared_between_instances() -> TestResult {
        let ctx = TestContext::new().await;
        let settings = VerificationSettings {
            max_attempts: 2,
            ..relaxed()
        };

        let first = ctx.verification_with(settings);
        let second = ctx.verification_with(settings);

        let issued = first
            .issue("a@example.com", Purpose::UserLogin, None)
            .await?;

        let wrong = if issued.code.as_str() == "000000" { "111111" } else { "000000" };

        assert!(!first.verify("a@example.com", Purpose::UserLogin, wrong).await?);
        assert!(!second.verify("a@example.com", Purpose::UserLogin, wrong).await?);

        let restarted = ctx.verification_with(settings);
        let blocked = restarted
            .verify("a@example.com", Purpose::UserLogin, &issued.code)
            .await;

        assert!(matches!(blocked, Err(VerificationServiceError::TooManyAttempts)));

        Ok(())
    }

    #[tokio::test]
    async fn failures_survive_a_rolled_back_caller() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.verification_with(VerificationSettings {
            max_attempts: 1,
            ..relaxed()
        });

        let issued = service
            .issue("a@example.com", Purpose::AdminLogin, None)
            .await?;

        let wrong = if issued.code.as_str() == "000000" { "111111" } else { "000000" };

        let mut tx = ctx.shared().begin().await?;
        assert!(!service.verify_in(&mut tx, "a@example.com", Purpose::AdminLogin, wrong).await?);
        tx.rollback().await?;

        let blocked = service
            .verify("a@example.com", Purpose::AdminLogin, &issued.code)
            .await;

        assert!(matches!(blocked, Err(VerificationServiceError::TooManyAttempts)));

        Ok(())
    }

    #[tokio::test]
    async fn successful_verification_resets_the_budget() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.verification_with(VerificationSettings {
            max_attempts: 2,
            ..relaxed()
        });

        let issued = service
            .issue("a@example.com", Purpose::UserLogin, None)
            .await?;

        let wrong = if issued.code.as_str() == "000000" { "111111" } else { "000000" };

        assert!(!service.verify("a@example.com", Purpose::UserLogin, wrong).await?);
        assert!(service.verify("a@example.com", Purpose::UserLogin, &issued.code).await?);

        let windows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM verification_attempts")
            .fetch_one(ctx.db.pool())
            .await?;

        assert_eq!(windows, 0);

        Ok(())
    }

    #[tokio::test]
    async fn register_send_requires_existing_user() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.verification_with(relaxed());

        let result = service.send("nobody@example.com", Purpose::Register).await;

        assert!(matches!(result, Err(VerificationServiceError::UserNotFound)));

        Ok(())
    }

    #[tokio::test]
    async fn register_check_activates_user() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.verification_with(relaxed());

        helpers::insert_user(&ctx, "new@example.com", "password123", "inactive").await?;

        let sent = service.send("new@example.com", Purpose::Register).await?;
        assert_eq!(sent.message, "Verification code sent successfully");

        let code = helpers::latest_code(&ctx, "new@example.com", Purpose::Register)
            .await?
            .ok_or("code not stored")?;

        let check = service
            .check("new@example.com", Purpose::Register, &code)
            .await?;

        assert_eq!(
            check,
            CodeCheck {
                message: "Verification code is valid".to_string(),
                valid: true,
            }
        );

        let (status, verified): (String, bool) =
            sqlx::query_as("SELECT status, email_verified FROM users WHERE email = $1")
                .bind("new@example.com")
                .fetch_one(ctx.db.pool())
                .await?;

        assert_eq!(status, "active");
        assert!(verified);

        let again = service
            .check("new@example.com", Purpose::Register, &code)
            .await?;

        assert!(!again.valid);
        assert_eq!(again.message, "Invalid or expired verification code");

        Ok(())
    }

    #[tokio::test]
    async fn sweep_deletes_only_expired_rows() -> TestResult {
        let ctx = TestContext::new().await;
        let service = ctx.verification_with(relaxed());

        service.issue("a@example.com", Purpose::UserLogin, None).await?;
        service.issue("b@example.com", Purpose::UserLogin, None).await?;

        query("UPDATE verifications SET expired_at = NOW() - INTERVAL '1 minute' WHERE target = $1")
            .bind("a@example.com")
            .execute(ctx.db.pool())
            .await?;

        assert_eq!(service.sweep().await?, 1);

        let remaining: Vec<String> = sqlx::query_scalar("SELECT target FROM verifications")
            .fetch_all(ctx.db.pool())
            .await?;

        assert_eq!(remaining, vec!["b@example.com".to_string()]);

        Ok(())
    }
}
