//! Out-of-band delivery of verification codes.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use tracing::info;

use crate::verification::{VerificationServiceError, models::Purpose};

/// Delivers a code to its target.
#[automock]
#[async_trait]
pub trait CodeMailer: Send + Sync {
    async fn deliver(
        &self,
        target: &str,
        purpose: Purpose,
        code: &str,
        expired_at: Timestamp,
    ) -> Result<(), VerificationServiceError>;
}

/// Writes codes to the log instead of sending mail.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl CodeMailer for LogMailer {
    async fn deliver(
        &self,
        target: &str,
        purpose: Purpose,
        code: &str,
        expired_at: Timestamp,
    ) -> Result<(), VerificationServiceError> {
        if target.is_empty() {
            return Err(VerificationServiceError::Delivery(
                "invalid email address".into(),
            ));
        }

        info!(
            target_email = target,
            purpose = %purpose,
            code,
            expired_at = %expired_at,
            "verification code issued"
        );

        Ok(())
    }
}
