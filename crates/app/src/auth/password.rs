//! Password hashing.
//!
//! bcrypt is CPU-bound, so both operations run on the blocking pool.

use bcrypt::{BcryptError, DEFAULT_COST};
use tokio::task;
use zeroize::Zeroizing;

use crate::auth::AuthServiceError;

/// Hash `password` with the default bcrypt cost.
///
/// # Errors
///
/// Returns an error if hashing fails or the blocking task panics.
pub async fn hash_password(password: &str) -> Result<String, AuthServiceError> {
    let password = Zeroizing::new(password.to_string());

    task::spawn_blocking(move || bcrypt::hash(password.as_str(), DEFAULT_COST))
        .await
        .map_err(|_| AuthServiceError::InternalServer)?
        .map_err(AuthServiceError::from)
}

/// Compare `password` with a stored bcrypt hash.
///
/// A malformed stored hash counts as a mismatch.
///
/// # Errors
///
/// Returns an error if the blocking task panics.
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthServiceError> {
    let password = Zeroizing::new(password.to_string());
    let hash = hash.to_string();

    let outcome = task::spawn_blocking(move || bcrypt::verify(password.as_str(), &hash))
        .await
        .map_err(|_| AuthServiceError::InternalServer)?;

    match outcome {
        Ok(matches) => Ok(matches),
        Err(
            BcryptError::InvalidHash(_)
            | BcryptError::InvalidPrefix(_)
            | BcryptError::InvalidBase64(_),
        ) => Ok(false),
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn hashes_verify_against_their_password() -> TestResult {
        let hash = hash_password("password123").await?;

        assert!(hash.starts_with("$2"));
        assert!(verify_password("password123", &hash).await?);
        assert!(!verify_password("nope", &hash).await?);

        Ok(())
    }

    #[tokio::test]
    async fn malformed_hash_is_a_mismatch() -> TestResult {
        assert!(!verify_password("password123", "not-a-hash").await?);

        Ok(())
    }
}
