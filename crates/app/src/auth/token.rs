//! Signed access and refresh tokens.
//!
//! Access and refresh tokens are HS256 JWTs signed with different secrets, so a token of one
//! class never validates as the other.

use std::{fmt, sync::Arc, time::Duration};

use jiff::Timestamp;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind as JwtErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::auth::models::PrincipalKind;

/// Fixed issuer written into every token.
pub const TOKEN_ISSUER: &str = "trusioo_api";

/// Secrets and lifetimes for both token classes.
#[derive(Clone)]
pub struct TokenSettings {
    pub access_secret: Zeroizing<String>,
    pub refresh_secret: Zeroizing<String>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

/// Claim set carried by both token classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub role: String,
    pub user_type: PrincipalKind,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
    pub jti: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenClass {
    Access,
    Refresh,
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: Timestamp,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token secrets must be non-empty and distinct")]
    Misconfigured,

    #[error("token has expired")]
    Expired,

    #[error("token is invalid")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    #[error("token lifetime is out of range")]
    Lifetime,

    #[error("failed to sign token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Encodes and decodes access and refresh tokens.
#[derive(Clone)]
pub struct TokenCodec {
    access: Arc<Keys>,
    refresh: Arc<Keys>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// Build a codec from configured secrets.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Misconfigured`] when a secret is empty or both secrets are equal.
    pub fn new(settings: &TokenSettings) -> Result<Self, TokenError> {
        if settings.access_secret.is_empty()
            || settings.refresh_secret.is_empty()
            || settings.access_secret.as_str() == settings.refresh_secret.as_str()
        {
            return Err(TokenError::Misconfigured);
        }

        Ok(Self {
            access: Arc::new(Keys::from_secret(&settings.access_secret)),
            refresh: Arc::new(Keys::from_secret(&settings.refresh_secret)),
            access_ttl: settings.access_ttl,
            refresh_ttl: settings.refresh_ttl,
        })
    }

    #[must_use]
    pub const fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    #[must_use]
    pub const fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// # Errors
    ///
    /// Returns an error if the lifetime overflows or signing fails.
    pub fn encode_access(
        &self,
        id: i64,
        email: &str,
        role: &str,
        kind: PrincipalKind,
    ) -> Result<SignedToken, TokenError> {
        self.encode(TokenClass::Access, id, email, role, kind)
    }

    /// # Errors
    ///
    /// Returns an error if the lifetime overflows or signing fails.
    pub fn encode_refresh(
        &self,
        id: i64,
        email: &str,
        role: &str,
        kind: PrincipalKind,
    ) -> Result<SignedToken, TokenError> {
        self.encode(TokenClass::Refresh, id, email, role, kind)
    }

    /// # Errors
    ///
    /// Returns an error for a bad signature, malformed claims, or a token outside its
    /// validity window.
    pub fn decode_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode(TokenClass::Access, token)
    }

    /// # Errors
    ///
    /// Returns an error for a bad signature, malformed claims, or a token outside its
    /// validity window.
    pub fn decode_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.decode(TokenClass::Refresh, token)
    }

    fn keys(&self, class: TokenClass) -> &Keys {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
        }
    }

    fn encode(
        &self,
        class: TokenClass,
        id: i64,
        email: &str,
        role: &str,
        kind: PrincipalKind,
    ) -> Result<SignedToken, TokenError> {
        let ttl = match class {
            TokenClass::Access => self.access_ttl,
            TokenClass::Refresh => self.refresh_ttl,
        };

        let issued_at = Timestamp::now().as_second();
        let lifetime = i64::try_from(ttl.as_secs()).map_err(|_| TokenError::Lifetime)?;
        let expires_at = issued_at.checked_add(lifetime).ok_or(TokenError::Lifetime)?;

        let claims = Claims {
            user_id: id,
            email: email.to_string(),
            role: role.to_string(),
            user_type: kind,
            iat: issued_at,
            nbf: issued_at,
            exp: expires_at,
            iss: TOKEN_ISSUER.to_string(),
            jti: Uuid::new_v4(),
        };

        let token = encode(&Header::default(), &claims, &self.keys(class).encoding)
            .map_err(TokenError::Signing)?;

        Ok(SignedToken {
            token,
            expires_at: Timestamp::from_second(expires_at).map_err(|_| TokenError::Lifetime)?,
        })
    }

    fn decode(&self, class: TokenClass, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "iat"]);

        let claims = decode::<Claims>(token, &self.keys(class).decoding, &validation)
            .map(|data| data.claims)
            .map_err(|error| match error.kind() {
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(error),
            })?;

        // jsonwebtoken still accepts `exp == now`; a token is expired from its `exp` second on.
        if claims.exp <= Timestamp::now().as_second() {
            return Err(TokenError::Expired);
        }

        if claims.iss != TOKEN_ISSUER {
            debug!(issuer = %claims.iss, "token carries an unexpected issuer");
        }

        Ok(claims)
    }
}
