//! Auth data models.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::verification::Purpose;

/// Which principal table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Admin,
}

impl PrincipalKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub const fn login_purpose(self) -> Purpose {
        match self {
            Self::User => Purpose::UserLogin,
            Self::Admin => Purpose::AdminLogin,
        }
    }

    /// Users and admins use separate reset purposes so codes never cross kinds.
    #[must_use]
    pub const fn reset_purpose(self) -> Purpose {
        match self {
            Self::User => Purpose::ForgotPassword,
            Self::Admin => Purpose::ResetPassword,
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user or admin row. The password hash never leaves the crate.
#[derive(Clone)]
pub struct Principal {
    pub id: i64,
    pub kind: PrincipalKind,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub(crate) password_hash: String,
    pub role: String,
    pub status: String,
    pub is_super: bool,
    pub email_verified: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl Principal {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    #[must_use]
    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            kind: self.kind,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role.clone(),
            status: self.status.clone(),
            is_super: self.is_super,
            email_verified: self.email_verified,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
        }
    }
}

/// Outward projection of a principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: i64,
    pub kind: PrincipalKind,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub is_super: bool,
    pub email_verified: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Network origin of an authentication attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    pub ip: String,
    pub user_agent: String,
}

impl ClientMeta {
    #[must_use]
    pub fn new(ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            user_agent: user_agent.into(),
        }
    }
}

/// Stored refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub owner_id: i64,
    pub token: String,
    pub is_valid: bool,
    pub expires_at: Timestamp,
    pub device_info: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Success,
    Failed,
}

impl SessionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// Login journal entry before insertion.
#[derive(Debug, Clone, Default)]
pub struct NewLoginSession {
    pub owner_id: i64,
    pub ip: String,
    pub country: String,
    pub city: String,
    pub region: String,
    pub timezone: String,
    pub organization: String,
    pub location: String,
    pub user_agent: String,
    pub device_type: String,
    pub os: String,
    pub browser: String,
    pub is_trusted: bool,
    pub platform: String,
    pub login_method: Option<&'static str>,
    pub status: &'static str,
    pub reason: String,
}

/// Network details returned alongside a successful login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub region: String,
    pub timezone: String,
    pub organization: String,
    pub location: String,
    pub is_trusted: bool,
}

impl From<&NewLoginSession> for SessionInfo {
    fn from(session: &NewLoginSession) -> Self {
        Self {
            ip: session.ip.clone(),
            country: session.country.clone(),
            city: session.city.clone(),
            region: session.region.clone(),
            timezone: session.timezone.clone(),
            organization: session.organization.clone(),
            location: session.location.clone(),
            is_trusted: session.is_trusted,
        }
    }
}

/// Step-one login and forgot-password response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSent {
    pub message: String,
    pub expires_in: u64,
}

/// Tokens and principal returned by login verification and refresh.
#[derive(Debug, Clone)]
pub struct LoginEnvelope {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub principal: Profile,
    pub session: Option<SessionInfo>,
}

/// New principal row.
#[derive(Debug, Clone)]
pub struct NewPrincipal {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: &'static str,
    pub is_super: bool,
}

/// Identity resolved from a bearer access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub kind: PrincipalKind,
}
