//! Auth request and response bodies.

use std::string::ToString;

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};
use trusioo_app::auth::{CodeSent, LoginEnvelope, PrincipalKind, Profile, SessionInfo};

/// Credentials for the first login step
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Second login step
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct LoginVerifyRequest {
    pub email: String,

    /// Six digit code delivered by email
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RegisterRequest {
    pub email: String,

    /// At least 6 characters
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ResetPasswordRequest {
    pub email: String,
    pub code: String,

    /// The new password
    pub password: String,
}

/// A verification code was issued
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CodeSentResponse {
    pub message: String,

    /// Code lifetime in seconds
    pub expires_in: u64,
}

impl From<CodeSent> for CodeSentResponse {
    fn from(sent: CodeSent) -> Self {
        Self {
            message: sent.message,
            expires_in: sent.expires_in,
        }
    }
}

/// Principal projection
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct ProfileResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub status: String,
    pub email_verified: bool,
    pub last_login_at: Option<String>,
    pub created_at: String,

    /// Admins only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_super: Option<bool>,
}

impl From<Profile> for ProfileResponse {
    fn from(profile: Profile) -> Self {
        Self {
            is_super: (profile.kind == PrincipalKind::Admin).then_some(profile.is_super),
            id: profile.id,
            name: profile.name,
            email: profile.email,
            phone: profile.phone,
            role: profile.role,
            status: profile.status,
            email_verified: profile.email_verified,
            last_login_at: profile.last_login_at.as_ref().map(ToString::to_string),
            created_at: profile.created_at.to_string(),
        }
    }
}

/// Where the login came from
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct SessionInfoResponse {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub region: String,
    pub timezone: String,
    pub organization: String,
    pub location: String,
    pub is_trusted: bool,
}

impl From<SessionInfo> for SessionInfoResponse {
    fn from(session: SessionInfo) -> Self {
        Self {
            ip: session.ip,
            country: session.country,
            city: session.city,
            region: session.region,
            timezone: session.timezone,
            organization: session.organization,
            location: session.location,
            is_trusted: session.is_trusted,
        }
    }
}

/// Issued tokens. The principal is keyed `user` or `admin` by kind.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ProfileResponse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<ProfileResponse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_info: Option<SessionInfoResponse>,
}

impl From<LoginEnvelope> for LoginResponse {
    fn from(envelope: LoginEnvelope) -> Self {
        let kind = envelope.principal.kind;
        let principal = ProfileResponse::from(envelope.principal);

        let (user, admin) = match kind {
            PrincipalKind::User => (Some(principal), None),
            PrincipalKind::Admin => (None, Some(principal)),
        };

        Self {
            access_token: envelope.access_token,
            refresh_token: envelope.refresh_token,
            token_type: envelope.token_type.to_string(),
            expires_in: envelope.expires_in,
            user,
            admin,
            session_info: envelope.session.map(Into::into),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_profiles_carry_is_super() {
        let admin = ProfileResponse::from(fixtures::profile(PrincipalKind::Admin));
        let user = ProfileResponse::from(fixtures::profile(PrincipalKind::User));

        assert_eq!(admin.is_super, Some(true));
        assert_eq!(user.is_super, None);
    }

    #[test]
    fn login_response_keys_the_principal_by_kind() {
        let admin = LoginResponse::from(fixtures::login_envelope(PrincipalKind::Admin));

        assert!(admin.admin.is_some());
        assert!(admin.user.is_none());
        assert_eq!(admin.token_type, "Bearer");
    }
}
