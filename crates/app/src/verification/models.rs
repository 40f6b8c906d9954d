//! Verification Models

use std::{fmt, str::FromStr, time::Duration};

use jiff::Timestamp;
use zeroize::Zeroizing;

use crate::verification::VerificationServiceError;

/// What a code unlocks. Codes never validate across purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Purpose {
    Register,
    UserLogin,
    AdminLogin,
    ForgotPassword,
    ResetPassword,
}

impl Purpose {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::UserLogin => "user_login",
            Self::AdminLogin => "admin_login",
            Self::ForgotPassword => "forgot_password",
            Self::ResetPassword => "reset_password",
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Purpose {
    type Err = VerificationServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "register" => Ok(Self::Register),
            "user_login" => Ok(Self::UserLogin),
            "admin_login" => Ok(Self::AdminLogin),
            "forgot_password" => Ok(Self::ForgotPassword),
            "reset_password" => Ok(Self::ResetPassword),
            _ => Err(VerificationServiceError::InvalidPurpose),
        }
    }
}

/// Stored verification row.
#[derive(Debug, Clone)]
pub struct Verification {
    pub id: i64,
    pub target: String,
    pub purpose: String,
    pub code: String,
    pub sent_at: Timestamp,
    pub expired_at: Timestamp,
    pub is_used: bool,
}

/// A freshly issued code. The code itself is wiped on drop.
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub code: Zeroizing<String>,
    pub expired_at: Timestamp,
    pub ttl: Duration,
}

/// Response of the public send endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCode {
    pub message: String,
    pub expired_at: Timestamp,
}

/// Response of the public verify endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeCheck {
    pub message: String,
    pub valid: bool,
}

/// Lifetimes and throttling for verification codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationSettings {
    pub code_ttl: Duration,
    pub send_cooldown: Duration,
    pub max_attempts: u32,
    pub sweep_interval: Duration,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        Self {
            code_ttl: Duration::from_secs(600),
            send_cooldown: Duration::from_secs(60),
            max_attempts: 5,
            sweep_interval: Duration::from_secs(300),
        }
    }
}
