//! Auth Handlers
//!
//! Users and admins share the same flows; each module exposes one endpoint per principal kind.

pub(crate) mod forgot_password;
pub(crate) mod login;
pub(crate) mod login_verify;
pub(crate) mod profile;
pub(crate) mod refresh;
pub(crate) mod register;
pub(crate) mod reset_password;
