//! Verification Codes

mod attempts;
mod errors;
pub mod mailer;
pub mod models;
mod repository;
mod service;

pub use errors::VerificationServiceError;
pub use mailer::{CodeMailer, LogMailer};
pub use models::{CodeCheck, IssuedCode, Purpose, SentCode, VerificationSettings};
pub use service::*;
