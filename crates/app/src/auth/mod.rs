//! Authentication

mod errors;
pub mod ipinfo;
mod models;
mod password;
mod repository;
mod service;
mod token;
pub mod user_agent;

pub use errors::*;
pub use ipinfo::{IpDetails, IpInfoClient, IpInfoConfig, IpLookup, IpLookupError};
pub use models::*;
pub use password::{hash_password, verify_password};
pub use repository::PgAuthRepository;
pub use service::*;
pub use token::*;
