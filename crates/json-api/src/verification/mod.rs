//! Public verification code routes

mod errors;
pub(crate) mod handlers;
mod models;
