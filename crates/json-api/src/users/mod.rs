//! Admin user management routes

mod errors;
pub(crate) mod handlers;
mod models;
