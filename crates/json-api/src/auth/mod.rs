//! Authentication routes and bearer middleware

mod errors;
pub(crate) mod handlers;
pub(crate) mod middleware;
pub(crate) mod models;
