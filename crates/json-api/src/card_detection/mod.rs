//! Card detection routes

mod errors;
pub(crate) mod handlers;
pub(crate) mod models;
