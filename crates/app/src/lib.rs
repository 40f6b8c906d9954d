//! Shared application domain and persistence modules.

pub mod auth;
pub mod card_detection;
pub mod context;
pub mod database;
pub mod detections;
pub mod users;
pub mod verification;

#[cfg(test)]
mod test;
